//! Class-based registration
//!
//! A test class is a type holding fixture state, plus a `register` function
//! listing its init, cleanup and test methods. All hooks and cases of one
//! class share a single instance created with [`Default`].
//!
//! ```rust
//! use ouroboros_qc::assertions::{assert_that, AssertionResult};
//! use ouroboros_qc::registry::{ClassRegistry, UnitTestClass};
//! use ouroboros_qc::UnitTest;
//!
//! #[derive(Default)]
//! struct Stack {
//!     items: Vec<i32>,
//! }
//!
//! impl Stack {
//!     fn push(&mut self) -> AssertionResult {
//!         self.items.push(1);
//!         assert_that(self.items.len() == 1, "push did not grow the stack")
//!     }
//!
//!     fn pop(&mut self) -> bool {
//!         self.items.pop() == Some(1)
//!     }
//! }
//!
//! impl UnitTestClass for Stack {
//!     const NAME: &'static str = "Stack";
//!
//!     fn register(registry: &mut ClassRegistry<Self>) {
//!         registry.case("push", Stack::push);
//!         registry.case("pop", Stack::pop);
//!     }
//! }
//!
//! let suite = UnitTest::from_class::<Stack>().unwrap();
//! assert_eq!(suite.case_count(), 2);
//! ```

use crate::error::Result;
use crate::outcome::IntoOutcome;
use crate::suite::{UnitTest, UnitTestBuilder};
use std::cell::RefCell;
use std::rc::Rc;

/// A stateful test class
pub trait UnitTestClass: Default + 'static {
    /// Suite name
    const NAME: &'static str;
    /// Whether the suite continues past failures
    const CONTINUE_ON_FAIL: bool = false;

    /// Declare the init/cleanup hooks and test cases of the class
    fn register(registry: &mut ClassRegistry<Self>);
}

/// Collects the methods of a test class bound to a shared instance
pub struct ClassRegistry<T> {
    instance: Rc<RefCell<T>>,
    builder: UnitTestBuilder,
}

impl<T: 'static> ClassRegistry<T> {
    fn new(name: &str, continue_on_failure: bool, instance: T) -> Self {
        Self {
            instance: Rc::new(RefCell::new(instance)),
            builder: UnitTest::builder(name).continue_on_failure(continue_on_failure),
        }
    }

    fn update(&mut self, f: impl FnOnce(UnitTestBuilder) -> UnitTestBuilder) -> &mut Self {
        let builder = std::mem::replace(&mut self.builder, UnitTest::builder(""));
        self.builder = f(builder);
        self
    }

    fn bind<F, R>(&self, mut method: F) -> impl FnMut() -> R + 'static
    where
        F: FnMut(&mut T) -> R + 'static,
        R: 'static,
    {
        let instance = Rc::clone(&self.instance);
        move || method(&mut instance.borrow_mut())
    }

    /// Register the init method
    pub fn init<F, R>(&mut self, method: F) -> &mut Self
    where
        F: FnMut(&mut T) -> R + 'static,
        R: IntoOutcome + 'static,
    {
        let body = self.bind(method);
        self.update(|b| b.init(body))
    }

    /// Register the cleanup method
    pub fn cleanup<F, R>(&mut self, method: F) -> &mut Self
    where
        F: FnMut(&mut T) -> R + 'static,
        R: IntoOutcome + 'static,
    {
        let body = self.bind(method);
        self.update(|b| b.cleanup(body))
    }

    /// Register a test method
    pub fn case<F, R>(&mut self, name: impl Into<String>, method: F) -> &mut Self
    where
        F: FnMut(&mut T) -> R + 'static,
        R: IntoOutcome + 'static,
    {
        let body = self.bind(method);
        self.update(|b| b.case(name, body))
    }

    fn finish(self) -> Result<UnitTest> {
        self.builder.build()
    }
}

impl UnitTest {
    /// Build a suite from a test class
    pub fn from_class<T: UnitTestClass>() -> Result<UnitTest> {
        let mut registry = ClassRegistry::new(T::NAME, T::CONTINUE_ON_FAIL, T::default());
        T::register(&mut registry);
        let suite = registry.finish()?;
        tracing::debug!(class = std::any::type_name::<T>(), suite = %suite.name(), "test class registered");
        Ok(suite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertions::{assert_that, AssertionResult};
    use crate::config::RunConfiguration;
    use crate::error::QcError;
    use crate::runner::Runner;

    #[derive(Default)]
    struct Counter {
        value: i32,
    }

    impl Counter {
        fn setup(&mut self) {
            self.value = 10;
        }

        fn increment(&mut self) -> AssertionResult {
            self.value += 1;
            assert_that(self.value == 11, "init did not run before the first case")
        }

        fn sees_previous_case(&mut self) -> bool {
            self.value == 11
        }

        fn teardown(&mut self) {
            self.value = 0;
        }
    }

    impl UnitTestClass for Counter {
        const NAME: &'static str = "Counter";
        const CONTINUE_ON_FAIL: bool = true;

        fn register(registry: &mut ClassRegistry<Self>) {
            registry
                .init(Counter::setup)
                .cleanup(Counter::teardown)
                .case("increment", Counter::increment)
                .case("shared state", Counter::sees_previous_case);
        }
    }

    #[derive(Default)]
    struct Duplicated;

    impl UnitTestClass for Duplicated {
        const NAME: &'static str = "Duplicated";

        fn register(registry: &mut ClassRegistry<Self>) {
            registry.case("same", |_| true).case("same", |_| true);
        }
    }

    #[test]
    fn test_class_to_suite() {
        let suite = UnitTest::from_class::<Counter>().unwrap();
        assert_eq!(suite.name(), "Counter");
        assert!(suite.continue_on_failure());
        assert!(suite.has_init());
        assert!(suite.has_cleanup());
        assert_eq!(suite.case_names().collect::<Vec<_>>(), vec!["increment", "shared state"]);
    }

    #[test]
    fn test_class_shares_instance() {
        let mut runner = Runner::new();
        runner.add_class::<Counter>().unwrap();

        let result = runner.run(&RunConfiguration::default()).unwrap();
        let suite = &result.suite_results[0];
        assert!(suite.init_passed());
        assert_eq!(suite.success_count, 2);
        assert!(result.overall_success());
    }

    #[test]
    fn test_class_registration_error() {
        let err = Runner::new().add_class::<Duplicated>().unwrap_err();
        assert_eq!(
            err,
            QcError::InvalidSuite {
                suite: "Duplicated".to_string(),
                reason: "duplicate test case 'same'".to_string(),
            }
        );
    }
}
