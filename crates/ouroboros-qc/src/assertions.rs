//! Assertion primitives - typed failure signals for test bodies
//!
//! Test bodies report an assertion failure by returning an
//! [`AssertionError`], usually through `?`:
//!
//! ```rust
//! use ouroboros_qc::assertions::{assert_that, AssertionResult};
//!
//! fn divides() -> AssertionResult {
//!     let divisor = 2;
//!     assert_that(divisor != 0, "division by zero")?;
//!     assert_that(10 / divisor == 5, "bad quotient")
//! }
//! # assert!(divides().is_ok());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for assertions
pub type AssertionResult = Result<(), AssertionError>;

/// Assertion error with context
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct AssertionError {
    /// Error message
    pub message: String,
    /// Expected value (stringified)
    pub expected: Option<String>,
    /// Actual value (stringified)
    pub actual: Option<String>,
    /// Assertion type (e.g., "assert", "to_equal")
    pub assertion_type: String,
}

impl AssertionError {
    /// Create a new assertion error
    pub fn new(message: impl Into<String>, assertion_type: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            expected: None,
            actual: None,
            assertion_type: assertion_type.into(),
        }
    }

    /// Add expected value
    pub fn with_expected(mut self, expected: impl fmt::Debug) -> Self {
        self.expected = Some(format!("{:?}", expected));
        self
    }

    /// Add actual value
    pub fn with_actual(mut self, actual: impl fmt::Debug) -> Self {
        self.actual = Some(format!("{:?}", actual));
        self
    }

    /// Message including expected/actual values when present
    pub fn detailed(&self) -> String {
        match (&self.expected, &self.actual) {
            (Some(expected), Some(actual)) => {
                format!("{} (expected: {}, actual: {})", self.message, expected, actual)
            }
            _ => self.message.clone(),
        }
    }
}

/// Fail with `message` unless `condition` holds
pub fn assert_that(condition: bool, message: impl Into<String>) -> AssertionResult {
    if condition {
        Ok(())
    } else {
        Err(AssertionError::new(message, "assert"))
    }
}

/// Log `source`, then fail with `message` unless it equals `target`
pub fn dump_and_compare(source: &str, target: &str, message: impl Into<String>) -> AssertionResult {
    tracing::info!(target: "ouroboros_qc::dump", "{}", source);
    if source == target {
        Ok(())
    } else {
        Err(AssertionError::new(message, "dump_and_compare")
            .with_expected(target)
            .with_actual(source))
    }
}

/// Return an [`AssertionError`] from the enclosing function unless the
/// condition holds.
///
/// Works in functions returning `Result<_, AssertionError>` and
/// `anyhow::Result<_>`.
#[macro_export]
macro_rules! qc_assert {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return ::std::result::Result::Err(
                $crate::assertions::AssertionError::new(format!($($arg)+), "assert").into(),
            );
        }
    };
    ($cond:expr $(,)?) => {
        $crate::qc_assert!($cond, "assertion failed: {}", stringify!($cond))
    };
}

/// Capture `value` for an equality check
pub fn expect<T>(value: T) -> Expectation<T> {
    Expectation { actual: value }
}

/// Value under test awaiting a comparison
#[derive(Debug, Clone)]
pub struct Expectation<T> {
    actual: T,
}

impl<T: PartialEq + fmt::Debug> Expectation<T> {
    /// Fail unless the captured value equals `expected`
    pub fn to_equal(&self, expected: &T) -> AssertionResult {
        assert_that(self.actual == *expected, format!("{:?} != {:?}", self.actual, expected))
            .map_err(|e| e.with_expected(expected).with_actual(&self.actual))
    }

    /// Fail if the captured value equals `unexpected`
    pub fn not_to_equal(&self, unexpected: &T) -> AssertionResult {
        assert_that(self.actual != *unexpected, format!("{:?} == {:?}", self.actual, unexpected))
    }
}
