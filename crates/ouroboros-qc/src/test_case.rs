//! Test case - a named test body invoked through the measurement probe

use crate::outcome::{Failure, FailureKind, IntoOutcome, Outcome};
use crate::probe::{measure, MeasurementRecord, MetricsProbe};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Result of one test case execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseResult {
    /// Test case name
    pub name: String,
    /// Timing and memory deltas of the whole attempt
    pub measurement: MeasurementRecord,
    /// Whether the case passed
    pub passed: bool,
    /// Failure diagnostic (set iff `passed` is false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
}

impl TestCaseResult {
    /// Build a result from a measured outcome
    pub fn new(name: impl Into<String>, measurement: MeasurementRecord, outcome: Outcome) -> Self {
        let failure = outcome.into_failure();
        Self {
            name: name.into(),
            measurement,
            passed: failure.is_none(),
            failure,
        }
    }

    /// Measurement summary line
    pub fn debug_string(&self) -> String {
        self.measurement.to_string()
    }
}

type TestBody = Box<dyn FnMut() -> Outcome>;

/// A named, runnable unit of test logic
pub struct TestCase {
    name: String,
    body: TestBody,
}

impl TestCase {
    /// Wrap a test body returning any recognized outcome shape
    pub fn new<F, R>(name: impl Into<String>, mut body: F) -> Self
    where
        F: FnMut() -> R + 'static,
        R: IntoOutcome,
    {
        Self {
            name: name.into(),
            body: Box::new(move || body().into_outcome()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execute the body once under the probe.
    ///
    /// Panics and failing outcomes are converted into a failing result; they
    /// never propagate past this call.
    pub fn run(&mut self, probe: &dyn MetricsProbe) -> TestCaseResult {
        let name = &self.name;
        let body = &mut self.body;
        let mut outcome = Outcome::Passed;

        let (measurement, _) = measure(probe, || {
            outcome = match catch_unwind(AssertUnwindSafe(|| body())) {
                Ok(outcome) => outcome,
                Err(payload) => Outcome::failed(FailureKind::Unexpected, panic_message(payload.as_ref())),
            };
            outcome.is_passed()
        });

        if let Outcome::Failed(ref failure) = outcome {
            if failure.is_expected() {
                tracing::warn!(test_case = %name, kind = %failure.kind, "{}", failure.message);
            } else {
                tracing::error!(test_case = %name, "unexpected failure: {}", failure.message);
            }
        }

        TestCaseResult::new(name.clone(), measurement, outcome)
    }
}

impl std::fmt::Debug for TestCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestCase").field("name", &self.name).finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked: unknown payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertions::{assert_that, AssertionResult};
    use crate::outcome::OperationResult;
    use crate::probe::ProcessProbe;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_boolean_body() {
        let mut case = TestCase::new("add ok", || 1 + 1 == 2);
        let result = case.run(&ProcessProbe);
        assert_eq!(result.name, "add ok");
        assert!(result.passed);
        assert!(result.failure.is_none());

        let mut case = TestCase::new("always false", || false);
        let result = case.run(&ProcessProbe);
        assert!(!result.passed);
        assert_eq!(result.failure.unwrap().kind, FailureKind::ReturnedFalse);
    }

    #[test]
    fn test_unit_body_is_implicit_success() {
        let mut case = TestCase::new("noop", || {});
        assert!(case.run(&ProcessProbe).passed);
    }

    #[test]
    fn test_assertion_failure_is_caught() {
        fn div_by_zero() -> AssertionResult {
            assert_that(false, "division by zero")
        }
        let mut case = TestCase::new("div by zero", div_by_zero);
        let result = case.run(&ProcessProbe);
        assert!(!result.passed);
        assert_eq!(
            result.failure,
            Some(Failure::new(FailureKind::Assertion, "division by zero"))
        );
    }

    #[test]
    fn test_falsy_operation_result() {
        let mut case = TestCase::new("rejected", || OperationResult::failure("checksum differs"));
        let failure = case.run(&ProcessProbe).failure.unwrap();
        assert_eq!(failure.kind, FailureKind::Rejected);
        assert_eq!(failure.message, "checksum differs");
    }

    #[test]
    fn test_panic_is_caught() {
        let mut case = TestCase::new("explodes", || -> bool { panic!("index out of range") });
        let result = case.run(&ProcessProbe);
        assert!(!result.passed);
        let failure = result.failure.unwrap();
        assert_eq!(failure.kind, FailureKind::Unexpected);
        assert_eq!(failure.message, "panicked: index out of range");
    }

    #[test]
    fn test_body_runs_once_per_run() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let mut case = TestCase::new("counted", move || counter.set(counter.get() + 1));

        case.run(&ProcessProbe);
        case.run(&ProcessProbe);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_result_serialization() {
        let result = TestCaseResult::new("ok", MeasurementRecord::default(), Outcome::Passed);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"passed\":true"));
        assert!(!json.contains("failure"));
    }
}
