//! Test outcomes - the shapes a test body may return and how they fail

use crate::assertions::AssertionError;
use serde::{Deserialize, Serialize};

/// Why a test case failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Test-authored assertion failure
    Assertion,
    /// Panic or non-assertion error raised by the body
    Unexpected,
    /// Falsy [`OperationResult`]
    Rejected,
    /// Body returned `false`
    ReturnedFalse,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Assertion => write!(f, "assertion"),
            FailureKind::Unexpected => write!(f, "unexpected"),
            FailureKind::Rejected => write!(f, "rejected"),
            FailureKind::ReturnedFalse => write!(f, "returned false"),
        }
    }
}

/// Failure diagnostic attached to a failing case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Whether the failure was anticipated by the test author
    pub fn is_expected(&self) -> bool {
        self.kind != FailureKind::Unexpected
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Outcome of a single test body invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed(Failure),
}

impl Outcome {
    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        Outcome::Failed(Failure::new(kind, message))
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }

    pub fn into_failure(self) -> Option<Failure> {
        match self {
            Outcome::Passed => None,
            Outcome::Failed(failure) => Some(failure),
        }
    }
}

/// Structured truthy/falsy result a test body may return
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    success: bool,
    message: Option<String>,
}

impl OperationResult {
    pub fn success() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl std::fmt::Display for OperationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.message, self.success) {
            (Some(message), _) => write!(f, "{}", message),
            (None, true) => write!(f, "success"),
            (None, false) => write!(f, "failure"),
        }
    }
}

/// Conversion from a test body's return value into an [`Outcome`]
pub trait IntoOutcome {
    fn into_outcome(self) -> Outcome;
}

impl IntoOutcome for Outcome {
    fn into_outcome(self) -> Outcome {
        self
    }
}

impl IntoOutcome for bool {
    fn into_outcome(self) -> Outcome {
        if self {
            Outcome::Passed
        } else {
            Outcome::failed(FailureKind::ReturnedFalse, "test case returned false")
        }
    }
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Outcome {
        Outcome::Passed
    }
}

impl IntoOutcome for OperationResult {
    fn into_outcome(self) -> Outcome {
        if self.success {
            Outcome::Passed
        } else {
            Outcome::failed(FailureKind::Rejected, self.to_string())
        }
    }
}

impl IntoOutcome for Result<(), AssertionError> {
    fn into_outcome(self) -> Outcome {
        match self {
            Ok(()) => Outcome::Passed,
            Err(err) => Outcome::failed(FailureKind::Assertion, err.detailed()),
        }
    }
}

impl IntoOutcome for anyhow::Result<()> {
    fn into_outcome(self) -> Outcome {
        match self {
            Ok(()) => Outcome::Passed,
            Err(err) => match err.downcast_ref::<AssertionError>() {
                Some(assertion) => Outcome::failed(FailureKind::Assertion, assertion.detailed()),
                None => Outcome::failed(FailureKind::Unexpected, format!("{:?}", err)),
            },
        }
    }
}
