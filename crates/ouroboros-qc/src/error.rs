//! Error types for ouroboros-qc

use crate::runner::GlobalResult;
use thiserror::Error;

/// Result type alias for ouroboros-qc operations
pub type Result<T> = std::result::Result<T, QcError>;

/// Errors that escape the test engine.
///
/// Per-case failures never show up here; they are recorded in the case
/// result. Only registration problems, configuration problems and cleanup
/// failures surface to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QcError {
    /// Malformed suite registration
    #[error("Invalid suite '{suite}': {reason}")]
    InvalidSuite { suite: String, reason: String },

    /// Invalid or unreadable run configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A suite cleanup hook reported a failure
    #[error("Cleanup of suite '{suite}' failed: {message}")]
    Cleanup { suite: String, message: String },

    /// Report rendering failed
    #[error("Report error: {0}")]
    Report(String),

    /// The run stopped early; `partial` holds every suite that ran,
    /// including the one that raised `source`
    #[error("{source}")]
    Aborted {
        partial: Box<GlobalResult>,
        source: Box<QcError>,
    },
}

impl QcError {
    pub(crate) fn invalid_suite(suite: impl Into<String>, reason: impl Into<String>) -> Self {
        QcError::InvalidSuite {
            suite: suite.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this error was raised while building suites
    pub fn is_registration_error(&self) -> bool {
        matches!(self, QcError::InvalidSuite { .. })
    }

    /// Results gathered before the run was aborted
    pub fn partial_result(&self) -> Option<&GlobalResult> {
        match self {
            QcError::Aborted { partial, .. } => Some(&**partial),
            _ => None,
        }
    }

    /// The error that stopped the run, unwrapped from [`QcError::Aborted`]
    pub fn cause(&self) -> &QcError {
        match self {
            QcError::Aborted { source, .. } => source.cause(),
            other => other,
        }
    }
}

impl From<toml::de::Error> for QcError {
    fn from(err: toml::de::Error) -> Self {
        QcError::Config(err.to_string())
    }
}

impl From<std::fmt::Error> for QcError {
    fn from(err: std::fmt::Error) -> Self {
        QcError::Report(err.to_string())
    }
}

impl From<serde_json::Error> for QcError {
    fn from(err: serde_json::Error) -> Self {
        QcError::Report(err.to_string())
    }
}

impl From<serde_yaml::Error> for QcError {
    fn from(err: serde_yaml::Error) -> Self {
        QcError::Report(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QcError::invalid_suite("Math", "duplicate test case 'add'");
        assert_eq!(err.to_string(), "Invalid suite 'Math': duplicate test case 'add'");
        assert!(err.is_registration_error());

        let err = QcError::Cleanup {
            suite: "Io".to_string(),
            message: "temp dir still locked".to_string(),
        };
        assert_eq!(err.to_string(), "Cleanup of suite 'Io' failed: temp dir still locked");
        assert!(!err.is_registration_error());
        assert!(err.partial_result().is_none());
    }

    #[test]
    fn test_aborted_wraps_cause() {
        let cause = QcError::Cleanup {
            suite: "Io".to_string(),
            message: "temp dir still locked".to_string(),
        };
        let err = QcError::Aborted {
            partial: Box::new(GlobalResult::default()),
            source: Box::new(cause.clone()),
        };
        assert_eq!(err.to_string(), cause.to_string());
        assert_eq!(err.cause(), &cause);
        assert_eq!(err.partial_result(), Some(&GlobalResult::default()));
    }
}
