//! Error types for GCN project teardown

use thiserror::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the teardown system
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    /// `operation` names what was attempted, `message` the underlying cause
    #[error("{operation}: {message}")]
    Operation { operation: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Inconsistent pipeline structure: {pipeline}")]
    InconsistentPipeline { pipeline: String },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// Failure of a named operation
    pub fn operation(operation: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Error::Operation {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    /// Re-label an error with the operation that failed.
    ///
    /// Fatal errors keep their identity so they still propagate to the caller.
    pub fn context(self, operation: impl Into<String>) -> Self {
        match self {
            Error::InconsistentPipeline { .. } => self,
            Error::Operation { message, .. } => Error::Operation {
                operation: operation.into(),
                message,
            },
            other => Error::operation(operation, other),
        }
    }

    /// Whether this error signals corrupt producer data rather than a runtime failure
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::InconsistentPipeline { .. })
    }

    /// Whether the provider reported the resource as missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::operation("Failed to delete build pipeline", "409 Conflict");
        assert_eq!(err.to_string(), "Failed to delete build pipeline: 409 Conflict");

        let err = Error::InconsistentPipeline {
            pipeline: "ocid1.pipeline".to_string(),
        };
        assert_eq!(err.to_string(), "Inconsistent pipeline structure: ocid1.pipeline");

        let err = Error::Configuration("missing profile".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing profile");
    }

    #[test]
    fn test_context_relabels_operation_errors() {
        let err = Error::operation("oci devops repository delete", "timeout")
            .context("Failed to delete code repository app");
        assert_eq!(err.to_string(), "Failed to delete code repository app: timeout");

        let err = Error::NotFound("repo".to_string()).context("Failed to list logs");
        assert_eq!(err.to_string(), "Failed to list logs: Resource not found: repo");
    }

    #[test]
    fn test_context_keeps_fatal_errors() {
        let err = Error::InconsistentPipeline {
            pipeline: "p".to_string(),
        }
        .context("Failed to delete build pipeline");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_classification() {
        assert!(Error::NotFound("x".to_string()).is_not_found());
        assert!(!Error::Other("x".to_string()).is_not_found());
        assert!(!Error::operation("op", "msg").is_fatal());
    }
}
