use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::sink::SinkState;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("I/O failure during {operation} on {}: {source}", .path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot {operation} while the sink is {state}")]
    InvalidState {
        operation: &'static str,
        state: SinkState,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Failed to load configuration from {origin}: {error}")]
    LoadFailed {
        origin: String,
        #[source]
        error: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("YAML serialization failed: {reason}")]
    Yaml { reason: String },
}

pub type Result<T> = std::result::Result<T, SinkError>;

impl From<serde_yaml::Error> for SinkError {
    fn from(err: serde_yaml::Error) -> Self {
        SinkError::Serialization(SerializationError::Yaml {
            reason: err.to_string(),
        })
    }
}

impl SinkError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        SinkError::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Whether the caller may reasonably retry the failed operation.
    /// The sink never retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            SinkError::Io { source, .. } => matches!(
                source.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
            ),
            SinkError::InvalidState { .. } => false,
            SinkError::Config(_) => false,
            SinkError::Serialization(_) => false,
        }
    }

    pub fn is_io(&self) -> bool {
        matches!(self, SinkError::Io { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_retry_classification() {
        let transient = SinkError::io(
            "write",
            "/tmp/out",
            io::Error::new(io::ErrorKind::Interrupted, "signal"),
        );
        assert!(transient.is_retryable());
        assert!(transient.is_io());

        let fatal = SinkError::io(
            "open",
            "/tmp/out",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!fatal.is_retryable());
    }

    #[test]
    fn test_invalid_state_message() {
        let err = SinkError::InvalidState {
            operation: "process",
            state: SinkState::Unopened,
        };
        assert_eq!(err.to_string(), "Cannot process while the sink is unopened");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_err = serde_yaml::from_str::<Vec<u32>>("{not: [a list").unwrap_err();
        let err: SinkError = yaml_err.into();
        assert!(matches!(
            err,
            SinkError::Serialization(SerializationError::Yaml { .. })
        ));
    }
}
