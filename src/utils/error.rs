use crate::core::context::CancelReason;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field} must be specified")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("HTTP request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Transport error: {message}")]
    TransportError { message: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid base64 value: {0}")]
    DecodeError(#[from] base64::DecodeError),

    #[error("Invalid timestamp '{value}': {reason}")]
    TimestampError { value: String, reason: String },

    #[error("Key does not exist: {key}")]
    NotFound { key: String },

    #[error("Unknown status code received from {operation}: {status}")]
    UnexpectedStatus { operation: String, status: u16 },

    #[error("Operation cancelled: {reason}")]
    Cancelled { reason: CancelReason },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Coarse classification callers can branch on without matching messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Transport,
    Encoding,
    NotFound,
    UnexpectedStatus,
    Cancelled,
    Io,
}

impl StorageError {
    pub fn not_found(key: impl Into<String>) -> Self {
        StorageError::NotFound { key: key.into() }
    }

    pub fn unexpected_status(operation: impl Into<String>, status: u16) -> Self {
        StorageError::UnexpectedStatus {
            operation: operation.into(),
            status,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::ConfigError { .. }
            | StorageError::MissingConfigError { .. }
            | StorageError::InvalidConfigValueError { .. }
            | StorageError::TomlError(_) => ErrorKind::Configuration,
            // body decoding failures also arrive as reqwest errors
            StorageError::ApiError(e) if e.is_decode() => ErrorKind::Encoding,
            StorageError::ApiError(_) | StorageError::TransportError { .. } => {
                ErrorKind::Transport
            }
            StorageError::SerializationError(_)
            | StorageError::DecodeError(_)
            | StorageError::TimestampError { .. } => ErrorKind::Encoding,
            StorageError::NotFound { .. } => ErrorKind::NotFound,
            StorageError::UnexpectedStatus { .. } => ErrorKind::UnexpectedStatus,
            StorageError::Cancelled { .. } => ErrorKind::Cancelled,
            StorageError::IoError(_) => ErrorKind::Io,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind() == ErrorKind::Cancelled
    }

    /// The HTTP status carried by an unexpected-status error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            StorageError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.kind() {
            ErrorKind::Configuration => format!("Storage is not configured correctly: {}", self),
            ErrorKind::Transport => {
                format!("Could not reach the remote storage service: {}", self)
            }
            ErrorKind::Encoding => format!(
                "The remote storage service sent data this client does not understand: {}",
                self
            ),
            ErrorKind::NotFound => self.to_string(),
            ErrorKind::UnexpectedStatus => format!(
                "The remote storage service rejected the request (HTTP {})",
                self.status_code().unwrap_or_default()
            ),
            ErrorKind::Cancelled => self.to_string(),
            ErrorKind::Io => format!("Local file error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            StorageError::MissingConfigError {
                field: "token".to_string()
            }
            .kind(),
            ErrorKind::Configuration
        );
        assert_eq!(StorageError::not_found("a").kind(), ErrorKind::NotFound);
        assert_eq!(
            StorageError::unexpected_status("lock", 500).kind(),
            ErrorKind::UnexpectedStatus
        );
        assert_eq!(
            StorageError::Cancelled {
                reason: CancelReason::DeadlineExceeded
            }
            .kind(),
            ErrorKind::Cancelled
        );

        let json_err = serde_json::from_str::<bool>("nope").unwrap_err();
        assert_eq!(StorageError::from(json_err).kind(), ErrorKind::Encoding);
    }

    #[test]
    fn test_status_code_only_for_unexpected_status() {
        assert_eq!(
            StorageError::unexpected_status("store", 503).status_code(),
            Some(503)
        );
        assert_eq!(StorageError::not_found("k").status_code(), None);
    }

    #[test]
    fn test_messages() {
        let err = StorageError::unexpected_status("unlock", 409);
        assert_eq!(
            err.to_string(),
            "Unknown status code received from unlock: 409"
        );
        assert!(err.user_friendly_message().contains("409"));
        assert!(StorageError::not_found("certs/a").is_not_found());
    }
}
