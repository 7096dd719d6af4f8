//! Client Error Types
//!
//! One error enum for every client operation, plus the coarse `ErrorKind`
//! used for matching and CLI exit codes.

use crate::transport::TransportError;

/// Errors returned by `NexusClient` operations
#[derive(Debug, thiserror::Error)]
pub enum NexusError {
    /// The addressed entity does not exist
    #[error("{0}")]
    NotFound(String),

    /// A create targeted a name that is already taken
    #[error("{0}")]
    AlreadyExists(String),

    /// Input rejected before any request was sent
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    PermissionDenied(String),

    /// The script raised; `message` is the engine's exception text
    #[error("{message}")]
    Execution { script: String, message: String },

    /// A response body did not have the expected shape
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// Non-2xx status with no mapping for it
    #[error("{method} {url} returned a status code of {status}")]
    UnexpectedStatus {
        method: String,
        url: String,
        status: u16,
    },

    /// Non-2xx status where the caller asked for the body itself
    #[error("Server returned {status}: {body}")]
    ErrorResponse { status: u16, body: String },

    #[error("{0}")]
    Unavailable(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type for client operations
pub type NexusResult<T> = Result<T, NexusError>;

/// Coarse error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    Execution,
    Transport,
    Http,
    Protocol,
}

impl ErrorKind {
    /// Process exit code used by the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorKind::InvalidArgument => 1,
            ErrorKind::NotFound => 2,
            ErrorKind::AlreadyExists => 3,
            ErrorKind::PermissionDenied => 4,
            ErrorKind::Execution => 10,
            ErrorKind::Transport => 20,
            ErrorKind::Http => 21,
            ErrorKind::Protocol => 30,
        }
    }
}

impl NexusError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NexusError::NotFound(_) => ErrorKind::NotFound,
            NexusError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            NexusError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            NexusError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            NexusError::Execution { .. } => ErrorKind::Execution,
            NexusError::Protocol(_) | NexusError::Decode(_) => ErrorKind::Protocol,
            NexusError::UnexpectedStatus { .. }
            | NexusError::ErrorResponse { .. }
            | NexusError::Unavailable(_) => ErrorKind::Http,
            NexusError::Transport(_) => ErrorKind::Transport,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_already_exists(&self) -> bool {
        self.kind() == ErrorKind::AlreadyExists
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_error_displays_engine_text_only() {
        let err = NexusError::Execution {
            script: "x".to_string(),
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "boom");
        assert_eq!(err.kind(), ErrorKind::Execution);
    }

    #[test]
    fn test_unexpected_status_message() {
        let err = NexusError::UnexpectedStatus {
            method: "GET".to_string(),
            url: "http://localhost:8081/service/rest/v1/script".to_string(),
            status: 502,
        };
        assert_eq!(
            err.to_string(),
            "GET http://localhost:8081/service/rest/v1/script returned a status code of 502"
        );
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(NexusError::NotFound("x".into()).exit_code(), 2);
        assert_eq!(NexusError::AlreadyExists("x".into()).exit_code(), 3);
        assert_eq!(NexusError::Protocol("x".into()).exit_code(), 30);
        assert_eq!(
            NexusError::Transport(TransportError::InvalidUrl("::".into())).exit_code(),
            20
        );
    }
}
