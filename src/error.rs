//! Error types for chess-relay.

use thiserror::Error;

/// Main error type for chess-relay operations.
#[derive(Error, Debug)]
pub enum RelayError {
    /// A required request field was absent or empty.
    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),

    /// The upstream chat client was never configured (no usable credential).
    #[error("chat service unavailable: no API credential configured")]
    ServiceUnavailable,

    /// The upstream chat call failed; the session was evicted.
    #[error("upstream failure: {0}")]
    UpstreamFailure(String),

    /// No session is stored under the given identifier.
    #[error("session not found: {0}")]
    NotFound(String),

    /// Internal lock was poisoned.
    #[error("internal lock poisoned")]
    LockPoisoned,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for chess-relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parameter_display() {
        let err = RelayError::MissingParameter("fen");
        assert!(err.to_string().contains("missing parameter"));
        assert!(err.to_string().contains("fen"));
    }

    #[test]
    fn test_not_found_display() {
        let err = RelayError::NotFound("game-42".into());
        assert!(err.to_string().contains("game-42"));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_upstream_failure_carries_message() {
        let err = RelayError::UpstreamFailure("HTTP 503: overloaded".into());
        assert!(err.to_string().contains("overloaded"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken");
        let err: RelayError = io_err.into();
        assert!(matches!(err, RelayError::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }
}
