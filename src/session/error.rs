//! Session error types
//!
//! Every failure surfaced by the session manager is one of these kinds.
//! The variant tells callers how to react; the message is what the user sees.

use thiserror::Error;

/// Errors surfaced by authentication operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Required input was missing or malformed (detected before any request)
    #[error("{0}")]
    Validation(String),

    /// The remote service rejected the credentials or token
    #[error("{0}")]
    Authentication(String),

    /// The request could not complete (connect failure, timeout, unreadable reply)
    #[error("{0}")]
    Network(String),

    /// Another authentication operation is still running
    #[error("Another sign-in request is already in progress")]
    InProgress,

    /// Signed out before the operation finished; its result was discarded
    #[error("Signed out before the request finished")]
    Cancelled,
}

impl AuthError {
    /// Human-readable message for display
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Short name of the error kind, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::Validation(_) => "validation",
            AuthError::Authentication(_) => "authentication",
            AuthError::Network(_) => "network",
            AuthError::InProgress => "in_progress",
            AuthError::Cancelled => "cancelled",
        }
    }

    /// Whether resubmitting the same request unchanged could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::Network(_) | AuthError::InProgress)
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AuthError::Network("The server took too long to respond".to_string())
        } else if err.is_connect() {
            AuthError::Network("Unable to reach the server".to_string())
        } else if err.is_decode() {
            AuthError::Network(format!("Unexpected response from server: {}", err))
        } else {
            AuthError::Network(err.to_string())
        }
    }
}

/// Result type alias for session operations
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::Authentication("Invalid credentials".to_string());
        assert_eq!(err.to_string(), "Invalid credentials");
        assert_eq!(err.message(), "Invalid credentials");
        assert_eq!(err.kind(), "authentication");
    }

    #[test]
    fn test_retryable() {
        assert!(AuthError::Network("down".into()).is_retryable());
        assert!(AuthError::InProgress.is_retryable());
        assert!(!AuthError::Validation("missing".into()).is_retryable());
        assert!(!AuthError::Authentication("nope".into()).is_retryable());
        assert!(!AuthError::Cancelled.is_retryable());
    }
}
