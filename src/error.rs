//! Error types for live bindings.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for binding operations.
///
/// Only failures detected synchronously surface here. Asynchronous listener
/// failures are reported through [`ObservableResult::error`] instead.
///
/// [`ObservableResult::error`]: crate::binding::ObservableResult
#[derive(Debug, Error)]
pub enum BindingError {
    #[error("Invalid query descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Listener error: {0}")]
    Listener(#[from] ListenerError),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl BindingError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        BindingError::InvalidDescriptor(msg.into())
    }
}

impl From<rmp_serde::encode::Error> for BindingError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        BindingError::Serialization(e.to_string())
    }
}

/// Category of a failure reported by the remote store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerErrorCode {
    /// Security rules rejected the listener.
    PermissionDenied,
    /// Network loss or backend unreachable.
    Unavailable,
    /// The backend refused the query (e.g. missing index).
    InvalidQuery,
    /// The collection or parent path does not exist.
    NotFound,
    /// Anything else.
    Internal,
}

impl fmt::Display for ListenerErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ListenerErrorCode::PermissionDenied => "permission-denied",
            ListenerErrorCode::Unavailable => "unavailable",
            ListenerErrorCode::InvalidQuery => "invalid-query",
            ListenerErrorCode::NotFound => "not-found",
            ListenerErrorCode::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Terminal failure of a store listener.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ListenerError {
    pub code: ListenerErrorCode,
    pub message: String,
}

impl ListenerError {
    pub fn new(code: ListenerErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ListenerErrorCode::PermissionDenied, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ListenerErrorCode::Unavailable, message)
    }
}

/// Result type for binding operations.
pub type Result<T> = std::result::Result<T, BindingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listener_error_display() {
        let err = ListenerError::permission_denied("missing read rule");
        assert_eq!(err.to_string(), "permission-denied: missing read rule");
    }

    #[test]
    fn test_listener_error_converts() {
        let err: BindingError = ListenerError::unavailable("offline").into();
        assert!(matches!(err, BindingError::Listener(ref e) if e.code == ListenerErrorCode::Unavailable));
    }
}
