//! Error taxonomy surfaced to the pipeline by its collaborators.
//!
//! Any error terminating an operation that feeds a result source is captured
//! verbatim into [`DataState::Error`](crate::DataState::Error). Nothing in the
//! pipeline retries automatically.

use core::fmt;
use std::error::Error as StdError;
use std::sync::Arc;

/// A shared, cloneable handle to the underlying cause of a [`DataError`].
///
/// Equality is identity: two causes are equal only when they are the same
/// captured error.
#[derive(Clone)]
pub struct ErrorCause(Arc<dyn StdError + Send + Sync>);

impl ErrorCause {
    /// Capture an error as a cause.
    pub fn new(error: impl StdError + Send + Sync + 'static) -> Self {
        Self(Arc::new(error))
    }

    /// Capture a plain message as a cause.
    pub fn msg(message: impl Into<String>) -> Self {
        Self(Arc::new(Message(message.into())))
    }

    /// Borrow the captured error.
    #[must_use]
    pub fn get(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.0
    }
}

impl PartialEq for ErrorCause {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for ErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

#[derive(Debug)]
struct Message(String);

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for Message {}

/// Errors that terminate an operation feeding the pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataError {
    /// The transport failed to deliver the request or response.
    #[error("transport failure: {0}")]
    TransportFailure(ErrorCause),
    /// No network connectivity.
    #[error("no connectivity: {0}")]
    NoConnectivity(ErrorCause),
    /// The server answered with a non-2xx status.
    #[error("invalid status {code}")]
    InvalidStatus {
        /// HTTP status code.
        code: u16,
        /// Raw response body.
        body: Vec<u8>,
    },
    /// The payload could not be decoded.
    #[error("decode failure: {0}")]
    DecodeFailure(ErrorCause),
    /// The operation was cancelled.
    #[error("cancelled")]
    Cancelled,
    /// Authorization could not be obtained or was rejected.
    #[error("authorization failure: {0}")]
    AuthorizationFailure(ErrorCause),
    /// Anything else.
    #[error("unknown error")]
    Unknown,
}

impl DataError {
    /// Shorthand for a [`DataError::TransportFailure`] with a message cause.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::TransportFailure(ErrorCause::msg(message))
    }

    /// Shorthand for a [`DataError::DecodeFailure`] wrapping `error`.
    pub fn decode(error: impl StdError + Send + Sync + 'static) -> Self {
        Self::DecodeFailure(ErrorCause::new(error))
    }

    /// Whether retrying the same request could plausibly succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::TransportFailure(_) | Self::NoConnectivity(_) => true,
            Self::InvalidStatus { code, .. } => *code >= 500,
            Self::DecodeFailure(_)
            | Self::Cancelled
            | Self::AuthorizationFailure(_)
            | Self::Unknown => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cause_equality_is_identity() {
        let a = ErrorCause::msg("boom");
        let b = ErrorCause::msg("boom");
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn display_includes_cause() {
        let err = DataError::transport("socket closed");
        assert_eq!(err.to_string(), "transport failure: socket closed");
        let err = DataError::InvalidStatus {
            code: 404,
            body: b"missing".to_vec(),
        };
        assert_eq!(err.to_string(), "invalid status 404");
    }

    #[test]
    fn transient_classification() {
        assert!(DataError::transport("x").is_transient());
        assert!(
            DataError::InvalidStatus {
                code: 503,
                body: Vec::new()
            }
            .is_transient()
        );
        assert!(
            !DataError::InvalidStatus {
                code: 400,
                body: Vec::new()
            }
            .is_transient()
        );
        assert!(!DataError::Cancelled.is_transient());
    }

    #[test]
    fn cause_exposes_source_error() {
        let parse = "x".parse::<u32>().unwrap_err();
        let err = DataError::decode(parse);
        let DataError::DecodeFailure(cause) = &err else {
            panic!("expected decode failure");
        };
        assert!(cause.get().to_string().contains("invalid digit"));
    }
}
