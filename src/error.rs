//! Typed error taxonomy for handler failures.
//!
//! Handlers signal failures by returning [`HandlerError`]. A recognized
//! [`HttpError`] carries its own HTTP status and its message is rendered to
//! the client as `{"message": ..., "status": ...}`. Anything else is an
//! internal failure: the dispatcher collapses it to a bare 500 and the
//! message is logged server-side only, never sent to the client.

use thiserror::Error;

/// A failure with a well-known HTTP status code.
///
/// Thrown (returned) by handler code and mapped to a response by the
/// dispatcher. The message is client-visible.
#[derive(Debug, Clone, Error)]
pub enum HttpError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    TooManyRequests(String),
    /// Arbitrary status outside the canonical kinds.
    #[error("{message}")]
    Custom { status: u16, message: String },
}

impl HttpError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        HttpError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        HttpError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        HttpError::NotFound(message.into())
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        HttpError::TooManyRequests(message.into())
    }

    pub fn custom(status: u16, message: impl Into<String>) -> Self {
        HttpError::Custom {
            status,
            message: message.into(),
        }
    }

    /// The HTTP status code carried by this error.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            HttpError::Unauthorized(_) => 401,
            HttpError::Forbidden(_) => 403,
            HttpError::NotFound(_) => 404,
            HttpError::TooManyRequests(_) => 429,
            HttpError::Custom { status, .. } => *status,
        }
    }

    /// The client-visible message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            HttpError::Unauthorized(m)
            | HttpError::Forbidden(m)
            | HttpError::NotFound(m)
            | HttpError::TooManyRequests(m) => m,
            HttpError::Custom { message, .. } => message,
        }
    }
}

/// Error type returned by handlers.
///
/// `Http` carries a recognized status and is rendered with it; `Internal`
/// wraps any other failure and is collapsed to a 500 with no detail leakage.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(HttpError::unauthorized("x").status(), 401);
        assert_eq!(HttpError::forbidden("x").status(), 403);
        assert_eq!(HttpError::not_found("x").status(), 404);
        assert_eq!(HttpError::too_many_requests("x").status(), 429);
        assert_eq!(HttpError::custom(418, "teapot").status(), 418);
    }

    #[test]
    fn message_is_preserved() {
        let err = HttpError::not_found("no such item");
        assert_eq!(err.message(), "no such item");
        assert_eq!(err.to_string(), "no such item");
    }
}
