//! Square Error Types

use std::time::Duration;

use payment_core::HandlerError;
use thiserror::Error;

use crate::api::ApiErrorDetail;

/// Result type alias
pub type Result<T> = std::result::Result<T, SquareError>;

/// Square integration errors
#[derive(Error, Debug)]
pub enum SquareError {
    /// Credentials missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Square answered with a non-success HTTP status
    #[error("Square API error (HTTP {status}): {}", describe_errors(.errors))]
    Api {
        status: u16,
        errors: Vec<ApiErrorDetail>,
    },

    /// Transport failure talking to Square
    #[error("Square request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be decoded
    #[error("Square response could not be decoded: {0}")]
    Json(#[from] serde_json::Error),

    /// Deadline elapsed before Square answered
    #[error(
        "{message} timed out after {}s; the Square request may still complete remotely",
        .after.as_secs()
    )]
    Timeout { message: String, after: Duration },

    /// Success response without the expected object
    #[error("Square response did not include a {0} object")]
    MissingObject(&'static str),
}

impl SquareError {
    /// Check if this error is retryable
    ///
    /// Nothing in this crate retries; callers use this to decide whether a
    /// retry with the same idempotency key makes sense.
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout { .. } => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Get user-friendly message
    pub const fn user_message(&self) -> &str {
        match self {
            Self::Config(_) => "Square payments are not configured.",
            Self::Api { .. } => "The payment was rejected by Square.",
            Self::Timeout { .. } => "Square did not respond in time.",
            _ => "Payment processing failed. Please try again.",
        }
    }
}

impl From<SquareError> for HandlerError {
    fn from(err: SquareError) -> Self {
        match err {
            SquareError::Config(msg) => Self::Config(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

fn describe_errors(errors: &[ApiErrorDetail]) -> String {
    if errors.is_empty() {
        return "no error detail".into();
    }
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
