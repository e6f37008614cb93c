//! Error Types

use thiserror::Error;

/// Result type alias for handler operations
pub type Result<T> = std::result::Result<T, HandlerError>;

/// Errors a payment handler may surface to the host.
///
/// Declines and processor failures are *not* errors: they come back as
/// typed results. Only faults the host has to act on end up here.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// Handler used before it was configured
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unexpected internal fault
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Configuration faults are fatal for every call until the host re-initializes
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Get user-friendly message
    pub const fn user_message(&self) -> &str {
        match self {
            Self::Config(_) => "Payment method is not configured.",
            Self::Internal(_) => "An error occurred processing your payment.",
        }
    }
}
