//! Deadline wrapper for outbound Square calls

use std::future::Future;
use std::time::Duration;

use crate::error::{Result, SquareError};

/// Deadline applied to every Square call unless the handler overrides it
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Race `future` against `deadline`.
///
/// On expiry the future is dropped, which abandons the HTTP request locally.
/// Square may already have received it, so the remote operation can still
/// complete; the returned error says so.
pub async fn with_timeout<F, T>(future: F, deadline: Duration, message: impl Into<String>) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(deadline, future).await {
        Ok(result) => result,
        Err(_) => Err(SquareError::Timeout {
            message: message.into(),
            after: deadline,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completes_before_deadline() {
        let result = with_timeout(async { Ok(42) }, Duration::from_secs(1), "fast call").await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_inner_error_passes_through() {
        let result: Result<()> = with_timeout(
            async { Err(SquareError::MissingObject("payment")) },
            Duration::from_secs(1),
            "failing call",
        )
        .await;
        assert!(matches!(result, Err(SquareError::MissingObject("payment"))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hang_becomes_timeout() {
        let result: Result<()> = with_timeout(
            async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            },
            DEFAULT_TIMEOUT,
            "Square completePayment",
        )
        .await;

        let err = result.unwrap_err();
        assert!(err.is_timeout());
        assert!(err.to_string().starts_with("Square completePayment timed out after 30s"));
    }
}
