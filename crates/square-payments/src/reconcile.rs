//! Reconciliation hook for timed-out calls
//!
//! A timeout only means we stopped waiting. Square may still capture,
//! refund or void after the handler has reported a failure, so the composer
//! can install a hook to follow up on those calls.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::gateway::SquareGateway;
use crate::timeout::{DEFAULT_TIMEOUT, with_timeout};

/// Square operation a handler method performs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SquareOperation {
    CreatePayment,
    CompletePayment,
    CancelPayment,
    RefundPayment,
}

impl SquareOperation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreatePayment => "createPayment",
            Self::CompletePayment => "completePayment",
            Self::CancelPayment => "cancelPayment",
            Self::RefundPayment => "refundPayment",
        }
    }
}

impl fmt::Display for SquareOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A call that hit its deadline and may still land remotely
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimedOutCall {
    pub operation: SquareOperation,
    pub order_code: String,
    /// Key the request was sent with; a retry with it is safe
    pub idempotency_key: Option<String>,
    /// Square payment the call targeted, absent for authorizations
    pub payment_id: Option<String>,
}

/// Follow-up for calls whose remote outcome is unknown
#[async_trait]
pub trait ReconciliationHook: Send + Sync {
    async fn on_timeout(&self, call: TimedOutCall);
}

/// Voids authorizations whose create call timed out.
///
/// Square keeps the idempotency key of a create request, so the payment it
/// may have produced can be cancelled without knowing its id. Other
/// operations are only logged by the handler.
pub struct CancelTimedOutAuthorizations {
    gateway: Arc<SquareGateway>,
    timeout: Duration,
}

impl CancelTimedOutAuthorizations {
    pub const fn new(gateway: Arc<SquareGateway>) -> Self {
        Self {
            gateway,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ReconciliationHook for CancelTimedOutAuthorizations {
    async fn on_timeout(&self, call: TimedOutCall) {
        if call.operation != SquareOperation::CreatePayment {
            return;
        }
        let Some(key) = call.idempotency_key else {
            return;
        };

        let client = match self.gateway.client().await {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(
                    order_code = %call.order_code,
                    error = %e,
                    "Cannot void timed-out authorization"
                );
                return;
            }
        };

        let result = with_timeout(
            client.cancel_payment_by_idempotency_key(&key),
            self.timeout,
            "Square cancelPaymentByIdempotencyKey",
        )
        .await;

        match result {
            Ok(()) => tracing::info!(
                order_code = %call.order_code,
                idempotency_key = %key,
                "Voided timed-out authorization"
            ),
            Err(e) => tracing::warn!(
                order_code = %call.order_code,
                idempotency_key = %key,
                error = %e,
                "Failed to void timed-out authorization; reconcile manually"
            ),
        }
    }
}
