//! Square Payment Handler
//!
//! Maps the host's payment lifecycle calls onto single Square API calls.
//! Every operation converts its outcome into a typed result in exactly one
//! place; only a missing configuration is returned as an error.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use payment_core::{
    CancelPaymentResult, CreatePaymentResult, CreateRefundResult, HandlerError, Metadata, Order,
    PaymentMethodHandler, PaymentRecord, RefundInput, SettlePaymentResult,
};
use serde_json::Value;

use crate::api::{ApiErrorDetail, CreatePaymentRequest, Money, Payment, RefundPaymentRequest};
use crate::error::{Result, SquareError};
use crate::gateway::SquareGateway;
use crate::idempotency::IdempotencyKey;
use crate::reconcile::{ReconciliationHook, SquareOperation, TimedOutCall};
use crate::timeout::{DEFAULT_TIMEOUT, with_timeout};

/// Code identifying this handler in the host's payment-method registry
pub const HANDLER_CODE: &str = "square-payment";

pub const HANDLER_DESCRIPTION: &str = "Square payments";

pub const MISSING_TOKEN_MESSAGE: &str =
    "Missing Square payment token: expected `sourceId` or `token` in payment metadata";

const MISSING_TRANSACTION_MESSAGE: &str = "Missing Square transaction id on payment";

const MISSING_REFUND_ID_MESSAGE: &str =
    "Missing refund id: Square refunds need a host refund id to stay idempotent";

/// Metadata keys that may carry the storefront's one-time card token
const TOKEN_KEYS: [&str; 2] = ["sourceId", "token"];

const STATUS_COMPLETED: &str = "COMPLETED";
const STATUS_PENDING: &str = "PENDING";
const STATUS_CANCELED: &str = "CANCELED";
const STATUS_FAILED: &str = "FAILED";

/// Square implementation of the host's payment-method handler
pub struct SquarePaymentHandler {
    gateway: Arc<SquareGateway>,
    timeout: Duration,
    reconciliation: Option<Arc<dyn ReconciliationHook>>,
}

impl SquarePaymentHandler {
    pub fn new(gateway: Arc<SquareGateway>) -> Self {
        Self {
            gateway,
            timeout: DEFAULT_TIMEOUT,
            reconciliation: None,
        }
    }

    /// Override the per-call deadline
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Install a hook notified about calls that timed out
    ///
    /// The hook runs inside the timed-out operation, so that call returns to
    /// the host only after the hook finishes. A hook making its own Square
    /// call should bound it by a deadline of its own.
    #[must_use]
    pub fn with_reconciliation(mut self, hook: Arc<dyn ReconciliationHook>) -> Self {
        self.reconciliation = Some(hook);
        self
    }

    pub const fn gateway(&self) -> &Arc<SquareGateway> {
        &self.gateway
    }

    /// Run one Square call under the deadline, reporting timeouts
    async fn call<T, F>(
        &self,
        future: F,
        operation: SquareOperation,
        order_code: &str,
        idempotency_key: Option<&IdempotencyKey>,
        payment_id: Option<&str>,
    ) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send,
    {
        let result = with_timeout(future, self.timeout, format!("Square {operation}")).await;

        if matches!(result, Err(SquareError::Timeout { .. })) {
            tracing::warn!(
                operation = %operation,
                order_code = %order_code,
                idempotency_key = ?idempotency_key.map(IdempotencyKey::as_str),
                payment_id = ?payment_id,
                "Square call timed out; remote outcome unknown"
            );

            if let Some(hook) = &self.reconciliation {
                hook.on_timeout(TimedOutCall {
                    operation,
                    order_code: order_code.to_string(),
                    idempotency_key: idempotency_key.map(|k| k.as_str().to_string()),
                    payment_id: payment_id.map(ToString::to_string),
                })
                .await;
            }
        }

        result
    }
}

#[async_trait]
impl PaymentMethodHandler for SquarePaymentHandler {
    fn code(&self) -> &str {
        HANDLER_CODE
    }

    fn description(&self) -> &str {
        HANDLER_DESCRIPTION
    }

    async fn create_payment(
        &self,
        order: &Order,
        amount: i64,
        metadata: &Metadata,
    ) -> payment_core::Result<CreatePaymentResult> {
        let started = Instant::now();

        let Some(source_id) = payment_token(metadata) else {
            tracing::warn!(
                order_code = %order.code,
                amount,
                elapsed_ms = elapsed_ms(started),
                "Declining payment without a Square token"
            );
            return Ok(CreatePaymentResult::declined(amount, MISSING_TOKEN_MESSAGE));
        };

        let outcome = match self.gateway.client().await {
            Ok(client) => {
                let key = IdempotencyKey::for_authorization(&order.code, source_id, amount);
                let request = CreatePaymentRequest {
                    source_id: source_id.to_string(),
                    idempotency_key: key.as_str().to_string(),
                    amount_money: Money::new(amount, &order.currency_code),
                    autocomplete: false,
                    location_id: client.location_id().to_string(),
                    reference_id: Some(order.code.clone()),
                    note: None,
                };

                self.call(
                    client.create_payment(request),
                    SquareOperation::CreatePayment,
                    &order.code,
                    Some(&key),
                    None,
                )
                .await
                .and_then(|response| required(response.payment, response.errors, "payment"))
            }
            Err(e) => Err(unless_config(e)?),
        };

        let result = match outcome {
            Ok(payment) if is_rejected(payment.status.as_deref()) => {
                let status = payment.status.as_deref().unwrap_or_default();
                CreatePaymentResult::declined(
                    amount,
                    format!("Square payment {} is {status}", payment.id),
                )
            }
            Ok(payment) => {
                CreatePaymentResult::authorized(amount, payment.id.clone(), authorization_metadata(&payment))
            }
            Err(e) => CreatePaymentResult::declined(amount, e.to_string()),
        };

        match &result.error_message {
            None => tracing::info!(
                order_code = %order.code,
                transaction_id = ?result.transaction_id,
                amount,
                elapsed_ms = elapsed_ms(started),
                "Square payment authorized"
            ),
            Some(error) => tracing::warn!(
                order_code = %order.code,
                amount,
                elapsed_ms = elapsed_ms(started),
                error = %error,
                "Square payment declined"
            ),
        }

        Ok(result)
    }

    async fn settle_payment(
        &self,
        order: &Order,
        payment: &PaymentRecord,
    ) -> payment_core::Result<SettlePaymentResult> {
        let started = Instant::now();

        let Some(payment_id) = payment.transaction_id() else {
            tracing::warn!(
                order_code = %order.code,
                elapsed_ms = elapsed_ms(started),
                "Cannot settle payment without a Square transaction id"
            );
            return Ok(SettlePaymentResult::failed(MISSING_TRANSACTION_MESSAGE, Metadata::new()));
        };

        let outcome = match self.gateway.client().await {
            Ok(client) => self
                .call(
                    client.complete_payment(payment_id),
                    SquareOperation::CompletePayment,
                    &order.code,
                    None,
                    Some(payment_id),
                )
                .await
                .and_then(|response| required(response.payment, response.errors, "payment")),
            Err(e) => Err(unless_config(e)?),
        };

        let result = match outcome {
            Ok(completed) => {
                let status = completed.status.as_deref();
                let metadata = status_metadata(status);
                if status == Some(STATUS_COMPLETED) {
                    SettlePaymentResult::settled(metadata)
                } else {
                    SettlePaymentResult::failed(
                        format!(
                            "Square payment {} was not completed (status: {})",
                            completed.id,
                            status.unwrap_or("none")
                        ),
                        metadata,
                    )
                }
            }
            Err(e) => SettlePaymentResult::failed(e.to_string(), Metadata::new()),
        };

        log_outcome(
            "Square payment settled",
            "Square settlement failed",
            &order.code,
            payment_id,
            result.error_message.as_deref(),
            started,
        );

        Ok(result)
    }

    async fn create_refund(
        &self,
        input: &RefundInput,
        amount: i64,
        order: &Order,
        payment: &PaymentRecord,
    ) -> payment_core::Result<CreateRefundResult> {
        let started = Instant::now();

        let Some(payment_id) = payment.transaction_id() else {
            tracing::warn!(
                order_code = %order.code,
                elapsed_ms = elapsed_ms(started),
                "Cannot refund payment without a Square transaction id"
            );
            return Ok(CreateRefundResult::failed(
                None,
                error_metadata(None, MISSING_TRANSACTION_MESSAGE),
            ));
        };

        // Two refunds of the same amount are only told apart by the host's id
        let Some(refund_id) = input.refund_id.as_deref().filter(|id| !id.trim().is_empty()) else {
            tracing::warn!(
                order_code = %order.code,
                transaction_id = %payment_id,
                elapsed_ms = elapsed_ms(started),
                "Cannot refund payment without a host refund id"
            );
            return Ok(CreateRefundResult::failed(
                None,
                error_metadata(None, MISSING_REFUND_ID_MESSAGE),
            ));
        };

        let key = IdempotencyKey::for_refund(payment_id, refund_id);
        let outcome = match self.gateway.client().await {
            Ok(client) => {
                let request = RefundPaymentRequest {
                    idempotency_key: key.as_str().to_string(),
                    payment_id: payment_id.to_string(),
                    amount_money: Money::new(amount, &order.currency_code),
                    reason: input.reason.clone().filter(|r| !r.trim().is_empty()),
                };

                self.call(
                    client.refund_payment(request),
                    SquareOperation::RefundPayment,
                    &order.code,
                    Some(&key),
                    Some(payment_id),
                )
                .await
                .and_then(|response| required(response.refund, response.errors, "refund"))
            }
            Err(e) => Err(unless_config(e)?),
        };

        let result = match outcome {
            Ok(refund) => {
                let status = refund.status.as_deref();
                if matches!(status, Some(STATUS_COMPLETED | STATUS_PENDING)) {
                    CreateRefundResult::settled(refund.id.clone(), status_metadata(status))
                } else {
                    let message = format!(
                        "Square refund {} was not accepted (status: {})",
                        refund.id,
                        status.unwrap_or("none")
                    );
                    CreateRefundResult::failed(Some(refund.id.clone()), error_metadata(status, &message))
                }
            }
            Err(e) => CreateRefundResult::failed(None, error_metadata(None, &e.to_string())),
        };

        log_outcome(
            "Square refund accepted",
            "Square refund failed",
            &order.code,
            payment_id,
            result.error_message(),
            started,
        );

        Ok(result)
    }

    async fn cancel_payment(
        &self,
        order: &Order,
        payment: &PaymentRecord,
    ) -> payment_core::Result<CancelPaymentResult> {
        let started = Instant::now();

        let Some(payment_id) = payment.transaction_id() else {
            tracing::warn!(
                order_code = %order.code,
                elapsed_ms = elapsed_ms(started),
                "Cannot cancel payment without a Square transaction id"
            );
            return Ok(CancelPaymentResult::failed(MISSING_TRANSACTION_MESSAGE, Metadata::new()));
        };

        let outcome = match self.gateway.client().await {
            Ok(client) => self
                .call(
                    client.cancel_payment(payment_id),
                    SquareOperation::CancelPayment,
                    &order.code,
                    None,
                    Some(payment_id),
                )
                .await
                .and_then(|response| required(response.payment, response.errors, "payment")),
            Err(e) => Err(unless_config(e)?),
        };

        let result = match outcome {
            Ok(cancelled) => {
                let status = cancelled.status.as_deref();
                if status == Some(STATUS_CANCELED) {
                    CancelPaymentResult::cancelled(status_metadata(status))
                } else {
                    CancelPaymentResult::failed(
                        format!(
                            "Square payment {} was not cancelled (status: {})",
                            cancelled.id,
                            status.unwrap_or("none")
                        ),
                        status_metadata(status),
                    )
                }
            }
            Err(e) => CancelPaymentResult::failed(e.to_string(), Metadata::new()),
        };

        log_outcome(
            "Square payment cancelled",
            "Square cancellation failed",
            &order.code,
            payment_id,
            result.error_message.as_deref(),
            started,
        );

        Ok(result)
    }
}

/// One-time card token from the storefront, `sourceId` first
fn payment_token(metadata: &Metadata) -> Option<&str> {
    TOKEN_KEYS
        .iter()
        .filter_map(|key| metadata.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|token| !token.is_empty())
}

/// Missing configuration goes back to the host; any other client failure
/// becomes the operation's failed result
fn unless_config(error: SquareError) -> payment_core::Result<SquareError> {
    match error {
        SquareError::Config(message) => Err(HandlerError::Config(message)),
        other => Ok(other),
    }
}

/// Unwrap the object a 2xx response should carry
fn required<T>(object: Option<T>, errors: Vec<ApiErrorDetail>, name: &'static str) -> Result<T> {
    match object {
        Some(object) => Ok(object),
        None if !errors.is_empty() => Err(SquareError::Api { status: 200, errors }),
        None => Err(SquareError::MissingObject(name)),
    }
}

/// Replaying a create for a voided or failed payment returns that payment
fn is_rejected(status: Option<&str>) -> bool {
    matches!(status, Some(STATUS_CANCELED | STATUS_FAILED))
}

fn authorization_metadata(payment: &Payment) -> Metadata {
    let mut metadata = Metadata::new();
    let fields = [
        ("status", &payment.status),
        ("receiptUrl", &payment.receipt_url),
        ("squareOrderId", &payment.order_id),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            metadata.insert(key.into(), Value::String(value.clone()));
        }
    }
    metadata
}

fn status_metadata(status: Option<&str>) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert(
        "status".into(),
        status.map_or(Value::Null, |s| Value::String(s.to_string())),
    );
    metadata
}

fn error_metadata(status: Option<&str>, message: &str) -> Metadata {
    let mut metadata = if status.is_some() {
        status_metadata(status)
    } else {
        Metadata::new()
    };
    metadata.insert("errorMessage".into(), Value::String(message.to_string()));
    metadata
}

fn log_outcome(
    success: &str,
    failure: &str,
    order_code: &str,
    payment_id: &str,
    error: Option<&str>,
    started: Instant,
) {
    match error {
        None => tracing::info!(
            order_code = %order_code,
            transaction_id = %payment_id,
            elapsed_ms = elapsed_ms(started),
            "{success}"
        ),
        Some(error) => tracing::warn!(
            order_code = %order_code,
            transaction_id = %payment_id,
            elapsed_ms = elapsed_ms(started),
            error = %error,
            "{failure}"
        ),
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
