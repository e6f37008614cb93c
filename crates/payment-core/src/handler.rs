//! Payment Method Handler Strategy
//!
//! The contract the host platform routes payment lifecycle calls through.
//! Each processor integration implements this trait; the host works
//! exclusively through it.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{
    CancelPaymentResult, CreatePaymentResult, CreateRefundResult, Metadata, Order, PaymentRecord,
    RefundInput, SettlePaymentResult,
};

/// Strategy trait for payment processors
///
/// Declines and processor failures are reported through the result types.
/// An `Err` is reserved for faults the host must handle itself, such as a
/// handler that was never configured.
#[async_trait]
pub trait PaymentMethodHandler: Send + Sync {
    /// Stable code identifying the handler in the host's registry
    fn code(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    /// Authorize `amount` (minor units) against the payment method in `metadata`
    async fn create_payment(
        &self,
        order: &Order,
        amount: i64,
        metadata: &Metadata,
    ) -> Result<CreatePaymentResult>;

    /// Capture a previously authorized payment
    async fn settle_payment(
        &self,
        order: &Order,
        payment: &PaymentRecord,
    ) -> Result<SettlePaymentResult>;

    /// Refund `amount` (minor units) of a payment
    async fn create_refund(
        &self,
        input: &RefundInput,
        amount: i64,
        order: &Order,
        payment: &PaymentRecord,
    ) -> Result<CreateRefundResult>;

    /// Void an uncaptured authorization
    ///
    /// Handlers that cannot void report a failure without contacting anyone.
    async fn cancel_payment(
        &self,
        _order: &Order,
        _payment: &PaymentRecord,
    ) -> Result<CancelPaymentResult> {
        Ok(CancelPaymentResult::failed(
            format!("Payment handler '{}' does not support cancellation", self.code()),
            Metadata::new(),
        ))
    }
}
