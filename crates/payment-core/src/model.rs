//! Host Payment Model
//!
//! Transient DTOs passed between the host platform and a payment handler.
//! Nothing here is persisted by the handler.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Free-form key/value data attached to a payment, opaque to the host
pub type Metadata = serde_json::Map<String, Value>;

/// Order reference (host-owned, read-only for handlers)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Human-facing order code
    pub code: String,

    /// Order total in minor units
    pub total: i64,

    /// ISO 4217 currency code
    pub currency_code: String,
}

impl Order {
    pub fn new(code: impl Into<String>, total: i64, currency_code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            total,
            currency_code: currency_code.into(),
        }
    }
}

/// A payment previously recorded by the host
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    /// Host-side payment id
    #[serde(default)]
    pub id: Option<String>,

    /// Amount in minor units
    #[serde(default)]
    pub amount: i64,

    /// Processor transaction id returned when the payment was created
    #[serde(default)]
    pub transaction_id: Option<String>,

    /// Metadata returned when the payment was created
    #[serde(default)]
    pub metadata: Metadata,
}

impl PaymentRecord {
    /// Record for an authorized processor transaction
    pub fn with_transaction(transaction_id: impl Into<String>, amount: i64) -> Self {
        Self {
            transaction_id: Some(transaction_id.into()),
            amount,
            ..Default::default()
        }
    }

    /// Transaction id, treating an empty string as absent
    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Refund request issued by the host
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundInput {
    /// Host-side refund id, stable across retries of the same refund.
    /// Processors that deduplicate refunds by it may reject a refund without one.
    #[serde(default)]
    pub refund_id: Option<String>,

    /// Reason shown to the processor
    #[serde(default)]
    pub reason: Option<String>,

    /// Amount in minor units
    #[serde(default)]
    pub amount: i64,
}

/// Outcome of an authorization
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentState {
    Authorized,
    Declined,
}

/// Outcome of a refund
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefundState {
    Settled,
    Failed,
}

/// Result of `create_payment`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResult {
    pub amount: i64,
    pub state: PaymentState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl CreatePaymentResult {
    pub fn authorized(amount: i64, transaction_id: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            amount,
            state: PaymentState::Authorized,
            transaction_id: Some(transaction_id.into()),
            error_message: None,
            metadata,
        }
    }

    pub fn declined(amount: i64, message: impl Into<String>) -> Self {
        Self {
            amount,
            state: PaymentState::Declined,
            transaction_id: None,
            error_message: Some(message.into()),
            metadata: Metadata::new(),
        }
    }

    pub fn is_authorized(&self) -> bool {
        self.state == PaymentState::Authorized
    }
}

/// Result of `settle_payment`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlePaymentResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl SettlePaymentResult {
    pub const fn settled(metadata: Metadata) -> Self {
        Self {
            success: true,
            error_message: None,
            metadata,
        }
    }

    pub fn failed(message: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
            metadata,
        }
    }
}

/// Result of `create_refund`
///
/// Failure detail (`status`, `errorMessage`) travels in `metadata`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRefundResult {
    pub state: RefundState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl CreateRefundResult {
    pub fn settled(transaction_id: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            state: RefundState::Settled,
            transaction_id: Some(transaction_id.into()),
            metadata,
        }
    }

    pub const fn failed(transaction_id: Option<String>, metadata: Metadata) -> Self {
        Self {
            state: RefundState::Failed,
            transaction_id,
            metadata,
        }
    }

    /// Failure message, if one was recorded
    pub fn error_message(&self) -> Option<&str> {
        self.metadata.get("errorMessage").and_then(Value::as_str)
    }
}

/// Result of `cancel_payment`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelPaymentResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl CancelPaymentResult {
    pub const fn cancelled(metadata: Metadata) -> Self {
        Self {
            success: true,
            error_message: None,
            metadata,
        }
    }

    pub fn failed(message: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
            metadata,
        }
    }
}
