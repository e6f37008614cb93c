//! Square Payments API wire types
//!
//! Only the fields this handler sends or reads are modelled; Square adds
//! fields freely, so every response field is optional.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Amount in the smallest currency unit
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: i64,
    pub currency: String,
}

impl Money {
    pub fn new(amount: i64, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }
}

/// `POST /v2/payments`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CreatePaymentRequest {
    pub source_id: String,
    pub idempotency_key: String,
    pub amount_money: Money,
    /// `false` authorizes only; capture happens through `complete`
    pub autocomplete: bool,
    pub location_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// `POST /v2/refunds`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RefundPaymentRequest {
    pub idempotency_key: String,
    pub payment_id: String,
    pub amount_money: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Payment object
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Payment {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub amount_money: Option<Money>,
    #[serde(default)]
    pub receipt_url: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Refund object
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct PaymentRefund {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub amount_money: Option<Money>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Response of the create/complete/cancel payment endpoints
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PaymentResponse {
    #[serde(default)]
    pub payment: Option<Payment>,
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

/// Response of the refund endpoint
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RefundResponse {
    #[serde(default)]
    pub refund: Option<PaymentRefund>,
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

/// Body of a non-2xx response
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

/// One entry of Square's `errors` array
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub category: String,
    pub code: String,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
}

impl fmt::Display for ApiErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}: {}", self.code, detail),
            None => f.write_str(&self.code),
        }
    }
}
