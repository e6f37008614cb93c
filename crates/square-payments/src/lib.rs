//! # square-payments
//!
//! Square payment-method handler for the host e-commerce platform.
//!
//! ## Call flow
//!
//! ```text
//! ┌──────────┐   ┌─────────────────────┐   ┌───────────────┐   ┌──────────┐
//! │   Host   │──▶│ SquarePaymentHandler│──▶│ SquareGateway │──▶│  Square  │
//! │ platform │◀──│  (result mapping)   │   │ (client cache)│   │ REST API │
//! └──────────┘   └─────────────────────┘   └───────────────┘   └──────────┘
//!                          │ with_timeout (30s default)               ▲
//!                          └──────────────────────────────────────────┘
//! ```
//!
//! Each lifecycle call is exactly one Square request:
//!
//! | Host call        | Square endpoint                    | Success            |
//! |------------------|------------------------------------|--------------------|
//! | `create_payment` | `POST /v2/payments` (no autocomplete) | payment returned |
//! | `settle_payment` | `POST /v2/payments/{id}/complete`  | `COMPLETED`        |
//! | `create_refund`  | `POST /v2/refunds`                 | `COMPLETED`/`PENDING` |
//! | `cancel_payment` | `POST /v2/payments/{id}/cancel`    | `CANCELED`         |
//!
//! Nothing is retried. Idempotency keys are derived from stable identifiers
//! so a host-level retry reuses the key and Square deduplicates it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use square_payments::{SquareCredentials, SquareEnvironment, SquarePlugin};
//!
//! let plugin = SquarePlugin::new();
//! plugin.init(SquareCredentials::new("EAAA...", SquareEnvironment::Sandbox, "L1")).await;
//!
//! // Register with the host
//! registry.register(plugin.handler());
//! ```

mod api;
mod client;
mod config;
mod error;
mod gateway;
mod handler;
mod idempotency;
mod plugin;
mod reconcile;
mod timeout;

#[cfg(test)]
mod testing;

pub use api::{
    ApiErrorDetail, CreatePaymentRequest, Money, Payment, PaymentRefund, PaymentResponse,
    RefundPaymentRequest, RefundResponse,
};
pub use client::{SQUARE_VERSION, SquareApi, SquareClient};
pub use config::{SquareCredentials, SquareEnvironment};
pub use error::{Result, SquareError};
pub use gateway::{ClientFactory, HttpClientFactory, SquareGateway};
pub use handler::{HANDLER_CODE, HANDLER_DESCRIPTION, SquarePaymentHandler};
pub use idempotency::IdempotencyKey;
pub use plugin::{SquarePlugin, SquarePluginBuilder};
pub use reconcile::{CancelTimedOutAuthorizations, ReconciliationHook, SquareOperation, TimedOutCall};
pub use timeout::{DEFAULT_TIMEOUT, with_timeout};
