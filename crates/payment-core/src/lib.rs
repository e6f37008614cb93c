//! # payment-core
//!
//! The payment-method handler contract a host e-commerce platform expects
//! from its payment plugins.
//!
//! ## Lifecycle
//!
//! ```text
//! ┌────────────┐  settle   ┌───────────┐
//! │ Authorized │──────────▶│  Settled  │
//! └────────────┘           └───────────┘
//!       │  refund          ┌───────────┐
//!       ├─────────────────▶│ Refunded  │
//!       │                  │ / Failed  │
//!       │  cancel          └───────────┘
//!       └─────────────────▶ Cancelled
//! ```
//!
//! The host owns the state machine and decides which transition to call.
//! A handler only supplies the transition functions and reports the outcome
//! as a typed result; it never mutates the order itself.

pub mod error;
pub mod handler;
pub mod model;

pub use error::{HandlerError, Result};
pub use handler::PaymentMethodHandler;
pub use model::{
    CancelPaymentResult, CreatePaymentResult, CreateRefundResult, Metadata, Order, PaymentRecord,
    PaymentState, RefundInput, RefundState, SettlePaymentResult,
};
