//! Recording Square stub for handler and gateway tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::api::{
    ApiErrorDetail, CreatePaymentRequest, PaymentResponse, RefundPaymentRequest, RefundResponse,
};
use crate::client::SquareApi;
use crate::config::{SquareCredentials, SquareEnvironment};
use crate::error::{Result, SquareError};
use crate::gateway::{ClientFactory, SquareGateway};

/// A request the stub received
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedCall {
    CreatePayment(CreatePaymentRequest),
    CompletePayment(String),
    CancelPayment(String),
    RefundPayment(RefundPaymentRequest),
    CancelByIdempotencyKey(String),
}

/// What the stub answers with
#[derive(Clone, Debug)]
pub enum StubReply {
    /// Decoded into the endpoint's response type
    Json(Value),
    /// Non-2xx answer carrying one Square error code
    ApiError { status: u16, code: String },
    /// Never answers
    Hang,
}

pub struct StubSquareApi {
    location_id: String,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    reply: Arc<Mutex<StubReply>>,
}

impl Default for StubSquareApi {
    fn default() -> Self {
        Self::replying(StubReply::Json(json!({})))
    }
}

impl StubSquareApi {
    pub fn replying(reply: StubReply) -> Self {
        Self {
            location_id: "L1".into(),
            calls: Arc::new(Mutex::new(Vec::new())),
            reply: Arc::new(Mutex::new(reply)),
        }
    }

    pub fn replying_json(body: Value) -> Self {
        Self::replying(StubReply::Json(body))
    }

    /// Stub sharing this one's call log and reply, for another location
    pub fn for_location(&self, location_id: &str) -> Self {
        Self {
            location_id: location_id.to_string(),
            calls: Arc::clone(&self.calls),
            reply: Arc::clone(&self.reply),
        }
    }

    pub fn set_reply(&self, reply: StubReply) {
        *self.reply.lock().unwrap() = reply;
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    async fn answer<R: DeserializeOwned>(&self, call: RecordedCall) -> Result<R> {
        self.calls.lock().unwrap().push(call);
        let reply = self.reply.lock().unwrap().clone();

        match reply {
            StubReply::Json(body) => Ok(serde_json::from_value(body)?),
            StubReply::ApiError { status, code } => Err(SquareError::Api {
                status,
                errors: vec![ApiErrorDetail {
                    category: "PAYMENT_METHOD_ERROR".into(),
                    code,
                    detail: None,
                    field: None,
                }],
            }),
            StubReply::Hang => {
                std::future::pending::<()>().await;
                Err(SquareError::MissingObject("reply"))
            }
        }
    }
}

#[async_trait]
impl SquareApi for StubSquareApi {
    fn location_id(&self) -> &str {
        &self.location_id
    }

    async fn create_payment(&self, request: CreatePaymentRequest) -> Result<PaymentResponse> {
        self.answer(RecordedCall::CreatePayment(request)).await
    }

    async fn complete_payment(&self, payment_id: &str) -> Result<PaymentResponse> {
        self.answer(RecordedCall::CompletePayment(payment_id.to_string()))
            .await
    }

    async fn cancel_payment(&self, payment_id: &str) -> Result<PaymentResponse> {
        self.answer(RecordedCall::CancelPayment(payment_id.to_string()))
            .await
    }

    async fn refund_payment(&self, request: RefundPaymentRequest) -> Result<RefundResponse> {
        self.answer(RecordedCall::RefundPayment(request)).await
    }

    async fn cancel_payment_by_idempotency_key(&self, idempotency_key: &str) -> Result<()> {
        let _: Value = self
            .answer(RecordedCall::CancelByIdempotencyKey(
                idempotency_key.to_string(),
            ))
            .await?;
        Ok(())
    }
}

/// Factory handing out one shared stub
pub struct StubFactory(pub Arc<StubSquareApi>);

impl ClientFactory for StubFactory {
    fn build(&self, _credentials: &SquareCredentials) -> Result<Arc<dyn SquareApi>> {
        Ok(Arc::clone(&self.0) as Arc<dyn SquareApi>)
    }
}

/// Gateway initialized with sandbox credentials, serving `stub`
pub async fn configured_gateway(stub: &Arc<StubSquareApi>) -> Arc<SquareGateway> {
    let gateway = Arc::new(SquareGateway::with_factory(StubFactory(Arc::clone(stub))));
    gateway
        .init(SquareCredentials::new("tok", SquareEnvironment::Sandbox, "L1"))
        .await;
    gateway
}
