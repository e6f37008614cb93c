//! Square REST Client
//!
//! `SquareApi` is the seam the handler talks through. `SquareClient` is the
//! reqwest implementation against the Square Payments API.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::api::{
    CreatePaymentRequest, ErrorResponse, PaymentResponse, RefundPaymentRequest, RefundResponse,
};
use crate::config::SquareCredentials;
use crate::error::{Result, SquareError};

/// Square API version sent with every request
pub const SQUARE_VERSION: &str = "2024-10-17";

/// Outbound calls the payment handler makes against Square
///
/// Every method is a single attempt: no retries, no backoff.
#[async_trait]
pub trait SquareApi: Send + Sync {
    /// Location payments are taken for
    fn location_id(&self) -> &str;

    /// Create (authorize) a payment
    async fn create_payment(&self, request: CreatePaymentRequest) -> Result<PaymentResponse>;

    /// Capture an authorized payment
    async fn complete_payment(&self, payment_id: &str) -> Result<PaymentResponse>;

    /// Void an authorized payment
    async fn cancel_payment(&self, payment_id: &str) -> Result<PaymentResponse>;

    /// Refund a payment
    async fn refund_payment(&self, request: RefundPaymentRequest) -> Result<RefundResponse>;

    /// Void whatever payment a create request with `idempotency_key` produced
    ///
    /// Used when a create timed out and its outcome is unknown.
    async fn cancel_payment_by_idempotency_key(&self, idempotency_key: &str) -> Result<()>;
}

/// reqwest-backed Square client
pub struct SquareClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
    location_id: String,
}

impl SquareClient {
    /// Create a client for the credentials' environment
    pub fn new(credentials: &SquareCredentials) -> Result<Self> {
        Self::with_base_url(credentials, credentials.environment.base_url())
    }

    /// Create a client against an explicit base URL
    pub fn with_base_url(credentials: &SquareCredentials, base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: credentials.access_token.clone(),
            location_id: credentials.location_id.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(url = %url, "Sending Square request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .header("Square-Version", SQUARE_VERSION)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            // Square always sends an `errors` array, but a proxy in between may not
            let errors = serde_json::from_slice::<ErrorResponse>(&bytes)
                .map(|body| body.errors)
                .unwrap_or_default();
            return Err(SquareError::Api {
                status: status.as_u16(),
                errors,
            });
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl SquareApi for SquareClient {
    fn location_id(&self) -> &str {
        &self.location_id
    }

    async fn create_payment(&self, request: CreatePaymentRequest) -> Result<PaymentResponse> {
        self.post("/v2/payments", &request).await
    }

    async fn complete_payment(&self, payment_id: &str) -> Result<PaymentResponse> {
        self.post(
            &format!("/v2/payments/{payment_id}/complete"),
            &serde_json::json!({}),
        )
        .await
    }

    async fn cancel_payment(&self, payment_id: &str) -> Result<PaymentResponse> {
        self.post(
            &format!("/v2/payments/{payment_id}/cancel"),
            &serde_json::json!({}),
        )
        .await
    }

    async fn refund_payment(&self, request: RefundPaymentRequest) -> Result<RefundResponse> {
        self.post("/v2/refunds", &request).await
    }

    async fn cancel_payment_by_idempotency_key(&self, idempotency_key: &str) -> Result<()> {
        let _: ErrorResponse = self
            .post(
                "/v2/payments/cancel",
                &serde_json::json!({ "idempotency_key": idempotency_key }),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Money;
    use crate::config::SquareEnvironment;
    use httpmock::prelude::*;
    use serde_json::json;

    fn credentials() -> SquareCredentials {
        SquareCredentials::new("tok", SquareEnvironment::Sandbox, "L1")
    }

    fn client_for(server: &MockServer) -> SquareClient {
        SquareClient::with_base_url(&credentials(), server.base_url()).unwrap()
    }

    #[test]
    fn test_environment_selects_base_url() {
        let sandbox = SquareClient::new(&credentials()).unwrap();
        assert_eq!(sandbox.base_url(), "https://connect.squareupsandbox.com");

        let production = SquareClient::new(&SquareCredentials::new(
            "tok",
            SquareEnvironment::Production,
            "L1",
        ))
        .unwrap();
        assert_eq!(production.base_url(), "https://connect.squareup.com");
        assert_eq!(production.location_id(), "L1");
    }

    #[tokio::test]
    async fn test_create_payment_sends_authorize_only_request() {
        let server = MockServer::start_async().await;

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v2/payments")
                    .header("authorization", "Bearer tok")
                    .header("square-version", SQUARE_VERSION)
                    .json_body(json!({
                        "source_id": "cnon:card",
                        "idempotency_key": "ORD1-create",
                        "amount_money": { "amount": 1000, "currency": "USD" },
                        "autocomplete": false,
                        "location_id": "L1",
                        "reference_id": "ORD1"
                    }));
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "payment": { "id": "pay_1", "status": "AUTHORIZED" }
                    }));
            })
            .await;

        let response = client_for(&server)
            .create_payment(CreatePaymentRequest {
                source_id: "cnon:card".into(),
                idempotency_key: "ORD1-create".into(),
                amount_money: Money::new(1000, "USD"),
                autocomplete: false,
                location_id: "L1".into(),
                reference_id: Some("ORD1".into()),
                note: None,
            })
            .await
            .unwrap();

        let payment = response.payment.unwrap();
        assert_eq!(payment.id, "pay_1");
        assert_eq!(payment.status.as_deref(), Some("AUTHORIZED"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_payment_path() {
        let server = MockServer::start_async().await;

        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v2/payments/pay_1/complete");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "payment": { "id": "pay_1", "status": "COMPLETED" }
                    }));
            })
            .await;

        let response = client_for(&server).complete_payment("pay_1").await.unwrap();
        assert_eq!(
            response.payment.unwrap().status.as_deref(),
            Some("COMPLETED")
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_refund_payment() {
        let server = MockServer::start_async().await;

        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v2/refunds").json_body(json!({
                    "idempotency_key": "pay_1-refund-500",
                    "payment_id": "pay_1",
                    "amount_money": { "amount": 500, "currency": "USD" },
                    "reason": "damaged"
                }));
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "refund": { "id": "ref_1", "status": "PENDING", "payment_id": "pay_1" }
                    }));
            })
            .await;

        let response = client_for(&server)
            .refund_payment(RefundPaymentRequest {
                idempotency_key: "pay_1-refund-500".into(),
                payment_id: "pay_1".into(),
                amount_money: Money::new(500, "USD"),
                reason: Some("damaged".into()),
            })
            .await
            .unwrap();

        let refund = response.refund.unwrap();
        assert_eq!(refund.id, "ref_1");
        assert_eq!(refund.status.as_deref(), Some("PENDING"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_cancel_by_idempotency_key() {
        let server = MockServer::start_async().await;

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v2/payments/cancel")
                    .json_body(json!({ "idempotency_key": "ORD1-create" }));
                then.status(200)
                    .header("content-type", "application/json")
                    .body("{}");
            })
            .await;

        client_for(&server)
            .cancel_payment_by_idempotency_key("ORD1-create")
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_response_is_decoded() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(POST).path("/v2/payments/pay_9/complete");
                then.status(400)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "errors": [{
                            "category": "INVALID_REQUEST_ERROR",
                            "code": "BAD_REQUEST",
                            "detail": "Payment is already completed."
                        }]
                    }));
            })
            .await;

        let err = client_for(&server)
            .complete_payment("pay_9")
            .await
            .unwrap_err();

        match err {
            SquareError::Api { status, errors } => {
                assert_eq!(status, 400);
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].code, "BAD_REQUEST");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_response_without_body() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(POST).path("/v2/payments/pay_1/cancel");
                then.status(502).body("Bad Gateway");
            })
            .await;

        let err = client_for(&server).cancel_payment("pay_1").await.unwrap_err();
        assert!(matches!(err, SquareError::Api { status: 502, ref errors } if errors.is_empty()));
        assert!(err.is_retryable());
    }
}
