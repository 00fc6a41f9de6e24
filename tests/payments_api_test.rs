//! Integration tests for the payment order and verification endpoints

use async_trait::async_trait;
use axum::{body::Body, routing::post, Router};
use http::{Request, StatusCode};
use rideline_backend::api::payments::{create_order, verify_payment, PaymentsState};
use rideline_backend::gateway::error::GatewayResult;
use rideline_backend::gateway::signature::{compute_signature, verify_signature};
use rideline_backend::gateway::types::{
    Money, OrderDescriptor, PaymentConfirmation, SignatureVerification,
};
use rideline_backend::gateway::{GatewayError, PaymentGateway};
use std::sync::Arc;
use tower::util::ServiceExt;

const SECRET: &str = "test_secret";

struct StubGateway {
    fail_order: bool,
    // Simulates a gateway with no usable signing secret.
    secret: &'static str,
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn create_order(&self, amount: Money) -> GatewayResult<OrderDescriptor> {
        if self.fail_order {
            return Err(GatewayError::GatewayError {
                message: "upstream down".to_string(),
                gateway_code: None,
                retryable: true,
            });
        }
        let major = amount.validate_positive("amount")?;
        let minor = rideline_backend::gateway::types::to_minor_units(&major)?;
        Ok(OrderDescriptor {
            id: "order_stub_1".to_string(),
            amount: minor,
            currency: amount.currency,
            receipt: "receipt_order_1".to_string(),
            status: "created".to_string(),
        })
    }

    fn verify_payment(
        &self,
        confirmation: &PaymentConfirmation,
    ) -> GatewayResult<SignatureVerification> {
        let valid = verify_signature(
            &confirmation.razorpay_order_id,
            &confirmation.razorpay_payment_id,
            &confirmation.razorpay_signature,
            self.secret,
        )?;
        Ok(SignatureVerification {
            valid,
            reason: if valid {
                None
            } else {
                Some("Invalid signature".to_string())
            },
        })
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

fn app(fail_order: bool) -> Router {
    app_with_secret(fail_order, SECRET)
}

fn app_with_secret(fail_order: bool, secret: &'static str) -> Router {
    Router::new()
        .route("/api/payments/orders", post(create_order))
        .route("/api/payments/verify", post(verify_payment))
        .with_state(PaymentsState {
            gateway: Arc::new(StubGateway { fail_order, secret }),
        })
}

fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn create_order_returns_created_order() {
    let response = app(false)
        .oneshot(json_request(
            "/api/payments/orders",
            serde_json::json!({ "amount": "25.50", "currency": "INR" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["order"]["id"], "order_stub_1");
    assert_eq!(json["order"]["amount"], 2550);
    assert_eq!(json["order"]["currency"], "INR");
}

#[tokio::test]
async fn create_order_accepts_numeric_amount() {
    let response = app(false)
        .oneshot(json_request(
            "/api/payments/orders",
            serde_json::json!({ "amount": 100, "currency": "INR" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["order"]["amount"], 10000);
}

#[tokio::test]
async fn create_order_without_amount_is_bad_request() {
    let response = app(false)
        .oneshot(json_request(
            "/api/payments/orders",
            serde_json::json!({ "currency": "INR" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(
        json["details"]["message"],
        "Missing required fields: amount, currency"
    );
}

#[tokio::test]
async fn create_order_without_currency_is_bad_request() {
    let response = app(false)
        .oneshot(json_request(
            "/api/payments/orders",
            serde_json::json!({ "amount": "25.50" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(
        json["details"]["message"],
        "Missing required fields: amount, currency"
    );
}

#[tokio::test]
async fn create_order_with_blank_currency_is_bad_request() {
    let response = app(false)
        .oneshot(json_request(
            "/api/payments/orders",
            serde_json::json!({ "amount": "25.50", "currency": "  " }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_order_gateway_failure_is_internal_error() {
    let response = app(true)
        .oneshot(json_request(
            "/api/payments/orders",
            serde_json::json!({ "amount": "25.50", "currency": "INR" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn verify_accepts_valid_signature() {
    let signature = compute_signature("order_stub_1", "pay_1", SECRET);
    let response = app(false)
        .oneshot(json_request(
            "/api/payments/verify",
            serde_json::json!({
                "razorpay_order_id": "order_stub_1",
                "razorpay_payment_id": "pay_1",
                "razorpay_signature": signature,
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Payment verified successfully");
}

#[tokio::test]
async fn verify_rejects_tampered_signature() {
    let mut signature = compute_signature("order_stub_1", "pay_1", SECRET);
    // Flip the last hex digit.
    let last = signature.pop().unwrap();
    signature.push(if last == '0' { '1' } else { '0' });

    let response = app(false)
        .oneshot(json_request(
            "/api/payments/verify",
            serde_json::json!({
                "razorpay_order_id": "order_stub_1",
                "razorpay_payment_id": "pay_1",
                "razorpay_signature": signature,
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Invalid signature");
}

#[tokio::test]
async fn verify_with_missing_fields_is_bad_request() {
    let response = app(false)
        .oneshot(json_request(
            "/api/payments/verify",
            serde_json::json!({ "razorpay_order_id": "order_stub_1" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Missing required Razorpay fields");
}

#[tokio::test]
async fn verify_with_unconfigured_secret_is_internal_error() {
    let signature = compute_signature("order_stub_1", "pay_1", SECRET);
    let response = app_with_secret(false, "")
        .oneshot(json_request(
            "/api/payments/verify",
            serde_json::json!({
                "razorpay_order_id": "order_stub_1",
                "razorpay_payment_id": "pay_1",
                "razorpay_signature": signature,
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Payment verification unavailable");
}

#[tokio::test]
async fn verify_with_empty_signature_is_bad_request() {
    let response = app(false)
        .oneshot(json_request(
            "/api/payments/verify",
            serde_json::json!({
                "razorpay_order_id": "order_stub_1",
                "razorpay_payment_id": "pay_1",
                "razorpay_signature": "",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Missing required Razorpay fields");
}
