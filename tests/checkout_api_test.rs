//! Integration tests for the checkout orchestration endpoints

use async_trait::async_trait;
use axum::{body::Body, routing::post, Router};
use bigdecimal::BigDecimal;
use http::{Request, StatusCode};
use rideline_backend::api::checkout::{
    begin_checkout, cancel_checkout, complete_checkout, CheckoutApiState,
};
use rideline_backend::database::error::DatabaseError;
use rideline_backend::database::ride_repository::{NewRide, Ride};
use rideline_backend::gateway::error::GatewayResult;
use rideline_backend::gateway::signature::{compute_signature, verify_signature};
use rideline_backend::gateway::types::{
    Money, OrderDescriptor, PaymentConfirmation, SignatureVerification,
};
use rideline_backend::gateway::PaymentGateway;
use rideline_backend::services::{CheckoutOrchestrator, CheckoutTimeouts, RideSink};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tower::util::ServiceExt;

const SECRET: &str = "test_secret";

struct StubGateway;

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn create_order(&self, amount: Money) -> GatewayResult<OrderDescriptor> {
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
            SECRET,
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

struct StubSink {
    fail: AtomicBool,
}

#[async_trait]
impl RideSink for StubSink {
    async fn record_ride(&self, ride: &NewRide) -> Result<Ride, DatabaseError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DatabaseError::from_sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(Ride {
            ride_id: uuid::Uuid::new_v4(),
            origin_address: ride.origin_address.clone(),
            destination_address: ride.destination_address.clone(),
            origin_latitude: ride.origin_latitude.clone(),
            origin_longitude: ride.origin_longitude.clone(),
            destination_latitude: ride.destination_latitude.clone(),
            destination_longitude: ride.destination_longitude.clone(),
            ride_time: ride.ride_time,
            fare_price: ride.fare_price.clone(),
            status: ride.status.clone(),
            payment_status: ride.payment_status.clone(),
            driver_id: ride.driver_id,
            user_id: ride.user_id.clone(),
            created_at: chrono::Utc::now(),
        })
    }
}

fn app(fail_persist: bool) -> Router {
    let orchestrator = Arc::new(CheckoutOrchestrator::new(
        Arc::new(StubGateway),
        Arc::new(StubSink {
            fail: AtomicBool::new(fail_persist),
        }),
        CheckoutTimeouts::default(),
    ));

    Router::new()
        .route("/api/checkout", post(begin_checkout))
        .route("/api/checkout/complete", post(complete_checkout))
        .route("/api/checkout/cancel", post(cancel_checkout))
        .with_state(CheckoutApiState { orchestrator })
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

fn ride_body() -> serde_json::Value {
    serde_json::json!({
        "origin_address": "MG Road",
        "destination_address": "Airport",
        "origin_latitude": "12.9716",
        "origin_longitude": "77.5946",
        "destination_latitude": "13.1986",
        "destination_longitude": "77.7066",
        "ride_time": 45,
        "fare_price": "25.50",
        "payment_status": "paid",
        "driver_id": 1,
        "user_id": "user_1",
    })
}

fn complete_body(valid_signature: bool) -> serde_json::Value {
    let signature = if valid_signature {
        compute_signature("order_stub_1", "pay_1", SECRET)
    } else {
        "0".repeat(64)
    };
    serde_json::json!({
        "user_id": "user_1",
        "razorpay_order_id": "order_stub_1",
        "razorpay_payment_id": "pay_1",
        "razorpay_signature": signature,
        "ride": ride_body(),
    })
}

#[tokio::test]
async fn full_checkout_flow_records_ride() {
    let app = app(false);

    let begin = app
        .clone()
        .oneshot(json_request(
            "/api/checkout",
            serde_json::json!({ "user_id": "user_1", "amount": "25.50", "currency": "INR" }),
        ))
        .await
        .unwrap();
    assert_eq!(begin.status(), StatusCode::CREATED);
    let begin_json = body_json(begin).await;
    assert_eq!(begin_json["order_id"], "order_stub_1");
    assert_eq!(begin_json["amount"], 2550);

    let complete = app
        .oneshot(json_request("/api/checkout/complete", complete_body(true)))
        .await
        .unwrap();
    assert_eq!(complete.status(), StatusCode::CREATED);
    let complete_json = body_json(complete).await;
    assert_eq!(complete_json["payment_status"], "paid");
    assert_eq!(
        complete_json["fare_price"],
        BigDecimal::from_str("25.50").unwrap().to_string()
    );
}

#[tokio::test]
async fn begin_without_currency_is_bad_request() {
    let response = app(false)
        .oneshot(json_request(
            "/api/checkout",
            serde_json::json!({ "user_id": "user_1", "amount": "25.50" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn second_begin_for_same_user_conflicts() {
    let app = app(false);

    let first = app
        .clone()
        .oneshot(json_request(
            "/api/checkout",
            serde_json::json!({ "user_id": "user_1", "amount": "25.50", "currency": "INR" }),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .oneshot(json_request(
            "/api/checkout",
            serde_json::json!({ "user_id": "user_1", "amount": "25.50", "currency": "INR" }),
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let json = body_json(second).await;
    assert_eq!(json["error"], "CHECKOUT_IN_PROGRESS");
}

#[tokio::test]
async fn invalid_signature_rejects_checkout() {
    let app = app(false);

    app.clone()
        .oneshot(json_request(
            "/api/checkout",
            serde_json::json!({ "user_id": "user_1", "amount": "25.50", "currency": "INR" }),
        ))
        .await
        .unwrap();

    let complete = app
        .oneshot(json_request("/api/checkout/complete", complete_body(false)))
        .await
        .unwrap();
    assert_eq!(complete.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn persist_failure_surfaces_payment_unrecorded() {
    let app = app(true);

    app.clone()
        .oneshot(json_request(
            "/api/checkout",
            serde_json::json!({ "user_id": "user_1", "amount": "25.50", "currency": "INR" }),
        ))
        .await
        .unwrap();

    let complete = app
        .oneshot(json_request("/api/checkout/complete", complete_body(true)))
        .await
        .unwrap();
    assert_eq!(complete.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(complete).await;
    assert_eq!(json["error"], "PAYMENT_UNRECORDED");
}

#[tokio::test]
async fn cancel_frees_the_user_slot() {
    let app = app(false);

    app.clone()
        .oneshot(json_request(
            "/api/checkout",
            serde_json::json!({ "user_id": "user_1", "amount": "25.50", "currency": "INR" }),
        ))
        .await
        .unwrap();

    let cancel = app
        .clone()
        .oneshot(json_request(
            "/api/checkout/cancel",
            serde_json::json!({ "user_id": "user_1" }),
        ))
        .await
        .unwrap();
    assert_eq!(cancel.status(), StatusCode::OK);
    let json = body_json(cancel).await;
    assert_eq!(json["state"], "failed");

    let again = app
        .oneshot(json_request(
            "/api/checkout",
            serde_json::json!({ "user_id": "user_1", "amount": "25.50", "currency": "INR" }),
        ))
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::CREATED);
}
