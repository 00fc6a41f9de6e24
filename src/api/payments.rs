//! Razorpay order creation and payment verification endpoints

use crate::gateway::types::{Money, PaymentConfirmation};
use crate::gateway::PaymentGateway;
use crate::middleware::error::{get_request_id_from_headers, json_error_response};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};

#[derive(Clone)]
pub struct PaymentsState {
    pub gateway: Arc<dyn PaymentGateway>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub amount: Option<serde_json::Value>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub order: OrderBody,
}

#[derive(Debug, Serialize)]
pub struct OrderBody {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    #[serde(default)]
    pub razorpay_order_id: Option<String>,
    #[serde(default)]
    pub razorpay_payment_id: Option<String>,
    #[serde(default)]
    pub razorpay_signature: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub message: String,
}

/// POST /api/payments/orders
///
/// Creates a gateway order for the given major-unit amount and
/// currency. 201 with the order on success, 400 when either field is
/// missing or the amount is invalid, 500 when the gateway cannot be
/// reached.
pub async fn create_order(
    State(state): State<PaymentsState>,
    headers: HeaderMap,
    Json(body): Json<CreateOrderRequest>,
) -> Response {
    let request_id = get_request_id_from_headers(&headers);

    let (amount, currency) = match (amount_as_string(body.amount.as_ref()), non_empty(body.currency))
    {
        (Some(a), Some(c)) => (a, c),
        _ => {
            return json_error_response(
                StatusCode::BAD_REQUEST,
                "Missing required fields: amount, currency",
                request_id,
            )
            .into_response();
        }
    };

    let money = Money { amount, currency };

    match state.gateway.create_order(money).await {
        Ok(order) => (
            StatusCode::CREATED,
            Json(CreateOrderResponse {
                order: OrderBody {
                    id: order.id,
                    amount: order.amount,
                    currency: order.currency,
                    receipt: order.receipt,
                    status: order.status,
                },
            }),
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "order creation failed");
            let status = StatusCode::from_u16(e.http_status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            json_error_response(status, e.user_message(), request_id).into_response()
        }
    }
}

/// POST /api/payments/verify
///
/// Checks the HMAC signature returned by Razorpay checkout. The
/// response shape is fixed: 200 success, 400 with a reason, 500 when
/// the verifier itself cannot run.
pub async fn verify_payment(
    State(state): State<PaymentsState>,
    Json(body): Json<VerifyPaymentRequest>,
) -> Response {
    let (order_id, payment_id, signature) = match (
        non_empty(body.razorpay_order_id),
        non_empty(body.razorpay_payment_id),
        non_empty(body.razorpay_signature),
    ) {
        (Some(o), Some(p), Some(s)) => (o, p, s),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(VerifyPaymentResponse {
                    success: false,
                    message: "Missing required Razorpay fields".to_string(),
                }),
            )
                .into_response();
        }
    };

    let confirmation = PaymentConfirmation {
        razorpay_order_id: order_id,
        razorpay_payment_id: payment_id,
        razorpay_signature: signature,
    };

    match state.gateway.verify_payment(&confirmation) {
        Ok(verification) if verification.valid => (
            StatusCode::OK,
            Json(VerifyPaymentResponse {
                success: true,
                message: "Payment verified successfully".to_string(),
            }),
        )
            .into_response(),
        Ok(_) => (
            StatusCode::BAD_REQUEST,
            Json(VerifyPaymentResponse {
                success: false,
                message: "Invalid signature".to_string(),
            }),
        )
            .into_response(),
        // The fields were validated above; an error here means the
        // verifier itself is unusable, e.g. no signing secret.
        Err(e) => {
            error!(error = %e, "payment verifier failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(VerifyPaymentResponse {
                    success: false,
                    message: "Payment verification unavailable".to_string(),
                }),
            )
                .into_response()
        }
    }
}

fn amount_as_string(value: Option<&serde_json::Value>) -> Option<String> {
    match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
