//! Checkout orchestration endpoints
//!
//! Drives the full order -> verify -> record flow server-side so a
//! client only reports the gateway's confirmation fields.

use crate::api::rides::{CreateRideRequest, RideResponse};
use crate::error::{AppResult, ValidationError};
use crate::gateway::types::{Money, PaymentConfirmation};
use crate::services::CheckoutOrchestrator;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone)]
pub struct CheckoutApiState {
    pub orchestrator: Arc<CheckoutOrchestrator>,
}

#[derive(Debug, Deserialize)]
pub struct BeginCheckoutRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub amount: Option<serde_json::Value>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BeginCheckoutResponse {
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct CompleteCheckoutRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub razorpay_order_id: Option<String>,
    #[serde(default)]
    pub razorpay_payment_id: Option<String>,
    #[serde(default)]
    pub razorpay_signature: Option<String>,
    pub ride: CreateRideRequest,
}

#[derive(Debug, Deserialize)]
pub struct CancelCheckoutRequest {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutStateResponse {
    pub user_id: String,
    pub state: String,
}

/// POST /api/checkout
pub async fn begin_checkout(
    State(state): State<CheckoutApiState>,
    Json(body): Json<BeginCheckoutRequest>,
) -> AppResult<impl IntoResponse> {
    let user_id = required(body.user_id, "user_id")?;
    let amount = match body.amount {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => {
            return Err(ValidationError::MissingField {
                field: "amount".to_string(),
            }
            .into());
        }
    };
    let currency = required(body.currency, "currency")?;

    let order = state
        .orchestrator
        .begin_checkout(&user_id, Money { amount, currency })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(BeginCheckoutResponse {
            order_id: order.id,
            amount: order.amount,
            currency: order.currency,
            status: order.status,
        }),
    ))
}

/// POST /api/checkout/complete
pub async fn complete_checkout(
    State(state): State<CheckoutApiState>,
    Json(body): Json<CompleteCheckoutRequest>,
) -> AppResult<impl IntoResponse> {
    let user_id = required(body.user_id, "user_id")?;
    let confirmation = PaymentConfirmation {
        razorpay_order_id: required(body.razorpay_order_id, "razorpay_order_id")?,
        razorpay_payment_id: required(body.razorpay_payment_id, "razorpay_payment_id")?,
        razorpay_signature: required(body.razorpay_signature, "razorpay_signature")?,
    };
    let ride = crate::api::rides::parse_new_ride(body.ride)?;

    let recorded = state
        .orchestrator
        .complete_checkout(&user_id, &confirmation, &ride)
        .await?;

    Ok((StatusCode::CREATED, Json(RideResponse::from(recorded))))
}

/// POST /api/checkout/cancel
pub async fn cancel_checkout(
    State(state): State<CheckoutApiState>,
    Json(body): Json<CancelCheckoutRequest>,
) -> AppResult<impl IntoResponse> {
    let user_id = required(body.user_id, "user_id")?;
    state.orchestrator.cancel_checkout(&user_id).await?;

    let current = state.orchestrator.state_of(&user_id).await;
    Ok((
        StatusCode::OK,
        Json(CheckoutStateResponse {
            user_id,
            state: current.to_string(),
        }),
    ))
}

fn required(value: Option<String>, field: &str) -> Result<String, crate::error::AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ValidationError::MissingField {
            field: field.to_string(),
        }
        .into()),
    }
}
