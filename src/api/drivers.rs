//! Driver registry endpoints

use crate::database::driver_repository::{Driver, DriverRepository, NewDriver};
use crate::error::{AppResult, DomainError, ValidationError};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

#[derive(Clone)]
pub struct DriversState {
    pub drivers: Arc<DriverRepository>,
}

#[derive(Debug, Deserialize)]
pub struct CreateDriverRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub car_image_url: Option<String>,
    #[serde(default)]
    pub car_seats: Option<i32>,
    #[serde(default)]
    pub rating: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct DriverResponse {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub profile_image_url: Option<String>,
    pub car_image_url: Option<String>,
    pub car_seats: i32,
    pub rating: Option<String>,
}

impl From<Driver> for DriverResponse {
    fn from(driver: Driver) -> Self {
        Self {
            id: driver.id,
            first_name: driver.first_name,
            last_name: driver.last_name,
            email: driver.email,
            profile_image_url: driver.profile_image_url,
            car_image_url: driver.car_image_url,
            car_seats: driver.car_seats,
            rating: driver.rating.map(|r| r.to_string()),
        }
    }
}

/// GET /api/drivers
pub async fn list_drivers(State(state): State<DriversState>) -> AppResult<impl IntoResponse> {
    let drivers = state.drivers.list_drivers().await?;
    let body: Vec<DriverResponse> = drivers.into_iter().map(DriverResponse::from).collect();
    Ok((StatusCode::OK, Json(body)))
}

/// POST /api/drivers
///
/// Registers a driver; duplicate emails are a conflict.
pub async fn create_driver(
    State(state): State<DriversState>,
    Json(body): Json<CreateDriverRequest>,
) -> AppResult<impl IntoResponse> {
    let email = required(body.email, "email")?;

    if state.drivers.find_by_email(&email).await?.is_some() {
        return Err(DomainError::DriverAlreadyExists { email }.into());
    }

    let rating = match body.rating {
        Some(serde_json::Value::String(s)) => Some(parse_rating(&s)?),
        Some(serde_json::Value::Number(n)) => Some(parse_rating(&n.to_string())?),
        _ => None,
    };

    let driver = NewDriver {
        first_name: required(body.first_name, "first_name")?,
        last_name: required(body.last_name, "last_name")?,
        email,
        profile_image_url: body.profile_image_url,
        car_image_url: body.car_image_url,
        car_seats: body.car_seats.ok_or(ValidationError::MissingField {
            field: "car_seats".to_string(),
        })?,
        rating,
    };

    let created = state.drivers.create_driver(&driver).await?;
    Ok((StatusCode::CREATED, Json(DriverResponse::from(created))))
}

fn parse_rating(raw: &str) -> Result<BigDecimal, crate::error::AppError> {
    BigDecimal::from_str(raw.trim()).map_err(|_| {
        ValidationError::InvalidField {
            field: "rating".to_string(),
            reason: "Must be a decimal number".to_string(),
        }
        .into()
    })
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
