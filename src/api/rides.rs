//! Ride persistence endpoints

use crate::database::ride_repository::{NewRide, Ride, RideRepository, RideWithDriver};
use crate::error::{AppError, AppResult, DomainError, ValidationError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct RidesState {
    pub rides: Arc<RideRepository>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRideRequest {
    #[serde(default)]
    pub origin_address: Option<String>,
    #[serde(default)]
    pub destination_address: Option<String>,
    #[serde(default)]
    pub origin_latitude: Option<serde_json::Value>,
    #[serde(default)]
    pub origin_longitude: Option<serde_json::Value>,
    #[serde(default)]
    pub destination_latitude: Option<serde_json::Value>,
    #[serde(default)]
    pub destination_longitude: Option<serde_json::Value>,
    #[serde(default)]
    pub ride_time: Option<i32>,
    #[serde(default)]
    pub fare_price: Option<serde_json::Value>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub driver_id: Option<i32>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RideResponse {
    pub ride_id: String,
    pub origin_address: String,
    pub destination_address: String,
    pub origin_latitude: String,
    pub origin_longitude: String,
    pub destination_latitude: String,
    pub destination_longitude: String,
    pub ride_time: i32,
    pub fare_price: String,
    pub status: String,
    pub payment_status: String,
    pub driver_id: i32,
    pub user_id: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct RideWithDriverResponse {
    #[serde(flatten)]
    pub ride: RideResponse,
    pub driver: Option<DriverSummary>,
}

#[derive(Debug, Serialize)]
pub struct DriverSummary {
    pub first_name: String,
    pub last_name: String,
    pub profile_image_url: Option<String>,
    pub car_image_url: Option<String>,
    pub car_seats: Option<i32>,
    pub rating: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRideRequest {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub driver_id: Option<i32>,
}

impl From<Ride> for RideResponse {
    fn from(ride: Ride) -> Self {
        Self {
            ride_id: ride.ride_id.to_string(),
            origin_address: ride.origin_address,
            destination_address: ride.destination_address,
            origin_latitude: ride.origin_latitude.to_string(),
            origin_longitude: ride.origin_longitude.to_string(),
            destination_latitude: ride.destination_latitude.to_string(),
            destination_longitude: ride.destination_longitude.to_string(),
            ride_time: ride.ride_time,
            fare_price: ride.fare_price.to_string(),
            status: ride.status,
            payment_status: ride.payment_status,
            driver_id: ride.driver_id,
            user_id: ride.user_id,
            created_at: ride.created_at.to_rfc3339(),
        }
    }
}

impl From<RideWithDriver> for RideWithDriverResponse {
    fn from(row: RideWithDriver) -> Self {
        let driver = match (&row.driver_first_name, &row.driver_last_name) {
            (Some(first), Some(last)) => Some(DriverSummary {
                first_name: first.clone(),
                last_name: last.clone(),
                profile_image_url: row.driver_profile_image_url.clone(),
                car_image_url: row.driver_car_image_url.clone(),
                car_seats: row.driver_car_seats,
                rating: row.driver_rating.as_ref().map(|r| r.to_string()),
            }),
            _ => None,
        };

        Self {
            ride: RideResponse {
                ride_id: row.ride_id.to_string(),
                origin_address: row.origin_address,
                destination_address: row.destination_address,
                origin_latitude: row.origin_latitude.to_string(),
                origin_longitude: row.origin_longitude.to_string(),
                destination_latitude: row.destination_latitude.to_string(),
                destination_longitude: row.destination_longitude.to_string(),
                ride_time: row.ride_time,
                fare_price: row.fare_price.to_string(),
                status: row.status,
                payment_status: row.payment_status,
                driver_id: row.driver_id,
                user_id: row.user_id,
                created_at: row.created_at.to_rfc3339(),
            },
            driver,
        }
    }
}

/// POST /api/rides
pub async fn create_ride(
    State(state): State<RidesState>,
    Json(body): Json<CreateRideRequest>,
) -> AppResult<impl IntoResponse> {
    let ride = parse_new_ride(body)?;
    let created = state.rides.create_ride(&ride).await?;
    Ok((StatusCode::CREATED, Json(RideResponse::from(created))))
}

/// GET /api/rides/user/{user_id}
pub async fn list_user_rides(
    State(state): State<RidesState>,
    Path(user_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let rides = state.rides.find_by_user(&user_id).await?;
    let body: Vec<RideWithDriverResponse> =
        rides.into_iter().map(RideWithDriverResponse::from).collect();
    Ok((StatusCode::OK, Json(body)))
}

/// GET /api/rides/{ride_id}
pub async fn get_ride(
    State(state): State<RidesState>,
    Path(ride_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_ride_id(&ride_id)?;
    let ride = state
        .rides
        .find_by_id(id)
        .await?
        .ok_or(DomainError::RideNotFound { ride_id })?;
    Ok((StatusCode::OK, Json(RideResponse::from(ride))))
}

/// PUT /api/rides/{ride_id}
///
/// Partial update of ride status and assigned driver.
pub async fn update_ride(
    State(state): State<RidesState>,
    Path(ride_id): Path<String>,
    Json(body): Json<UpdateRideRequest>,
) -> AppResult<impl IntoResponse> {
    let id = parse_ride_id(&ride_id)?;

    if body.status.is_none() && body.driver_id.is_none() {
        return Err(ValidationError::MissingField {
            field: "status or driver_id".to_string(),
        }
        .into());
    }

    let updated = state
        .rides
        .update_ride(id, body.status.as_deref(), body.driver_id)
        .await?
        .ok_or(DomainError::RideNotFound { ride_id })?;
    Ok((StatusCode::OK, Json(RideResponse::from(updated))))
}

fn parse_ride_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| {
        ValidationError::InvalidField {
            field: "ride_id".to_string(),
            reason: "Must be a UUID".to_string(),
        }
        .into()
    })
}

pub(crate) fn parse_new_ride(body: CreateRideRequest) -> Result<NewRide, AppError> {
    Ok(NewRide {
        origin_address: required(body.origin_address, "origin_address")?,
        destination_address: required(body.destination_address, "destination_address")?,
        origin_latitude: required_decimal(body.origin_latitude, "origin_latitude")?,
        origin_longitude: required_decimal(body.origin_longitude, "origin_longitude")?,
        destination_latitude: required_decimal(body.destination_latitude, "destination_latitude")?,
        destination_longitude: required_decimal(
            body.destination_longitude,
            "destination_longitude",
        )?,
        ride_time: body.ride_time.ok_or(ValidationError::MissingField {
            field: "ride_time".to_string(),
        })?,
        fare_price: required_decimal(body.fare_price, "fare_price")?,
        status: body.status.unwrap_or_else(|| "pending".to_string()),
        payment_status: required(body.payment_status, "payment_status")?,
        driver_id: body.driver_id.ok_or(ValidationError::MissingField {
            field: "driver_id".to_string(),
        })?,
        user_id: required(body.user_id, "user_id")?,
    })
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ValidationError::MissingField {
            field: field.to_string(),
        }
        .into()),
    }
}

fn required_decimal(value: Option<serde_json::Value>, field: &str) -> Result<BigDecimal, AppError> {
    let raw = match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => {
            return Err(ValidationError::MissingField {
                field: field.to_string(),
            }
            .into());
        }
    };

    BigDecimal::from_str(&raw).map_err(|_| {
        ValidationError::InvalidField {
            field: field.to_string(),
            reason: "Must be a decimal number".to_string(),
        }
        .into()
    })
}
