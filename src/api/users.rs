//! Rider account endpoints

use crate::database::user_repository::{User, UserRepository};
use crate::error::{AppResult, DomainError, ValidationError};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone)]
pub struct UsersState {
    pub users: Arc<UserRepository>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "clerkId")]
    pub clerk_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    #[serde(rename = "clerkId")]
    pub clerk_id: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            clerk_id: user.clerk_id,
        }
    }
}

/// POST /api/users
pub async fn create_user(
    State(state): State<UsersState>,
    Json(body): Json<CreateUserRequest>,
) -> AppResult<impl IntoResponse> {
    let name = required(body.name, "name")?;
    let email = required(body.email, "email")?;
    let clerk_id = required(body.clerk_id, "clerkId")?;

    let user = state.users.create_user(&name, &email, &clerk_id).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[derive(Debug, Deserialize)]
pub struct GetUserQuery {
    #[serde(default)]
    pub clerk_id: Option<String>,
}

/// GET /api/users?clerk_id=
pub async fn get_user(
    State(state): State<UsersState>,
    Query(query): Query<GetUserQuery>,
) -> AppResult<impl IntoResponse> {
    let clerk_id = required(query.clerk_id, "clerk_id")?;
    let user = state
        .users
        .find_by_clerk_id(&clerk_id)
        .await?
        .ok_or(DomainError::UserNotFound { clerk_id })?;
    Ok((StatusCode::OK, Json(UserResponse::from(user))))
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
