use axum::extract::{Json, State};
use axum::response::IntoResponse;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::dto::quote_dto::validate_mx_phone;
use crate::model::user::{Role, User};
use crate::service::user_service::{UserService, UserServiceImpl};
use crate::util::error::HandlerError;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(custom(function = "validate_mx_phone"))]
    pub phone: String,
    #[validate(length(min = 2, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    /// One of PETITIONER, VALIDATOR, PROVIDER, SUPERVISOR
    pub role: String,
    pub company: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(custom(function = "validate_mx_phone"))]
    pub phone: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 10))]
    pub refresh_token: String,
}

pub async fn register_handler(
    State(service): State<Arc<UserServiceImpl>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    if let Err(e) = payload.validate() {
        return Err(HandlerError::bad_request(format!("Validation error: {}", e)));
    }
    let role = Role::parse(&payload.role)
        .ok_or_else(|| HandlerError::bad_request(format!("Unknown role: {}", payload.role)))?;

    let user = User {
        id: None,
        phone: payload.phone,
        name: payload.name,
        email: payload.email,
        role,
        password_hash: None,
        company: payload.company,
        created_at: None,
        updated_at: None,
    };
    let res = service.register(user, payload.password).await?;
    Ok(Json(res))
}

pub async fn login_handler(
    State(service): State<Arc<UserServiceImpl>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    if let Err(e) = payload.validate() {
        return Err(HandlerError::bad_request(format!("Validation error: {}", e)));
    }
    let res = service.login(payload.phone, payload.password).await?;
    Ok(Json(res))
}

pub async fn refresh_token_handler(
    State(service): State<Arc<UserServiceImpl>>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    if let Err(e) = payload.validate() {
        return Err(HandlerError::bad_request(format!("Validation error: {}", e)));
    }
    let res = service.refresh_token(payload.refresh_token).await?;
    Ok(Json(res))
}
