use axum::http::StatusCode;
use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use std::sync::Arc;

use crate::model::user::Role;
use crate::util::jwt::{JwtTokenUtils, JwtTokenUtilsImpl};

/// Request-scoped identity derived from the access token. Handlers receive
/// this instead of trusting any client-submitted role.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: String,
    pub phone: String,
    pub role: Role,
}

pub struct AuthState {
    pub jwt_utils: Arc<JwtTokenUtilsImpl>,
}

/// Validates the bearer token and attaches an [`AuthContext`] to the request
pub async fn require_auth(
    State(state): State<Arc<AuthState>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = state
        .jwt_utils
        .extract_token_from_header(auth_header)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;
    let claims = state
        .jwt_utils
        .validate_access_token(&token)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let role = Role::parse(&claims.role).ok_or(StatusCode::UNAUTHORIZED)?;

    req.extensions_mut().insert(AuthContext {
        user_id: claims.sub,
        phone: claims.phone,
        role,
    });

    Ok(next.run(req).await)
}
