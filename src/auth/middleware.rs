//! Authentication Middleware
//! Mission: Gate protected endpoints behind bearer-token verification

use crate::auth::{jwt::TokenError, jwt::TokenIssuer, models::Claims};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

/// Middleware that verifies the `Authorization: Bearer` token and stashes the
/// claims in request extensions for handlers downstream.
pub async fn auth_middleware(
    State(issuer): State<Arc<TokenIssuer>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|t| t.to_string())
        .ok_or(AuthError::MissingToken)?;

    let claims = issuer.verify(&token).map_err(|e| match e {
        TokenError::Expired => AuthError::ExpiredToken,
        TokenError::Invalid => AuthError::InvalidToken,
    })?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Extract claims from a request (use after `auth_middleware`).
pub fn extract_claims(req: &Request) -> Option<&Claims> {
    req.extensions().get::<Claims>()
}

/// Credential-presentation failures, all 401. The `error` code tells clients
/// whether to re-prompt login silently (`expired_token`) or fail hard.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    ExpiredToken,
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::InvalidToken => "invalid_token",
            AuthError::ExpiredToken => "expired_token",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingToken => "Missing authorization token",
            AuthError::InvalidToken => "Invalid token",
            AuthError::ExpiredToken => "Token has expired",
        };

        let body = serde_json::json!({
            "error": self.code(),
            "message": message,
        });

        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}
