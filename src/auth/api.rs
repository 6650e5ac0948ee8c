//! Authentication API Endpoints
//! Mission: Provide registration, login, and identity endpoints

use crate::app::AppState;
use crate::auth::{
    middleware::extract_claims,
    models::{
        normalize_email, LoginRequest, LoginResponse, MeResponse, NewUser, RegisterRequest,
        UserResponse,
    },
    store::StoreError,
};
use crate::subscription::{authority::resolve_tier, models::Tier};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Registration endpoint - POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, AuthApiError> {
    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        return Err(AuthApiError::InvalidEmail);
    }
    if payload.password.len() < 8 {
        return Err(AuthApiError::WeakPassword);
    }

    let password_hash = state.hasher.hash(&payload.password).map_err(|e| {
        error!("Password hashing failed: {}", e);
        AuthApiError::Internal
    })?;

    let display_name = payload
        .display_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let user = state
        .store
        .create(NewUser {
            email,
            password_hash,
            display_name,
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict => AuthApiError::EmailTaken,
            other => {
                error!("Account creation failed: {}", other);
                AuthApiError::Internal
            }
        })?;

    info!("✅ Registered: {}", user.email);

    // New accounts always start on the free tier.
    Ok(Json(UserResponse::from_account(&user, Tier::Free)))
}

/// Login endpoint - POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthApiError> {
    let email = normalize_email(&payload.email);

    // Unknown email and wrong password take the same path so the response
    // does not reveal which one failed.
    let user = state
        .store
        .find_by_email(&email)
        .await
        .map_err(|e| {
            error!("Login lookup failed: {}", e);
            AuthApiError::Internal
        })?
        .ok_or_else(|| {
            warn!("❌ Login attempt for unknown email");
            AuthApiError::InvalidCredentials
        })?;

    let valid = state
        .hasher
        .verify(&payload.password, &user.password_hash)
        .map_err(|e| {
            error!("Corrupt credential for {}: {}", user.id, e);
            AuthApiError::Internal
        })?;

    if !valid {
        warn!("❌ Failed login: {}", user.email);
        return Err(AuthApiError::InvalidCredentials);
    }

    let tier = resolve_tier(user.subscription.as_ref(), Utc::now());

    let (token, expires_in) = state.issuer.issue(&user, tier).map_err(|e| {
        error!("Token issuance failed: {}", e);
        AuthApiError::Internal
    })?;

    info!("✅ Login: {} ({})", user.email, tier.as_str());

    Ok(Json(LoginResponse {
        token,
        expires_in,
        tier,
        user: UserResponse::from_account(&user, tier),
    }))
}

/// Current user - GET /api/auth/me
///
/// Re-reads the account so the response carries the live tier; the token's
/// snapshot is echoed separately as `token_tier`.
pub async fn me(
    State(state): State<AppState>,
    req: Request,
) -> Result<Json<MeResponse>, AuthApiError> {
    let claims = extract_claims(&req).ok_or(AuthApiError::Unauthorized)?;
    let token_tier = claims.tier;

    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthApiError::Unauthorized)?;

    let user = state
        .store
        .find_by_id(&user_id)
        .await
        .map_err(|e| {
            error!("Account lookup failed: {}", e);
            AuthApiError::Internal
        })?
        .ok_or(AuthApiError::UserNotFound)?;

    let tier = resolve_tier(user.subscription.as_ref(), Utc::now());

    Ok(Json(MeResponse {
        user: UserResponse::from_account(&user, tier),
        tier,
        token_tier,
    }))
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

/// Auth API errors.
#[derive(Debug)]
pub enum AuthApiError {
    InvalidEmail,
    WeakPassword,
    EmailTaken,
    InvalidCredentials,
    Unauthorized,
    UserNotFound,
    Internal,
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, code, message, field) = match self {
            AuthApiError::InvalidEmail => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                "Please enter a valid email address.",
                Some("email"),
            ),
            AuthApiError::WeakPassword => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                "Password must be at least 8 characters.",
                Some("password"),
            ),
            AuthApiError::EmailTaken => (
                StatusCode::CONFLICT,
                "conflict",
                "An account with this email already exists",
                None,
            ),
            AuthApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                "Invalid email or password",
                None,
            ),
            AuthApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                "Authentication required",
                None,
            ),
            AuthApiError::UserNotFound => {
                (StatusCode::NOT_FOUND, "not_found", "User not found", None)
            }
            AuthApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error",
                None,
            ),
        };

        let mut body = serde_json::json!({
            "error": code,
            "message": message,
        });
        if let Some(field) = field {
            body["field"] = serde_json::Value::String(field.to_string());
        }

        (status, Json(body)).into_response()
    }
}
