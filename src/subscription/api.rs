//! Subscription API Endpoints
//! Mission: Expose stored subscription state and license activation

use crate::app::AppState;
use crate::auth::{middleware::extract_claims, models::Claims};
use crate::subscription::{authority::LicenseError, models::SubscriptionState};
use axum::{
    extract::{Extension, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// License activation request body.
#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    #[serde(default, alias = "licenseKey")]
    pub license_key: String,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub subscription: SubscriptionState,
}

#[derive(Debug, Serialize)]
pub struct ActivateResponse {
    pub success: bool,
    pub subscription: SubscriptionState,
}

/// Stored subscription state - GET /api/subscription
///
/// Accounts that never subscribed get a `{status: "none"}` placeholder so
/// clients always have a shape to render.
pub async fn get_subscription(
    State(state): State<AppState>,
    req: Request,
) -> Result<Json<SubscriptionResponse>, SubscriptionApiError> {
    let claims = extract_claims(&req).ok_or(SubscriptionApiError::Unauthorized)?;

    let user = state
        .store
        .find_by_email(&claims.email)
        .await
        .map_err(|e| {
            error!("Subscription lookup failed: {}", e);
            SubscriptionApiError::Internal
        })?
        .ok_or(SubscriptionApiError::UserNotFound)?;

    let subscription = user.subscription.unwrap_or_else(SubscriptionState::none);

    Ok(Json(SubscriptionResponse { subscription }))
}

/// License activation - POST /api/subscription
pub async fn activate_subscription(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    Json(payload): Json<ActivateRequest>,
) -> Result<Json<ActivateResponse>, SubscriptionApiError> {
    let Extension(claims) = claims.ok_or(SubscriptionApiError::Unauthorized)?;

    let license_key = payload.license_key.trim().to_string();
    if license_key.is_empty() {
        return Err(SubscriptionApiError::MissingLicenseKey);
    }

    let updated = state
        .authority
        .apply_license(&claims.email, &license_key)
        .await
        .map_err(|e| match e {
            LicenseError::Rejected => SubscriptionApiError::InvalidLicense,
            LicenseError::UserNotFound => SubscriptionApiError::UserNotFound,
            LicenseError::Unavailable => SubscriptionApiError::VerifierUnavailable,
            LicenseError::Store(inner) => {
                error!("License activation storage fault: {}", inner);
                SubscriptionApiError::Internal
            }
        })?;

    let subscription = updated.subscription.unwrap_or_else(SubscriptionState::none);
    info!("💳 Subscription activated for {}", claims.email);

    Ok(Json(ActivateResponse {
        success: true,
        subscription,
    }))
}

/// Subscription API errors.
#[derive(Debug)]
pub enum SubscriptionApiError {
    Unauthorized,
    MissingLicenseKey,
    InvalidLicense,
    UserNotFound,
    VerifierUnavailable,
    Internal,
}

impl IntoResponse for SubscriptionApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            SubscriptionApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                "Authentication required",
            ),
            SubscriptionApiError::MissingLicenseKey => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                "License key is required",
            ),
            SubscriptionApiError::InvalidLicense => (
                StatusCode::BAD_REQUEST,
                "invalid_license",
                "Invalid license key",
            ),
            SubscriptionApiError::UserNotFound => {
                (StatusCode::NOT_FOUND, "not_found", "User not found")
            }
            SubscriptionApiError::VerifierUnavailable => (
                StatusCode::BAD_GATEWAY,
                "verifier_unavailable",
                "License verification is temporarily unavailable",
            ),
            SubscriptionApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error",
            ),
        };

        let body = serde_json::json!({
            "error": code,
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activate_request_accepts_camel_case_alias() {
        let req: ActivateRequest = serde_json::from_str(r#"{"licenseKey":"GUM-1"}"#).unwrap();
        assert_eq!(req.license_key, "GUM-1");

        let req: ActivateRequest = serde_json::from_str(r#"{"license_key":"GUM-2"}"#).unwrap();
        assert_eq!(req.license_key, "GUM-2");
    }

    #[test]
    fn test_missing_key_deserializes_to_empty() {
        let req: ActivateRequest = serde_json::from_str("{}").unwrap();
        assert!(req.license_key.is_empty());
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(
            SubscriptionApiError::MissingLicenseKey
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            SubscriptionApiError::InvalidLicense.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            SubscriptionApiError::UserNotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            SubscriptionApiError::VerifierUnavailable
                .into_response()
                .status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
