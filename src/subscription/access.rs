//! Access Decisions
//! Mission: Gate tier-protected resources with an ordered-tier comparison

use crate::auth::models::Claims;
use crate::subscription::authority::SubscriptionAuthority;
use crate::subscription::models::Tier;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::collections::HashMap;
use tracing::error;
use uuid::Uuid;

/// Outcome of a tier comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

/// Allow iff the caller's tier is at least the required tier.
pub fn authorize(required: Tier, caller: Tier) -> Access {
    if caller >= required {
        Access::Allow
    } else {
        Access::Deny
    }
}

/// Feed resources with a static tier requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedResource {
    TopVoices,
    Profile,
    KeywordSearch,
    Insights,
}

lazy_static::lazy_static! {
    /// Per-resource required tiers. Static configuration, never computed.
    static ref RESOURCE_TIERS: HashMap<FeedResource, Tier> = {
        let mut m = HashMap::new();
        m.insert(FeedResource::TopVoices, Tier::Free);
        m.insert(FeedResource::Profile, Tier::Pro);
        m.insert(FeedResource::KeywordSearch, Tier::Pro);
        m.insert(FeedResource::Insights, Tier::ProPlus);
        m
    };
}

pub fn required_tier(resource: FeedResource) -> Tier {
    RESOURCE_TIERS.get(&resource).copied().unwrap_or(Tier::Free)
}

/// Gate failures at the HTTP boundary: 401 when no usable identity arrived,
/// 403 when the identity is fine but the tier is not.
#[derive(Debug)]
pub enum AccessError {
    Unauthenticated,
    InsufficientTier { required: Tier },
    Internal,
}

impl IntoResponse for AccessError {
    fn into_response(self) -> Response {
        match self {
            AccessError::Unauthenticated => {
                let body = serde_json::json!({
                    "error": "unauthenticated",
                    "message": "Authentication required",
                });
                (StatusCode::UNAUTHORIZED, Json(body)).into_response()
            }
            AccessError::InsufficientTier { required } => {
                let body = serde_json::json!({
                    "error": "insufficient_tier",
                    "message": format!(
                        "This feature requires the {} plan or higher",
                        required.as_str()
                    ),
                    "required_tier": required.as_str(),
                    "upgrade": true,
                });
                (StatusCode::FORBIDDEN, Json(body)).into_response()
            }
            AccessError::Internal => {
                let body = serde_json::json!({
                    "error": "internal_error",
                    "message": "Internal server error",
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

/// Resolve the caller's live tier and check it against the resource's
/// requirement. Returns the caller's tier so handlers can echo it.
pub async fn require_tier(
    authority: &SubscriptionAuthority,
    claims: Option<&Claims>,
    resource: FeedResource,
) -> Result<Tier, AccessError> {
    let claims = claims.ok_or(AccessError::Unauthenticated)?;

    // The subject is always one of our own ids; anything else is a token we
    // never issued.
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AccessError::Unauthenticated)?;

    let caller = authority.current_tier_for(&user_id).await.map_err(|e| {
        error!("Tier resolution failed: {}", e);
        AccessError::Internal
    })?;

    match authorize(required_tier(resource), caller) {
        Access::Allow => Ok(caller),
        Access::Deny => Err(AccessError::InsufficientTier {
            required: required_tier(resource),
        }),
    }
}
