//! Subscription Authority
//! Mission: Decide effective tiers and apply storefront verification results

use crate::auth::models::UserAccount;
use crate::auth::store::{CredentialStore, StoreError};
use crate::subscription::gumroad::LicenseVerifier;
use crate::subscription::models::{SubscriptionState, SubscriptionStatus, Tier};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// License activation failures.
#[derive(Debug)]
pub enum LicenseError {
    /// The storefront looked at the key and said no.
    Rejected,
    /// The account disappeared between verification and the write.
    UserNotFound,
    /// The storefront could not be reached (timeout included).
    Unavailable,
    /// Store fault underneath the activation.
    Store(StoreError),
}

impl std::fmt::Display for LicenseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LicenseError::Rejected => write!(f, "Invalid license key"),
            LicenseError::UserNotFound => write!(f, "User not found"),
            LicenseError::Unavailable => write!(f, "License verification unavailable"),
            LicenseError::Store(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl std::error::Error for LicenseError {}

impl From<StoreError> for LicenseError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => LicenseError::UserNotFound,
            other => LicenseError::Store(other),
        }
    }
}

/// Effective tier from stored state at the given evaluation time.
///
/// Free unless the subscription is active and unexpired; an unknown plan id
/// under an otherwise-active subscription also lands on Free, the lowest
/// privilege.
pub fn resolve_tier(subscription: Option<&SubscriptionState>, now: DateTime<Utc>) -> Tier {
    let Some(sub) = subscription else {
        return Tier::Free;
    };

    if sub.status != SubscriptionStatus::Active {
        return Tier::Free;
    }

    if let Some(expires_at) = sub.expires_at {
        if expires_at <= now {
            return Tier::Free;
        }
    }

    Tier::from_plan_id(&sub.plan_id).unwrap_or(Tier::Free)
}

/// Resolves tiers from the store and applies storefront license results.
pub struct SubscriptionAuthority {
    store: Arc<dyn CredentialStore>,
    verifier: Arc<dyn LicenseVerifier>,
    default_plan_id: String,
    term_days: i64,
}

impl SubscriptionAuthority {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        verifier: Arc<dyn LicenseVerifier>,
        default_plan_id: String,
        term_days: i64,
    ) -> Self {
        Self {
            store,
            verifier,
            default_plan_id,
            term_days,
        }
    }

    /// Effective tier for an account right now. A vanished account resolves
    /// to Free rather than erroring the read path.
    pub async fn current_tier_for(&self, id: &uuid::Uuid) -> Result<Tier, StoreError> {
        let user = self.store.find_by_id(id).await?;
        Ok(resolve_tier(
            user.as_ref().and_then(|u| u.subscription.as_ref()),
            Utc::now(),
        ))
    }

    /// Verify a license key with the storefront and, on success, overwrite the
    /// account's subscription with a fresh active term.
    pub async fn apply_license(
        &self,
        email: &str,
        license_key: &str,
    ) -> Result<UserAccount, LicenseError> {
        let verification = self.verifier.verify(license_key).await.map_err(|e| {
            warn!("License verifier unreachable: {}", e);
            LicenseError::Unavailable
        })?;

        if !verification.valid {
            info!("❌ License rejected for {}", email);
            return Err(LicenseError::Rejected);
        }

        // A recognized storefront variant becomes its canonical plan id;
        // anything else falls back to the configured default.
        let plan_id = verification
            .plan_id
            .as_deref()
            .and_then(Tier::from_plan_id)
            .map(|t| t.as_str().to_string())
            .unwrap_or_else(|| self.default_plan_id.clone());

        let user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(LicenseError::UserNotFound)?;

        let expires_at = Utc::now() + Duration::days(self.term_days);
        let state = SubscriptionState::active(plan_id.clone(), Some(expires_at));

        let updated = self.store.set_subscription(&user.id, state).await?;

        info!(
            "✅ License activated: {} -> {} (expires {})",
            email, plan_id, expires_at
        );

        Ok(updated)
    }
}
