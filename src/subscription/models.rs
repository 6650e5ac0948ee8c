//! Subscription Models
//! Mission: Define plan tiers and stored subscription state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Subscription tiers, lowest to highest.
///
/// Declaration order drives the derived `Ord`, so `Free < Pro < ProPlus` and
/// the access gate can compare tiers directly. New tiers slot in by position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    #[serde(rename = "free")]
    Free,
    #[serde(rename = "pro")]
    Pro,
    #[serde(rename = "pro-plus")]
    ProPlus,
}

impl Tier {
    pub fn as_str(&self) -> &str {
        match self {
            Tier::Free => "free",
            Tier::Pro => "pro",
            Tier::ProPlus => "pro-plus",
        }
    }

    /// Map a stored plan id to its tier.
    ///
    /// Accepts the legacy storefront spellings ("paid", "premium", "paid+")
    /// still present in older user records.
    pub fn from_plan_id(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "free" => Some(Tier::Free),
            "pro" | "paid" | "premium" => Some(Tier::Pro),
            "pro-plus" | "pro_plus" | "paid-plus" | "paid+" => Some(Tier::ProPlus),
            _ => None,
        }
    }
}

/// Lifecycle state reported by the storefront.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SubscriptionStatus {
    #[serde(rename = "active")]
    Active,
    #[serde(rename = "cancelled")]
    Cancelled,
    #[serde(rename = "none")]
    None,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::None => "none",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(SubscriptionStatus::Active),
            "cancelled" | "canceled" => Some(SubscriptionStatus::Cancelled),
            "none" => Some(SubscriptionStatus::None),
            _ => None,
        }
    }
}

/// Stored subscription state for one account.
///
/// `expires_at = None` means the plan does not expire. Whether the state
/// grants anything is decided by the subscription authority, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionState {
    pub plan_id: String,
    pub status: SubscriptionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl SubscriptionState {
    pub fn active(plan_id: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            plan_id: plan_id.into(),
            status: SubscriptionStatus::Active,
            expires_at,
        }
    }

    pub fn cancelled(plan_id: impl Into<String>) -> Self {
        Self {
            plan_id: plan_id.into(),
            status: SubscriptionStatus::Cancelled,
            expires_at: None,
        }
    }

    /// Placeholder returned to clients for accounts that never subscribed.
    pub fn none() -> Self {
        Self {
            plan_id: "free".to_string(),
            status: SubscriptionStatus::None,
            expires_at: None,
        }
    }
}
