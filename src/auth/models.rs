//! Authentication Models
//! Mission: Define user account and credential data structures

use crate::subscription::models::{SubscriptionState, Tier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: Uuid,
    /// Stored normalized (trimmed, lowercased); lookups normalize the same way.
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub display_name: Option<String>,
    /// `None` means the account never had a paid plan.
    pub subscription: Option<SubscriptionState>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create an account. The password arrives already hashed;
/// plaintext never reaches the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub display_name: Option<String>,
}

/// Canonical form for stored and looked-up emails.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// JWT claims payload.
///
/// `tier` is the snapshot resolved at issuance. Authorization never reads it;
/// gated endpoints re-resolve the tier from the store so a plan change takes
/// effect without waiting for token expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // subject (user id)
    pub email: String,
    pub tier: Tier,
    pub iat: usize, // issued-at timestamp
    pub exp: usize, // expiration timestamp
}

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default, alias = "displayName")]
    pub display_name: Option<String>,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: usize, // seconds until expiration
    pub tier: Tier,
    pub user: UserResponse,
}

/// User response (sanitized - no hash material).
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub tier: Tier,
    pub created_at: DateTime<Utc>,
}

impl UserResponse {
    pub fn from_account(user: &UserAccount, tier: Tier) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            tier,
            created_at: user.created_at,
        }
    }
}

/// `/api/auth/me` response. `tier` is the effective tier read from the store;
/// `token_tier` is the issuance-time snapshot carried in the presented token.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserResponse,
    pub tier: Tier,
    pub token_tier: Tier,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_account() -> UserAccount {
        UserAccount {
            id: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            password_hash: "$2b$12$abcdefghijklmnopqrstuv".to_string(),
            display_name: Some("Alice".to_string()),
            subscription: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_email_normalization() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
        assert_eq!(normalize_email("bob@example.com"), "bob@example.com");
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let user = sample_account();
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "alice@example.com");
    }

    #[test]
    fn test_user_response_from_account() {
        let user = sample_account();
        let response = UserResponse::from_account(&user, Tier::Free);
        assert_eq!(response.id, user.id.to_string());
        assert_eq!(response.email, "alice@example.com");
        assert_eq!(response.tier, Tier::Free);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn test_register_request_accepts_camel_case_alias() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"email":"a@b.co","password":"Secret123!","displayName":"A"}"#,
        )
        .unwrap();
        assert_eq!(req.display_name.as_deref(), Some("A"));
    }
}
