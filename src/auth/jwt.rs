//! JWT Token Issuer
//! Mission: Mint and verify signed bearer tokens

use crate::auth::models::{Claims, UserAccount};
use crate::subscription::models::Tier;
use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

/// Token issuer holding the HS256 signing secret.
pub struct TokenIssuer {
    secret: String,
    ttl_hours: i64,
}

/// Verification failures. `Expired` is kept apart from `Invalid` so clients
/// can re-prompt login silently instead of treating it as a hard failure.
#[derive(Debug, PartialEq, Eq)]
pub enum TokenError {
    Expired,
    Invalid,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Expired => write!(f, "Token has expired"),
            TokenError::Invalid => write!(f, "Token is invalid"),
        }
    }
}

impl std::error::Error for TokenError {}

impl TokenIssuer {
    /// Create an issuer with the default 24-hour token lifetime.
    pub fn new(secret: String) -> Self {
        Self {
            secret,
            ttl_hours: 24,
        }
    }

    pub fn with_ttl_hours(secret: String, ttl_hours: i64) -> Self {
        Self { secret, ttl_hours }
    }

    /// Mint a token for a validated identity.
    ///
    /// `tier` is embedded as an issuance-time snapshot; gated endpoints
    /// re-resolve the live tier from the store and never trust this field.
    pub fn issue(&self, user: &UserAccount, tier: Tier) -> Result<(String, usize)> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(chrono::Duration::hours(self.ttl_hours))
            .context("Invalid timestamp")?
            .timestamp() as usize;

        let expires_in = (self.ttl_hours * 3600) as usize;

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            tier,
            iat: now.timestamp() as usize,
            exp: expiration,
        };

        debug!(
            "Issuing token for {} ({}), expires in {}h",
            user.email, user.id, self.ttl_hours
        );

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to sign token")?;

        Ok((token, expires_in))
    }

    /// Verify a presented token and extract its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })?;

        debug!("Verified token for {}", decoded.claims.email);

        Ok(decoded.claims)
    }
}
