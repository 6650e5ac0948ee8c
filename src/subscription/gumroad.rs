//! Gumroad License Verification
//!
//! External storefront collaborator. The authority only consumes the
//! valid/plan result; everything about the storefront wire format stays here.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const GUMROAD_API_BASE: &str = "https://api.gumroad.com/v2";

/// Outcome of a storefront license check.
///
/// `plan_id` is the storefront's variant string when it reports one; the
/// authority maps it to a tier and falls back to the configured default plan.
#[derive(Debug, Clone)]
pub struct LicenseVerification {
    pub valid: bool,
    pub plan_id: Option<String>,
}

/// Collaborator seam for license verification.
///
/// `Err` means the storefront could not be reached (timeouts included) and is
/// surfaced as 502, never as a rejected license.
#[async_trait]
pub trait LicenseVerifier: Send + Sync {
    async fn verify(&self, license_key: &str) -> Result<LicenseVerification>;
}

/// Real Gumroad client for `POST /v2/licenses/verify`.
#[derive(Clone)]
pub struct GumroadClient {
    client: Client,
    base_url: String,
    product_id: String,
}

impl GumroadClient {
    pub fn new(
        product_id: String,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let mut builder = Client::builder().timeout(timeout);

        if let Some(token) = access_token {
            builder = builder.default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::AUTHORIZATION,
                    format!("Bearer {}", token)
                        .parse()
                        .context("Invalid Gumroad access token")?,
                );
                headers
            });
        }

        let client = builder.build().context("Failed to build GumroadClient")?;

        Ok(Self {
            client,
            base_url: GUMROAD_API_BASE.to_string(),
            product_id,
        })
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[derive(Debug, Deserialize)]
struct VerifyLicenseResponse {
    success: bool,
    #[serde(default)]
    purchase: Option<PurchaseInfo>,
}

#[derive(Debug, Deserialize)]
struct PurchaseInfo {
    #[serde(default)]
    variants: Option<String>,
}

#[async_trait]
impl LicenseVerifier for GumroadClient {
    async fn verify(&self, license_key: &str) -> Result<LicenseVerification> {
        let url = format!("{}/licenses/verify", self.base_url);
        let body = serde_json::json!({
            "product_id": self.product_id,
            "license_key": license_key,
        });

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("POST /licenses/verify failed")?;

        // Gumroad answers an unknown or disabled key with a non-2xx status;
        // that is a rejection, not an outage.
        if !resp.status().is_success() {
            debug!("Gumroad rejected license with status {}", resp.status());
            return Ok(LicenseVerification {
                valid: false,
                plan_id: None,
            });
        }

        let parsed = resp
            .json::<VerifyLicenseResponse>()
            .await
            .context("Malformed Gumroad verify response")?;

        if !parsed.success {
            return Ok(LicenseVerification {
                valid: false,
                plan_id: None,
            });
        }

        let plan_id = parsed
            .purchase
            .and_then(|p| p.variants)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        if let Some(plan) = &plan_id {
            debug!("Gumroad verified license with variant {:?}", plan);
        }

        Ok(LicenseVerification {
            valid: true,
            plan_id,
        })
    }
}

/// Verifier used when no storefront is configured; every key is rejected so a
/// misconfigured deployment cannot hand out paid tiers.
pub struct RejectAllVerifier;

#[async_trait]
impl LicenseVerifier for RejectAllVerifier {
    async fn verify(&self, _license_key: &str) -> Result<LicenseVerification> {
        warn!("License verification attempted without a configured storefront");
        Ok(LicenseVerification {
            valid: false,
            plan_id: None,
        })
    }
}
