//! Service Configuration
//! Mission: Centralize environment-driven settings with safe defaults

use anyhow::Result;

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen port.
    pub port: u16,
    /// SQLite database path for user accounts.
    pub database_path: String,
    /// HS256 signing secret for issued tokens.
    pub jwt_secret: String,
    /// Token lifetime in hours.
    pub token_ttl_hours: i64,
    /// bcrypt work factor for new password hashes. Existing hashes keep
    /// verifying after a change because bcrypt embeds the cost in the hash.
    pub bcrypt_cost: u32,
    /// Storefront product whose licenses unlock paid tiers.
    pub gumroad_product_id: String,
    /// Storefront API token; verification still works without one for
    /// products that allow unauthenticated license checks.
    pub gumroad_access_token: Option<String>,
    /// Timeout for the storefront verification call, in seconds.
    pub license_timeout_secs: u64,
    /// Plan granted when the storefront reports no recognizable variant.
    pub default_plan_id: String,
    /// Subscription term applied on license activation, in days.
    pub subscription_term_days: i64,
    /// Directory holding the feed post files.
    pub feed_data_dir: String,
    /// Sliding-window request cap for the public auth endpoints, per minute.
    pub auth_rate_limit: u32,
    /// Extra requests tolerated above the cap before hard rejection.
    pub auth_rate_burst: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        let database_path = std::env::var("AUTH_DB_PATH")
            .or_else(|_| std::env::var("DATABASE_PATH"))
            .unwrap_or_else(|_| "./voicegate.db".to_string());

        let jwt_secret = std::env::var("JWT_SECRET")
            .unwrap_or_else(|_| "dev-secret-change-in-production-minimum-32-characters".to_string());

        let token_ttl_hours = std::env::var("TOKEN_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(24);

        let bcrypt_cost = std::env::var("BCRYPT_COST")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|&v| (4..=31).contains(&v))
            .unwrap_or(bcrypt::DEFAULT_COST);

        let gumroad_product_id = std::env::var("GUMROAD_PRODUCT_ID")
            .unwrap_or_else(|_| "pgqFM4RebBN6QTqYIFzwWw==".to_string());

        let gumroad_access_token = std::env::var("GUMROAD_ACCESS_TOKEN")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let license_timeout_secs = std::env::var("LICENSE_VERIFY_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(10);

        let default_plan_id =
            std::env::var("LICENSE_DEFAULT_PLAN").unwrap_or_else(|_| "pro".to_string());

        let subscription_term_days = std::env::var("SUBSCRIPTION_TERM_DAYS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(30);

        let feed_data_dir =
            std::env::var("FEED_DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let auth_rate_limit = std::env::var("AUTH_RATE_LIMIT_PER_MINUTE")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(20);

        let auth_rate_burst = std::env::var("AUTH_RATE_LIMIT_BURST")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        Ok(Self {
            port,
            database_path,
            jwt_secret,
            token_ttl_hours,
            bcrypt_cost,
            gumroad_product_id,
            gumroad_access_token,
            license_timeout_secs,
            default_plan_id,
            subscription_term_days,
            feed_data_dir,
            auth_rate_limit,
            auth_rate_burst,
        })
    }
}
