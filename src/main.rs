//! VoiceGate - Subscription-Gated Feed Backend
//! Mission: Registration, sign-in, license activation, and the tier-gated feed

use anyhow::{Context, Result};
use dotenv::dotenv;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::{net::TcpListener, time::interval};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use voicegate_backend::{
    app::{router, AppState},
    auth::{PasswordHasher, SqliteCredentialStore, TokenIssuer},
    config::Config,
    feed::PostCatalog,
    middleware::AuthRateLimiter,
    subscription::{
        gumroad::{GumroadClient, RejectAllVerifier},
        LicenseVerifier, SubscriptionAuthority,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    info!("🚀 VoiceGate backend starting");

    let config = Config::from_env()?;

    let store = Arc::new(SqliteCredentialStore::new(&config.database_path)?);
    let hasher = Arc::new(PasswordHasher::new(config.bcrypt_cost));
    let issuer = Arc::new(TokenIssuer::with_ttl_hours(
        config.jwt_secret.clone(),
        config.token_ttl_hours,
    ));

    let verifier: Arc<dyn LicenseVerifier> = if config.gumroad_product_id.trim().is_empty() {
        Arc::new(RejectAllVerifier)
    } else {
        Arc::new(GumroadClient::new(
            config.gumroad_product_id.clone(),
            config.gumroad_access_token.clone(),
            Duration::from_secs(config.license_timeout_secs),
        )?)
    };

    let authority = Arc::new(SubscriptionAuthority::new(
        store.clone(),
        verifier,
        config.default_plan_id.clone(),
        config.subscription_term_days,
    ));

    let catalog = Arc::new(PostCatalog::load(&config.feed_data_dir));

    let state = AppState::new(store, hasher, issuer, authority, catalog);

    let limiter = AuthRateLimiter::new(
        config.auth_rate_limit,
        config.auth_rate_burst,
        Duration::from_secs(60),
    );

    // Keep the limiter's IP table from growing without bound.
    let prune_limiter = limiter.clone();
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(300));
        loop {
            ticker.tick().await;
            prune_limiter.prune();
        }
    });

    let app = router(state, limiter);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("🎯 API server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voicegate_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // Standard dotenv search (cwd + parents), then the manifest directory so
    // running with --manifest-path from elsewhere still finds the .env.
    let _ = dotenv();

    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let candidates = [manifest_dir.join(".env"), manifest_dir.join("../.env")];

    for p in candidates {
        if p.exists() {
            let _ = dotenv::from_path(&p);
        }
    }
}
