//! Application Assembly
//! Mission: Wire shared state and the HTTP router for the server and tests

use crate::auth::{api as auth_api, auth_middleware, CredentialStore, PasswordHasher, TokenIssuer};
use crate::feed::{api as feed_api, PostCatalog};
use crate::middleware::{auth_rate_limit, track_requests, AuthRateLimiter};
use crate::subscription::{api as subscription_api, SubscriptionAuthority};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared handles behind every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CredentialStore>,
    pub hasher: Arc<PasswordHasher>,
    pub issuer: Arc<TokenIssuer>,
    pub authority: Arc<SubscriptionAuthority>,
    pub catalog: Arc<PostCatalog>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<PasswordHasher>,
        issuer: Arc<TokenIssuer>,
        authority: Arc<SubscriptionAuthority>,
        catalog: Arc<PostCatalog>,
    ) -> Self {
        Self {
            store,
            hasher,
            issuer,
            authority,
            catalog,
        }
    }
}

/// Build the full router. Tests drive the same assembly through
/// `tower::ServiceExt::oneshot`, so every layer the server runs is exercised.
pub fn router(state: AppState, limiter: AuthRateLimiter) -> Router {
    // Public auth endpoints carry the brute-force limiter.
    let auth_routes = Router::new()
        .route("/api/auth/register", post(auth_api::register))
        .route("/api/auth/login", post(auth_api::login))
        .route_layer(middleware::from_fn_with_state(limiter, auth_rate_limit))
        .with_state(state.clone());

    // Everything behind the bearer-token middleware.
    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth_api::me))
        .route(
            "/api/subscription",
            get(subscription_api::get_subscription)
                .post(subscription_api::activate_subscription),
        )
        .route("/api/feed/top-voices", get(feed_api::top_voices))
        .route("/api/feed/profile", get(feed_api::profile_posts))
        .route("/api/feed/search", get(feed_api::keyword_search))
        .route("/api/feed/insights", get(feed_api::insights))
        .route_layer(middleware::from_fn_with_state(
            state.issuer.clone(),
            auth_middleware,
        ))
        .with_state(state.clone());

    let public_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(track_requests))
}

async fn health_check() -> &'static str {
    "OK"
}
