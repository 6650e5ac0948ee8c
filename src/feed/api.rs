//! Feed API Endpoints
//! Mission: Tier-gated read access to the post catalog

use crate::app::AppState;
use crate::auth::models::Claims;
use crate::feed::models::{
    InsightsResponse, KeywordSearchResponse, ProfilePostsResponse, TopVoicesResponse,
    UpgradeOptions,
};
use crate::subscription::access::{require_tier, AccessError, FeedResource};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;

/// Top voices - GET /api/feed/top-voices (Free)
pub async fn top_voices(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
) -> Result<Json<TopVoicesResponse>, FeedApiError> {
    gate(&state, &claims, FeedResource::TopVoices).await?;

    Ok(Json(TopVoicesResponse {
        posts: state.catalog.top_voices().to_vec(),
        message: "Want more insights? Upgrade for profile analysis and keyword search!"
            .to_string(),
        upgrade_options: UpgradeOptions {
            pro: "Analyze LinkedIn profiles of your choice and search by keyword".to_string(),
            pro_plus: "Everything in Pro plus engagement insights".to_string(),
        },
    }))
}

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    #[serde(default)]
    pub profile_url: Option<String>,
}

/// Profile posts - GET /api/feed/profile?profile_url= (Pro)
pub async fn profile_posts(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    Query(query): Query<ProfileQuery>,
) -> Result<Json<ProfilePostsResponse>, FeedApiError> {
    gate(&state, &claims, FeedResource::Profile).await?;

    let profile_url = query
        .profile_url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or(FeedApiError::MissingParam("profile_url"))?;

    Ok(Json(ProfilePostsResponse {
        posts: state.catalog.posts_for_profile(&profile_url),
        profile_url,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub keyword: Option<String>,
}

/// Keyword search - GET /api/feed/search?keyword= (Pro)
pub async fn keyword_search(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<KeywordSearchResponse>, FeedApiError> {
    gate(&state, &claims, FeedResource::KeywordSearch).await?;

    let keyword = query
        .keyword
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .ok_or(FeedApiError::MissingParam("keyword"))?;

    Ok(Json(KeywordSearchResponse {
        posts: state.catalog.search(&keyword),
        search_term: keyword,
        timestamp: Utc::now(),
    }))
}

/// Engagement insights - GET /api/feed/insights (ProPlus)
pub async fn insights(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
) -> Result<Json<InsightsResponse>, FeedApiError> {
    gate(&state, &claims, FeedResource::Insights).await?;
    Ok(Json(state.catalog.insights()))
}

async fn gate(
    state: &AppState,
    claims: &Option<Extension<Claims>>,
    resource: FeedResource,
) -> Result<(), FeedApiError> {
    let claims = claims.as_ref().map(|Extension(c)| c);
    require_tier(&state.authority, claims, resource).await?;
    Ok(())
}

/// Feed API errors: the access gate's 401/403 plus missing-parameter 400s.
#[derive(Debug)]
pub enum FeedApiError {
    Access(AccessError),
    MissingParam(&'static str),
}

impl From<AccessError> for FeedApiError {
    fn from(e: AccessError) -> Self {
        FeedApiError::Access(e)
    }
}

impl IntoResponse for FeedApiError {
    fn into_response(self) -> Response {
        match self {
            FeedApiError::Access(e) => e.into_response(),
            FeedApiError::MissingParam(name) => {
                let body = serde_json::json!({
                    "error": "validation_error",
                    "message": format!("Missing required parameter: {}", name),
                    "field": name,
                });
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
        }
    }
}
