//! Feed Models
//! Mission: Post payloads and feed response shapes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One post in the feed. Matches the upstream scrape format, which omits
/// author and engagement blocks for some posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub text: String,
    pub parsed_datetime: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<PostAuthor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engagement: Option<Engagement>,
    pub post_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostAuthor {
    pub name: String,
    #[serde(default)]
    pub headline: String,
    pub profile_url: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Engagement {
    pub reactions: u64,
    pub comments: u64,
    pub shares: u64,
}

/// Free-tier response. The message and upgrade copy mirror what the clients
/// render under the post list.
#[derive(Debug, Serialize)]
pub struct TopVoicesResponse {
    pub posts: Vec<Post>,
    pub message: String,
    pub upgrade_options: UpgradeOptions,
}

#[derive(Debug, Serialize)]
pub struct UpgradeOptions {
    pub pro: String,
    pub pro_plus: String,
}

#[derive(Debug, Serialize)]
pub struct ProfilePostsResponse {
    pub posts: Vec<Post>,
    pub profile_url: String,
}

#[derive(Debug, Serialize)]
pub struct KeywordSearchResponse {
    pub posts: Vec<Post>,
    pub search_term: String,
    pub timestamp: DateTime<Utc>,
}

/// ProPlus aggregate over the whole catalog.
#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub total_posts: usize,
    pub total_reactions: u64,
    pub total_comments: u64,
    pub total_shares: u64,
    pub top_authors: Vec<AuthorEngagement>,
}

#[derive(Debug, Serialize)]
pub struct AuthorEngagement {
    pub name: String,
    pub profile_url: String,
    pub posts: usize,
    pub reactions: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_parses_upstream_shape() {
        let raw = r#"{
            "text": "Leadership is service.",
            "parsed_datetime": "2024-05-01T12:00:00Z",
            "author": {
                "name": "Simon Sinek",
                "headline": "Optimist and Author",
                "profile_url": "https://linkedin.com/in/simonsinek"
            },
            "engagement": {"reactions": 15000, "comments": 500, "shares": 1000},
            "post_url": "https://linkedin.com/posts/1"
        }"#;

        let post: Post = serde_json::from_str(raw).unwrap();
        assert_eq!(post.author.as_ref().unwrap().name, "Simon Sinek");
        assert_eq!(post.engagement.unwrap().reactions, 15000);
    }

    #[test]
    fn test_post_tolerates_missing_author_and_engagement() {
        let raw = r#"{
            "text": "Anonymous wisdom.",
            "parsed_datetime": "2024-05-01T12:00:00Z",
            "post_url": "https://linkedin.com/posts/2"
        }"#;

        let post: Post = serde_json::from_str(raw).unwrap();
        assert!(post.author.is_none());
        assert!(post.engagement.is_none());

        // Absent blocks stay absent on the way out.
        let json = serde_json::to_value(&post).unwrap();
        assert!(json.get("author").is_none());
        assert!(json.get("engagement").is_none());
    }
}
