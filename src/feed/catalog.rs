//! Post Catalog
//! Mission: File-backed read-only post storage behind the gated feed

use crate::feed::models::{AuthorEngagement, Engagement, InsightsResponse, Post, PostAuthor};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

const TOP_VOICES_FILE: &str = "topvoice_posts.json";
const KEYWORD_POSTS_FILE: &str = "keyword_posts.json";
const TOP_VOICES_CAP: usize = 100;
const TOP_AUTHORS_CAP: usize = 5;

/// In-memory catalog loaded once at startup.
///
/// Fetching fresh posts from the upstream scrape webhook is a separate
/// ingestion concern; this only serves what is on disk, falling back to a
/// small built-in sample when the files are absent so a fresh checkout still
/// renders a feed.
pub struct PostCatalog {
    top_voices: Vec<Post>,
    keyword_posts: Vec<Post>,
}

impl PostCatalog {
    pub fn load(data_dir: &str) -> Self {
        let dir = Path::new(data_dir);

        let top_voices = match load_posts(&dir.join(TOP_VOICES_FILE)) {
            Ok(posts) => posts,
            Err(e) => {
                warn!("Top-voices file unavailable, using samples: {}", e);
                sample_posts()
            }
        };

        let keyword_posts = match load_posts(&dir.join(KEYWORD_POSTS_FILE)) {
            Ok(posts) => posts,
            Err(e) => {
                warn!("Keyword-posts file unavailable, using samples: {}", e);
                sample_posts()
            }
        };

        let catalog = Self::from_posts(top_voices, keyword_posts);
        info!(
            "📰 Post catalog loaded: {} top-voice posts, {} searchable posts",
            catalog.top_voices.len(),
            catalog.keyword_posts.len()
        );
        catalog
    }

    /// Build a catalog directly from post lists (used by tests and seeding).
    pub fn from_posts(mut top_voices: Vec<Post>, keyword_posts: Vec<Post>) -> Self {
        // Newest first, capped, decided once at load.
        top_voices.sort_by(|a, b| b.parsed_datetime.cmp(&a.parsed_datetime));
        top_voices.truncate(TOP_VOICES_CAP);

        Self {
            top_voices,
            keyword_posts,
        }
    }

    /// Newest-first top-voices list, already capped.
    pub fn top_voices(&self) -> &[Post] {
        &self.top_voices
    }

    /// Posts by one author, matched on profile URL.
    pub fn posts_for_profile(&self, profile_url: &str) -> Vec<Post> {
        let wanted = profile_url.trim().trim_end_matches('/');
        self.keyword_posts
            .iter()
            .filter(|p| {
                p.author
                    .as_ref()
                    .map(|a| a.profile_url.trim_end_matches('/') == wanted)
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    /// Case-insensitive substring match over text, author name, and headline.
    pub fn search(&self, keyword: &str) -> Vec<Post> {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.keyword_posts
            .iter()
            .filter(|p| {
                p.text.to_lowercase().contains(&needle)
                    || p.author.as_ref().is_some_and(|a| {
                        a.name.to_lowercase().contains(&needle)
                            || a.headline.to_lowercase().contains(&needle)
                    })
            })
            .cloned()
            .collect()
    }

    /// Engagement aggregate over everything the catalog holds.
    pub fn insights(&self) -> InsightsResponse {
        let all = self.top_voices.iter().chain(self.keyword_posts.iter());

        let mut total_reactions = 0u64;
        let mut total_comments = 0u64;
        let mut total_shares = 0u64;
        let mut total_posts = 0usize;
        let mut by_author: HashMap<String, AuthorEngagement> = HashMap::new();

        for post in all {
            total_posts += 1;
            let engagement = post.engagement.unwrap_or_default();
            total_reactions += engagement.reactions;
            total_comments += engagement.comments;
            total_shares += engagement.shares;

            if let Some(author) = &post.author {
                let entry = by_author
                    .entry(author.profile_url.clone())
                    .or_insert_with(|| AuthorEngagement {
                        name: author.name.clone(),
                        profile_url: author.profile_url.clone(),
                        posts: 0,
                        reactions: 0,
                    });
                entry.posts += 1;
                entry.reactions += engagement.reactions;
            }
        }

        let mut top_authors: Vec<AuthorEngagement> = by_author.into_values().collect();
        top_authors.sort_by(|a, b| b.reactions.cmp(&a.reactions));
        top_authors.truncate(TOP_AUTHORS_CAP);

        InsightsResponse {
            total_posts,
            total_reactions,
            total_comments,
            total_shares,
            top_authors,
        }
    }
}

fn load_posts(path: &Path) -> Result<Vec<Post>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let posts: Vec<Post> =
        serde_json::from_str(&raw).with_context(|| format!("Malformed {}", path.display()))?;
    Ok(posts)
}

fn sample_posts() -> Vec<Post> {
    let now = Utc::now();
    vec![
        sample_post(
            "Leadership isn't about being in charge. It's about taking care of those in your charge.",
            "Simon Sinek",
            "Optimist and Author",
            "https://linkedin.com/in/simonsinek",
            Engagement { reactions: 15000, comments: 500, shares: 1000 },
            now - Duration::hours(2),
        ),
        sample_post(
            "The biggest risk is not taking any risk. The only strategy guaranteed to fail is not taking risks.",
            "Mark Zuckerberg",
            "CEO at Meta",
            "https://linkedin.com/in/markzuckerberg",
            Engagement { reactions: 20000, comments: 800, shares: 1500 },
            now - Duration::hours(5),
        ),
        sample_post(
            "Hire character. Train skill.",
            "Adam Grant",
            "Organizational Psychologist",
            "https://linkedin.com/in/adamgrant",
            Engagement { reactions: 9000, comments: 300, shares: 450 },
            now - Duration::hours(9),
        ),
    ]
}

fn sample_post(
    text: &str,
    name: &str,
    headline: &str,
    profile_url: &str,
    engagement: Engagement,
    at: DateTime<Utc>,
) -> Post {
    Post {
        text: text.to_string(),
        parsed_datetime: at,
        author: Some(PostAuthor {
            name: name.to_string(),
            headline: headline.to_string(),
            profile_url: profile_url.to_string(),
        }),
        engagement: Some(engagement),
        post_url: format!("{}/latest", profile_url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(text: &str, author: &str, profile: &str, reactions: u64, hours_ago: i64) -> Post {
        sample_post(
            text,
            author,
            "Builder",
            profile,
            Engagement {
                reactions,
                comments: 1,
                shares: 0,
            },
            Utc::now() - Duration::hours(hours_ago),
        )
    }

    #[test]
    fn test_top_voices_sorted_newest_first_and_capped() {
        let posts: Vec<Post> = (0..150)
            .map(|i| post(&format!("post {}", i), "A", "https://l.in/a", 1, i))
            .collect();
        let catalog = PostCatalog::from_posts(posts, vec![]);

        let top = catalog.top_voices();
        assert_eq!(top.len(), 100);
        assert!(top
            .windows(2)
            .all(|w| w[0].parsed_datetime >= w[1].parsed_datetime));
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let posts = vec![
            post("Rust makes systems safer", "Niko", "https://l.in/niko", 5, 1),
            post("Gardening tips", "Ferris Fan", "https://l.in/ferris", 2, 2),
            post("Nothing relevant", "Bob", "https://l.in/bob", 1, 3),
        ];
        let catalog = PostCatalog::from_posts(vec![], posts);

        // Matches post text.
        assert_eq!(catalog.search("RUST").len(), 1);
        // Matches author name.
        assert_eq!(catalog.search("ferris").len(), 1);
        // No matches.
        assert!(catalog.search("cobol").is_empty());
        // Blank keywords match nothing rather than everything.
        assert!(catalog.search("   ").is_empty());
    }

    #[test]
    fn test_profile_lookup_tolerates_trailing_slash() {
        let posts = vec![
            post("one", "Niko", "https://l.in/niko", 5, 1),
            post("two", "Niko", "https://l.in/niko", 3, 2),
            post("other", "Bob", "https://l.in/bob", 1, 3),
        ];
        let catalog = PostCatalog::from_posts(vec![], posts);

        assert_eq!(catalog.posts_for_profile("https://l.in/niko").len(), 2);
        assert_eq!(catalog.posts_for_profile("https://l.in/niko/").len(), 2);
        assert!(catalog.posts_for_profile("https://l.in/ghost").is_empty());
    }

    #[test]
    fn test_insights_aggregates_and_ranks_authors() {
        let posts = vec![
            post("a", "Niko", "https://l.in/niko", 10, 1),
            post("b", "Niko", "https://l.in/niko", 20, 2),
            post("c", "Bob", "https://l.in/bob", 5, 3),
        ];
        let catalog = PostCatalog::from_posts(vec![], posts);

        let insights = catalog.insights();
        assert_eq!(insights.total_posts, 3);
        assert_eq!(insights.total_reactions, 35);
        assert_eq!(insights.top_authors[0].name, "Niko");
        assert_eq!(insights.top_authors[0].reactions, 30);
        assert_eq!(insights.top_authors[0].posts, 2);
    }

    #[test]
    fn test_missing_files_fall_back_to_samples() {
        let catalog = PostCatalog::load("/nonexistent/dir");
        assert!(!catalog.top_voices().is_empty());
    }
}
