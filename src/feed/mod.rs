//! Feed Module
//! Mission: Serve the tier-gated read-only post feed

pub mod api;
pub mod catalog;
pub mod models;

pub use catalog::PostCatalog;
pub use models::Post;
