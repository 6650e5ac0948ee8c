//! Subscription Module
//! Mission: Tier resolution, license activation, and access gating

pub mod access;
pub mod api;
pub mod authority;
pub mod gumroad;
pub mod models;

pub use access::{authorize, Access, FeedResource};
pub use authority::{resolve_tier, SubscriptionAuthority};
pub use gumroad::{GumroadClient, LicenseVerifier};
pub use models::{SubscriptionState, SubscriptionStatus, Tier};
