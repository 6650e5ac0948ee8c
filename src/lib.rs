//! VoiceGate Backend Library
//!
//! Credential and subscription authorization core plus the tier-gated feed,
//! exposed for the server binary, the admin CLI, and the integration tests.

pub mod app;
pub mod auth;
pub mod config;
pub mod feed;
pub mod middleware;
pub mod subscription;
