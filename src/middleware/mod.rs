//! Ambient HTTP middleware: request logging and auth-endpoint rate limiting.

pub mod logging;
pub mod rate_limit;

pub use logging::track_requests;
pub use rate_limit::{auth_rate_limit, AuthRateLimiter};
