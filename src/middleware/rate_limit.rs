//! Auth Rate Limiting
//! Mission: Damp credential-guessing against the public auth endpoints

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// Per-IP sliding-window limiter for registration and login.
///
/// Each IP keeps the timestamps of its recent hits; a request is rejected once
/// the window holds `max_requests + burst` of them. Stale IPs are dropped by
/// [`prune`](Self::prune), called periodically from main.
#[derive(Clone)]
pub struct AuthRateLimiter {
    max_requests: u32,
    burst: u32,
    window: Duration,
    hits: Arc<Mutex<HashMap<IpAddr, Vec<Instant>>>>,
}

impl AuthRateLimiter {
    pub fn new(max_requests: u32, burst: u32, window: Duration) -> Self {
        Self {
            max_requests,
            burst,
            window,
            hits: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record a hit for `ip` and decide whether it may proceed. Returns the
    /// wait until the oldest hit leaves the window when rejected.
    fn check(&self, ip: IpAddr) -> Result<(), Duration> {
        let now = Instant::now();
        let mut hits = self.hits.lock();
        let entry = hits.entry(ip).or_default();

        entry.retain(|t| now.duration_since(*t) < self.window);

        let limit = (self.max_requests + self.burst) as usize;
        if entry.len() >= limit {
            let oldest = entry.first().copied().unwrap_or(now);
            let retry_after = self.window.saturating_sub(now.duration_since(oldest));
            return Err(retry_after);
        }

        entry.push(now);
        Ok(())
    }

    /// Drop IPs whose hits have all aged out of the window.
    pub fn prune(&self) {
        let now = Instant::now();
        let window = self.window;
        self.hits
            .lock()
            .retain(|_, times| times.iter().any(|t| now.duration_since(*t) < window));
    }
}

/// Middleware applied to the public auth routes only; gated routes already
/// require a valid token and are not worth throttling here.
pub async fn auth_rate_limit(
    State(limiter): State<AuthRateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    // Router tests run without connect-info; they share one bucket.
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
        .unwrap_or(IpAddr::from([0, 0, 0, 0]));

    match limiter.check(ip) {
        Ok(()) => next.run(request).await,
        Err(retry_after) => {
            let retry_secs = retry_after.as_secs().max(1);
            warn!(ip = %ip, retry_after_secs = retry_secs, "Auth rate limit exceeded");

            let body = serde_json::json!({
                "error": "rate_limited",
                "message": "Too many attempts. Please wait and try again.",
                "retry_after_seconds": retry_secs,
            });

            (
                StatusCode::TOO_MANY_REQUESTS,
                [("Retry-After", retry_secs.to_string())],
                Json(body),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_allows_up_to_limit_plus_burst() {
        let limiter = AuthRateLimiter::new(5, 2, Duration::from_secs(60));

        for _ in 0..7 {
            assert!(limiter.check(ip("10.0.0.1")).is_ok());
        }
        assert!(limiter.check(ip("10.0.0.1")).is_err());
    }

    #[test]
    fn test_ips_are_independent() {
        let limiter = AuthRateLimiter::new(1, 0, Duration::from_secs(60));

        assert!(limiter.check(ip("10.0.0.1")).is_ok());
        assert!(limiter.check(ip("10.0.0.1")).is_err());
        assert!(limiter.check(ip("10.0.0.2")).is_ok());
    }

    #[test]
    fn test_window_expiry_frees_budget() {
        let limiter = AuthRateLimiter::new(1, 0, Duration::from_millis(20));

        assert!(limiter.check(ip("10.0.0.1")).is_ok());
        assert!(limiter.check(ip("10.0.0.1")).is_err());

        std::thread::sleep(Duration::from_millis(30));
        assert!(limiter.check(ip("10.0.0.1")).is_ok());
    }

    #[test]
    fn test_rejection_reports_retry_after() {
        let limiter = AuthRateLimiter::new(1, 0, Duration::from_secs(60));
        limiter.check(ip("10.0.0.1")).unwrap();

        let retry_after = limiter.check(ip("10.0.0.1")).unwrap_err();
        assert!(retry_after <= Duration::from_secs(60));
    }

    #[test]
    fn test_prune_drops_stale_ips() {
        let limiter = AuthRateLimiter::new(5, 0, Duration::from_millis(10));
        limiter.check(ip("10.0.0.1")).unwrap();

        std::thread::sleep(Duration::from_millis(20));
        limiter.prune();
        assert!(limiter.hits.lock().is_empty());
    }
}
