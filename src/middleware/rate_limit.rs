use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderName, HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::Config;

pub const RATE_LIMIT_MESSAGE: &str = "Too many requests from this IP, please try again later.";

const X_RATELIMIT_LIMIT: &str = "x-ratelimit-limit";
const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_in: Duration,
}

/// Fixed-window request counter keyed by client address. A client's window opens on its
/// first request and resets on the first request after it has elapsed.
#[derive(Debug)]
pub struct RateLimiter {
    windows: DashMap<String, Window>,
    window: Duration,
    max_requests: u32,
    trust_proxy: bool,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            windows: DashMap::new(),
            window,
            max_requests,
            trust_proxy: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            trust_proxy: config.trust_proxy,
            ..Self::new(config.rate_limit_window(), config.rate_limit_max_requests)
        }
    }

    /// Counts one request for `client` and reports whether it fits in the current window.
    pub fn check(&self, client: &str) -> RateLimitDecision {
        let now = Instant::now();
        let mut entry = self.windows.entry(client.to_string()).or_insert(Window {
            count: 0,
            started: now,
        });

        if now.duration_since(entry.started) >= self.window {
            entry.count = 0;
            entry.started = now;
        }
        entry.count = entry.count.saturating_add(1);

        let count = entry.count;
        let reset_in = self.window.saturating_sub(now.duration_since(entry.started));

        RateLimitDecision {
            allowed: count <= self.max_requests,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(count),
            reset_in,
        }
    }

    /// Drops every window that has already elapsed.
    pub fn prune_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.duration_since(w.started) < self.window);
        before - self.windows.len()
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// Runs `prune_expired` once per window for the life of the process.
    pub fn spawn_pruner(self: &Arc<Self>) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(limiter.window);
            loop {
                ticker.tick().await;
                let pruned = limiter.prune_expired();
                if pruned > 0 {
                    tracing::debug!("pruned {} idle rate-limit windows", pruned);
                }
            }
        })
    }

    fn client_identity(&self, req: &Request<Body>) -> String {
        let remote_ip = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string());

        let forwarded = if self.trust_proxy {
            forwarded_ip(req.headers())
        } else {
            None
        };

        forwarded
            .or(remote_ip.as_deref())
            .unwrap_or("unknown")
            .trim()
            .to_string()
    }

    pub async fn check_rate_limit(self: Arc<Self>, req: Request<Body>, next: Next) -> Response {
        let ip = self.client_identity(&req);
        let decision = self.check(&ip);

        if !decision.allowed {
            tracing::debug!("rate limit exceeded for {}", ip);
            let retry_after = decision.reset_in.as_millis().div_ceil(1000) as u64;
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, HeaderValue::from(retry_after))],
                RATE_LIMIT_MESSAGE,
            )
                .into_response();
            apply_headers(response.headers_mut(), &decision);
            return response;
        }

        let mut response = next.run(req).await;
        apply_headers(response.headers_mut(), &decision);
        response
    }
}

// X-Real-IP first, then the first non-empty X-Forwarded-For entry
fn forwarded_ip(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .filter(|ip| !ip.trim().is_empty())
        .or_else(|| {
            headers
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').find(|ip| !ip.trim().is_empty()))
        })
}

fn apply_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    headers.insert(
        HeaderName::from_static(X_RATELIMIT_LIMIT),
        HeaderValue::from(decision.limit),
    );
    headers.insert(
        HeaderName::from_static(X_RATELIMIT_REMAINING),
        HeaderValue::from(decision.remaining),
    );
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    limiter.check_rate_limit(req, next).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn rejects_once_max_is_exceeded() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 5);
        for expected_remaining in (0..5).rev() {
            let decision = limiter.check("10.0.0.1");
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }

        let sixth = limiter.check("10.0.0.1");
        assert!(!sixth.allowed);
        assert_eq!(sixth.remaining, 0);
        assert_eq!(sixth.reset_in, Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn clients_are_counted_separately() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 1);
        assert!(limiter.check("a").allowed);
        assert!(!limiter.check("a").allowed);
        assert!(limiter.check("b").allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn window_resets_after_it_elapses() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 2);
        limiter.check("a");
        limiter.check("a");
        assert!(!limiter.check("a").allowed);

        tokio::time::advance(Duration::from_secs(60)).await;
        let decision = limiter.check("a");
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn burst_across_boundary_admits_twice_max() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 3);
        limiter.check("a");
        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(limiter.check("a").allowed);
        assert!(limiter.check("a").allowed);

        tokio::time::advance(Duration::from_secs(1)).await;
        for _ in 0..3 {
            assert!(limiter.check("a").allowed);
        }
        assert!(!limiter.check("a").allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn prune_drops_only_elapsed_windows() {
        let limiter = RateLimiter::new(Duration::from_secs(10), 5);
        limiter.check("old");
        tokio::time::advance(Duration::from_secs(6)).await;
        limiter.check("new");
        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(limiter.prune_expired(), 1);
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn real_ip_header_wins_over_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("1.1.1.1, 2.2.2.2"));
        assert_eq!(forwarded_ip(&headers), Some("1.1.1.1"));

        headers.insert("x-real-ip", HeaderValue::from_static("3.3.3.3"));
        assert_eq!(forwarded_ip(&headers), Some("3.3.3.3"));
    }

    #[test]
    fn proxy_headers_ignored_unless_trusted() {
        let limiter = RateLimiter::new(Duration::from_secs(1), 1);
        let mut req = Request::builder()
            .uri("/earthquakes")
            .header("x-real-ip", "3.3.3.3")
            .body(Body::empty())
            .unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 5000))));
        assert_eq!(limiter.client_identity(&req), "127.0.0.1");

        let trusting = RateLimiter {
            trust_proxy: true,
            ..RateLimiter::new(Duration::from_secs(1), 1)
        };
        assert_eq!(trusting.client_identity(&req), "3.3.3.3");
    }
}
