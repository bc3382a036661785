//! Application-layer rate limiting for login, registration and public
//! storefront submissions

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::AppError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;

struct IpEntry {
    count: u32,
    window_start: Instant,
}

#[derive(Clone, Default)]
pub struct RateLimiter {
    /// route name -> (IP -> entry)
    inner: Arc<Mutex<HashMap<&'static str, HashMap<String, IpEntry>>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the request is allowed, `false` if rate-limited.
    pub async fn check(
        &self,
        route: &'static str,
        ip: &str,
        max_requests: u32,
        window_secs: u64,
    ) -> bool {
        let mut map = self.inner.lock().await;
        let route_map = map.entry(route).or_default();
        let now = Instant::now();

        let entry = route_map.entry(ip.to_owned()).or_insert_with(|| IpEntry {
            count: 0,
            window_start: now,
        });

        // Reset window if expired
        if now.duration_since(entry.window_start).as_secs() >= window_secs {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;
        entry.count <= max_requests
    }

    /// Remove entries older than 5 minutes
    pub async fn cleanup(&self) {
        let mut map = self.inner.lock().await;
        let cutoff = std::time::Duration::from_secs(300);
        let now = Instant::now();

        for route_map in map.values_mut() {
            route_map.retain(|_, entry| now.duration_since(entry.window_start) < cutoff);
        }

        map.retain(|_, route_map| !route_map.is_empty());
    }

    #[cfg(test)]
    async fn tracked(&self, route: &'static str) -> usize {
        self.inner.lock().await.get(route).map_or(0, |m| m.len())
    }
}

/// Extract client IP: X-Forwarded-For header first (load balancer), then peer address.
fn extract_ip(request: &Request) -> String {
    if let Some(forwarded) = request.headers().get("x-forwarded-for")
        && let Ok(val) = forwarded.to_str()
    {
        // X-Forwarded-For can be comma-separated; first entry is the original client
        if let Some(first) = val.split(',').next() {
            let ip = first.trim();
            if !ip.is_empty() {
                return ip.to_owned();
            }
        }
    }

    request
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

async fn limit(
    state: &crate::state::AppState,
    route: &'static str,
    max_requests: u32,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = extract_ip(&request);
    if !state.rate_limiter.check(route, &ip, max_requests, 60).await {
        tracing::warn!(route, ip = %ip, "Rate limit exceeded");
        return Err(AppError::too_many_requests());
    }
    Ok(next.run(request).await)
}

/// Rate limit middleware for login: 5 requests/minute per IP
pub async fn login_rate_limit(
    State(state): State<crate::state::AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    limit(&state, "login", 5, request, next).await
}

/// Rate limit middleware for registration: 3 requests/minute per IP
pub async fn register_rate_limit(
    State(state): State<crate::state::AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    limit(&state, "register", 3, request, next).await
}

/// Rate limit middleware for public contact/reservation forms: 10 requests/minute per IP
pub async fn submission_rate_limit(
    State(state): State<crate::state::AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    limit(&state, "submission", 10, request, next).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_limit_per_ip_and_route() {
        let limiter = RateLimiter::new();
        for _ in 0..3 {
            assert!(limiter.check("register", "10.0.0.1", 3, 60).await);
        }
        assert!(!limiter.check("register", "10.0.0.1", 3, 60).await);
        // other IP and other route are independent
        assert!(limiter.check("register", "10.0.0.2", 3, 60).await);
        assert!(limiter.check("login", "10.0.0.1", 3, 60).await);
    }

    #[tokio::test]
    async fn test_expired_window_resets() {
        let limiter = RateLimiter::new();
        // a zero-length window is always expired
        for _ in 0..10 {
            assert!(limiter.check("login", "10.0.0.1", 1, 0).await);
        }
    }

    #[tokio::test]
    async fn test_cleanup_keeps_recent_entries() {
        let limiter = RateLimiter::new();
        limiter.check("login", "10.0.0.1", 5, 60).await;
        limiter.cleanup().await;
        assert_eq!(limiter.tracked("login").await, 1);
    }

    #[test]
    fn test_extract_ip_prefers_forwarded_header() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(extract_ip(&request), "203.0.113.7");

        let request = Request::builder().body(axum::body::Body::empty()).unwrap();
        assert_eq!(extract_ip(&request), "unknown");
    }
}
