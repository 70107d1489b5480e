//! Per-client sliding-window rate limiting.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use crate::mcp::{codes, JsonRpcResponse};

/// Message returned with a 429.
pub const RATE_LIMITED_MESSAGE: &str = "Rate limit exceeded. Try again shortly.";

/// Rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: u32,
    /// Time window duration.
    pub window: Duration,
    /// Whether rate limiting is enabled.
    pub enabled: bool,
    /// Maximum number of tracked clients (memory limit).
    pub max_tracked_clients: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window: Duration::from_secs(60),
            enabled: true,
            max_tracked_clients: 10000,
        }
    }
}

impl RateLimitConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn custom(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
            ..Default::default()
        }
    }
}

/// Request timestamps for one client inside the current window.
#[derive(Debug, Default)]
struct ClientWindow {
    timestamps: Vec<Instant>,
}

impl ClientWindow {
    fn prune(&mut self, now: Instant, window: Duration) -> u32 {
        self.timestamps
            .retain(|&t| now.saturating_duration_since(t) < window);
        self.timestamps.len() as u32
    }
}

/// Thread-safe rate limiter keyed by client.
#[derive(Debug)]
pub struct RateLimiter {
    clients: RwLock<HashMap<String, ClientWindow>>,
    config: RateLimitConfig,
    last_cleanup: RwLock<Instant>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            config,
            last_cleanup: RwLock::new(Instant::now()),
        }
    }

    pub fn disabled() -> Self {
        Self::new(RateLimitConfig::disabled())
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Check whether a request from `key` is allowed now.
    ///
    /// Returns `Ok(remaining)` if allowed, `Err(retry_after)` if rate limited.
    pub fn check(&self, key: &str) -> Result<u32, Duration> {
        self.check_at(key, Instant::now())
    }

    /// [`check`](Self::check) against an explicit instant.
    pub fn check_at(&self, key: &str, now: Instant) -> Result<u32, Duration> {
        if !self.config.enabled {
            return Ok(self.config.max_requests);
        }

        self.maybe_cleanup(now);

        let mut clients = match self.clients.write() {
            Ok(c) => c,
            Err(_) => return Ok(self.config.max_requests), // fail open
        };

        if !clients.contains_key(key) && clients.len() >= self.config.max_tracked_clients {
            make_room(&mut clients, now, self.config.window, self.config.max_tracked_clients);
        }

        let window = clients.entry(key.to_string()).or_default();
        let count = window.prune(now, self.config.window);

        if count >= self.config.max_requests {
            let retry_after = window
                .timestamps
                .first()
                .map(|&t| {
                    self.config
                        .window
                        .saturating_sub(now.saturating_duration_since(t))
                })
                .unwrap_or(self.config.window);
            return Err(retry_after);
        }

        window.timestamps.push(now);
        Ok(self.config.max_requests - count - 1)
    }

    fn maybe_cleanup(&self, now: Instant) {
        let horizon = self.config.window * 2;
        let due = self
            .last_cleanup
            .read()
            .map(|t| now.saturating_duration_since(*t) > horizon)
            .unwrap_or(false);
        if !due {
            return;
        }

        let Ok(mut last) = self.last_cleanup.write() else {
            return;
        };
        if now.saturating_duration_since(*last) <= horizon {
            return;
        }
        *last = now;

        if let Ok(mut clients) = self.clients.write() {
            clients.retain(|_, w| {
                w.timestamps
                    .last()
                    .is_some_and(|&t| now.saturating_duration_since(t) < horizon)
            });

            if clients.len() > self.config.max_tracked_clients {
                let mut entries: Vec<_> = clients
                    .iter()
                    .map(|(key, w)| (key.clone(), w.timestamps.last().copied()))
                    .collect();
                entries.sort_by_key(|(_, t)| *t);

                let excess = clients.len() - self.config.max_tracked_clients;
                for (key, _) in entries.into_iter().take(excess) {
                    clients.remove(&key);
                }
            }
        }
    }

    pub fn tracked_clients(&self) -> usize {
        self.clients.read().map(|c| c.len()).unwrap_or(0)
    }
}

/// Shrink the table below `cap`: drop clients with nothing in the current
/// window, then the least recently seen ones.
fn make_room(
    clients: &mut HashMap<String, ClientWindow>,
    now: Instant,
    window: Duration,
    cap: usize,
) {
    clients.retain(|_, w| {
        w.timestamps
            .last()
            .is_some_and(|&t| now.saturating_duration_since(t) < window)
    });

    while clients.len() >= cap.max(1) {
        let oldest = clients
            .iter()
            .min_by_key(|(_, w)| w.timestamps.last().copied())
            .map(|(key, _)| key.clone());
        match oldest {
            Some(key) => {
                clients.remove(&key);
            }
            None => break,
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

/// Rate-limit key for a request: first `x-forwarded-for` entry, else the
/// peer address, else `"unknown"`.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match (forwarded, peer) {
        (Some(client), _) => client.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => "unknown".to_string(),
    }
}

/// Rate limit middleware for axum.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    if !limiter.is_enabled() {
        return next.run(request).await;
    }

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(request.headers(), peer);
    let limit = HeaderValue::from(limiter.config.max_requests);

    match limiter.check(&key) {
        Ok(remaining) => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert("X-RateLimit-Limit", limit);
            headers.insert("X-RateLimit-Remaining", HeaderValue::from(remaining));
            response
        }
        Err(retry_after) => {
            warn!(client = %key, "Rate limit exceeded");
            // Whole seconds, rounded up.
            let retry_secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);

            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(JsonRpcResponse::error(
                    None,
                    codes::SERVER_ERROR,
                    RATE_LIMITED_MESSAGE,
                )),
            )
                .into_response();

            let headers = response.headers_mut();
            headers.insert("Retry-After", HeaderValue::from(retry_secs.max(1)));
            headers.insert("X-RateLimit-Limit", limit);
            headers.insert("X-RateLimit-Remaining", HeaderValue::from(0u32));
            response
        }
    }
}
