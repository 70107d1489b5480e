//! Request admission for the HTTP layer.
//!
//! Only rate limiting lives here: a per-client sliding window applied to
//! the MCP endpoint. `/health` is never limited.

pub mod rate_limit;

pub use rate_limit::{
    client_key, rate_limit_middleware, RateLimitConfig, RateLimiter, RATE_LIMITED_MESSAGE,
};
