//! 弹性模块：按客户端的固定窗口限流器。
//!
//! # Resilience
//!
//! The router consults a [`RateLimiter`] before any upstream call. The
//! limiter only reports a decision; turning a rejection into a `429` with
//! `X-RateLimit-*` and `Retry-After` headers is the server's job.
//!
//! ```rust
//! use chat_relay::resilience::{RateLimiter, RateLimiterConfig};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let limiter = RateLimiter::new(RateLimiterConfig::new(2, Duration::from_secs(60)));
//! assert!(limiter.check("203.0.113.7").await.allowed);
//! assert!(limiter.check("203.0.113.7").await.allowed);
//! assert!(!limiter.check("203.0.113.7").await.allowed);
//! # });
//! ```

pub mod rate_limiter;

pub use rate_limiter::{RateLimitDecision, RateLimiter, RateLimiterConfig};
