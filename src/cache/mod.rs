//! 缓存模块：带 TTL 的进程级搜索结果缓存，时钟可注入。
//!
//! # Cache Module
//!
//! A small key/value cache collaborator handed to the search executor. It is
//! built once per process; tests inject a [`ManualClock`] to exercise expiry
//! deterministically.
//!
//! ```rust
//! use chat_relay::cache::{ManualClock, TtlCache};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let clock = Arc::new(ManualClock::new());
//! let cache = TtlCache::with_clock(Duration::from_secs(300), clock.clone());
//! cache.set("tavily:rust", "## Search results");
//! clock.advance(Duration::from_secs(301));
//! assert!(cache.get("tavily:rust").is_none());
//! ```

mod backend;
mod clock;

pub use backend::TtlCache;
pub use clock::{Clock, ManualClock, SystemClock};
