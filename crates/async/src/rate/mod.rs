//! Rate limiting for zero-argument actions
//!
//! This module provides:
//! - [`Debouncer`] / [`debounce`] - Collapse bursts into one delayed execution
//! - [`Throttler`] / [`throttle`] - Run at most once per interval, drop the rest
//! - [`RateLimitConfig`] - Serializable delay/interval configuration
//!
//! ```text
//! trigger:   x x x x        x            x x
//! debounce:         ····▲         ····▲        ····▲
//! throttle:  ▲              ▲            ▲
//! ```
//!
//! Triggers never block the caller. Each wrapper owns its own state; nothing
//! is shared between instances.

mod config;
mod debounce;
mod throttle;

pub use config::RateLimitConfig;
pub use debounce::{debounce, Debouncer};
pub use throttle::{throttle, Throttler};

use std::sync::Arc;

/// Shared action invoked by the wrappers
pub(crate) type Action = Arc<dyn Fn() + Send + Sync>;
