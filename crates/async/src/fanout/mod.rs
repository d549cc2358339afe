//! Unbounded fan-out helpers
//!
//! This module provides:
//! - [`parallel_map`] - Order-preserving concurrent map over async transforms
//! - [`parallel_map_blocking`] - The same for blocking transforms
//! - [`TaskGroup`] - Concurrent fallible tasks, first error wins
//!
//! Both launch one task per unit of work with no concurrency limit. Use a
//! [`WorkerPool`](crate::worker::WorkerPool) when the amount of work is large
//! and concurrency has to be bounded.

mod group;
mod map;

pub use group::TaskGroup;
pub use map::{parallel_map, parallel_map_blocking};

use std::any::Any;

/// Best-effort human-readable message for a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
