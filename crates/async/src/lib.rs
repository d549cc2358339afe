//! # Async Utilities
//!
//! Small, independent concurrency primitives for tokio applications.
//!
//! ## Features
//!
//! - **Parallel map**: fan a transform out over a sequence and collect results in input order
//! - **Task groups**: run fallible tasks concurrently and keep the first error
//! - **Worker pools**: a fixed set of workers draining a bounded task queue
//! - **Debounce / throttle**: rate-limit zero-argument actions
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────┐   ┌──────────────────────────────┐
//! │           fanout             │   │            worker            │
//! │  parallel_map   TaskGroup    │   │  WorkerPool (N workers)      │
//! │  (one task per element)      │   │  submit → [bounded queue]    │
//! └──────────────┬───────────────┘   └──────────────┬───────────────┘
//!                │                                  │
//!                ▼                                  ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        sync::WaitGroup                          │
//! │           (outstanding-task counter, wait until zero)           │
//! └─────────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            rate                                 │
//! │   Debouncer (reschedule pending timer)   Throttler (drop calls) │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use utilkit_async::prelude::*;
//!
//! let squares = parallel_map(vec![1, 2, 3], |x| async move { x * x }).await;
//! assert_eq!(squares, vec![1, 4, 9]);
//!
//! let pool = WorkerPool::new(4);
//! pool.submit((0..10).map(|i| Task::from_fn(move || println!("task {i}")))).await;
//! pool.wait().await;
//! pool.close().await;
//! ```

pub mod error;
pub mod fanout;
pub mod rate;
pub mod sync;
pub mod worker;

/// Prelude for common imports
pub mod prelude {
    pub use crate::error::ConfigError;
    pub use crate::fanout::{parallel_map, parallel_map_blocking, TaskGroup};
    pub use crate::rate::{debounce, throttle, Debouncer, RateLimitConfig, Throttler};
    pub use crate::sync::{WaitGroup, WaitGuard};
    pub use crate::worker::{Task, WorkerPool, WorkerPoolConfig, WorkerPoolStats, WorkerPoolStatus};
}

// Re-export key types at crate root
pub use error::ConfigError;
pub use fanout::{parallel_map, parallel_map_blocking, TaskGroup};
pub use rate::{debounce, throttle, Debouncer, RateLimitConfig, Throttler};
pub use sync::{WaitGroup, WaitGuard};
pub use worker::{Task, WorkerPool, WorkerPoolConfig, WorkerPoolStats, WorkerPoolStatus};
