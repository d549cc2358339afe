//! Fixed-size worker pool
//!
//! This module provides:
//! - [`WorkerPool`] - N workers draining a shared bounded queue
//! - [`WorkerPoolConfig`] - Pool name, worker count and queue capacity
//! - [`Task`] - A unit of work submitted to the pool
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       WorkerPool                             │
//! │                                                              │
//! │  submit() ──► ┌──────────────────────────┐                   │
//! │               │  bounded queue (mpsc)    │ capacity 2 × N    │
//! │               └────────────┬─────────────┘                   │
//! │                            │ shared receiver                 │
//! │            ┌───────────────┼───────────────┐                 │
//! │            ▼               ▼               ▼                 │
//! │      [worker 0]      [worker 1]  ...  [worker N-1]           │
//! │            │               │               │                 │
//! │            └───────────────┴───────────────┘                 │
//! │                            ▼                                 │
//! │                 WaitGroup (pending tasks)                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Lifecycle
//!
//! ```text
//! ┌─────────┐    close()    ┌──────────┐   workers exited   ┌─────────┐
//! │ Running │ ────────────► │ Draining │ ─────────────────► │ Stopped │
//! └─────────┘               └──────────┘                    └─────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use utilkit_async::worker::{Task, WorkerPool, WorkerPoolConfig};
//!
//! let pool = WorkerPool::with_config(
//!     WorkerPoolConfig::new(3)
//!         .with_name("thumbnails")
//!         .with_queue_capacity(16),
//! );
//!
//! pool.submit(images.into_iter().map(|image| Task::new(render(image)))).await;
//! pool.wait().await;
//!
//! // Graceful shutdown
//! pool.close().await;
//! ```

mod config;
mod pool;
mod task;

pub use config::{WorkerPoolConfig, ENV_POOL_NAME, ENV_POOL_QUEUE_CAPACITY, ENV_POOL_WORKERS};
pub use pool::{WorkerPool, WorkerPoolStats, WorkerPoolStatus};
pub use task::Task;
