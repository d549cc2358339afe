//! Synchronization building blocks
//!
//! This module provides:
//! - [`WaitGroup`] - Outstanding-work counter with an async "wait until zero"
//! - [`WaitGuard`] - RAII token that marks one unit of work as done on drop

mod wait_group;

pub use wait_group::{WaitGroup, WaitGuard};
