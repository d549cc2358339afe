//! Outstanding-work counter
//!
//! Backs both the task group and the worker pool: each unit of work is added
//! before it is handed off and marked done once it has finished.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::warn;

/// Counter of outstanding work with an async wait-for-zero
///
/// Cloning yields another handle to the same counter.
///
/// # Example
///
/// ```
/// use utilkit_async::WaitGroup;
///
/// # tokio_test::block_on(async {
/// let wait_group = WaitGroup::new();
///
/// let guard = wait_group.enter();
/// tokio::spawn(async move {
///     // ... work ...
///     drop(guard);
/// });
///
/// wait_group.wait().await;
/// assert_eq!(wait_group.count(), 0);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct WaitGroup {
    counter: Arc<watch::Sender<usize>>,
}

impl Default for WaitGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitGroup {
    /// Create an empty wait group
    pub fn new() -> Self {
        let (counter, _) = watch::channel(0);
        Self {
            counter: Arc::new(counter),
        }
    }

    /// Add `n` units of outstanding work
    pub fn add(&self, n: usize) {
        if n == 0 {
            return;
        }
        self.counter.send_modify(|count| *count += n);
    }

    /// Mark one unit of work as done
    ///
    /// Calling this more often than [`add`](Self::add) leaves the counter at
    /// zero and logs a warning.
    pub fn done(&self) {
        self.counter.send_if_modified(|count| {
            if *count == 0 {
                warn!("wait group marked done more times than work was added");
                return false;
            }
            *count -= 1;
            true
        });
    }

    /// Add one unit of work and return a guard that marks it done on drop
    pub fn enter(&self) -> WaitGuard {
        self.add(1);
        WaitGuard {
            group: self.clone(),
        }
    }

    /// Current number of outstanding units
    pub fn count(&self) -> usize {
        *self.counter.borrow()
    }

    /// Wait until the counter reaches zero
    ///
    /// Returns immediately if nothing is outstanding.
    pub async fn wait(&self) {
        let mut rx = self.counter.subscribe();
        // The sender is owned by `self`, so the channel stays open while we wait.
        let _ = rx.wait_for(|count| *count == 0).await;
    }
}

/// Marks one unit of work done when dropped
///
/// Dropping on unwind or task abort still releases the unit, so waiters are
/// never stuck behind a task that died.
#[derive(Debug)]
#[must_use = "dropping the guard immediately marks the work as done"]
pub struct WaitGuard {
    group: WaitGroup,
}

impl Drop for WaitGuard {
    fn drop(&mut self) {
        self.group.done();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_test::{assert_pending, assert_ready, task};

    use super::*;

    #[tokio::test]
    async fn test_wait_on_empty_group_returns_immediately() {
        let wait_group = WaitGroup::new();
        let mut wait = task::spawn(wait_group.wait());
        assert_ready!(wait.poll());
    }

    #[tokio::test]
    async fn test_wait_pending_until_done() {
        let wait_group = WaitGroup::new();
        wait_group.add(2);

        let mut wait = task::spawn(wait_group.wait());
        assert_pending!(wait.poll());

        wait_group.done();
        assert!(wait.is_woken());
        assert_pending!(wait.poll());

        wait_group.done();
        assert!(wait.is_woken());
        assert_ready!(wait.poll());
    }

    #[test]
    fn test_done_without_add_saturates() {
        let wait_group = WaitGroup::new();
        wait_group.done();
        assert_eq!(wait_group.count(), 0);

        wait_group.add(1);
        assert_eq!(wait_group.count(), 1);
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let wait_group = WaitGroup::new();
        let first = wait_group.enter();
        let second = wait_group.enter();
        assert_eq!(wait_group.count(), 2);

        drop(first);
        assert_eq!(wait_group.count(), 1);
        drop(second);
        assert_eq!(wait_group.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_across_spawned_tasks() {
        let wait_group = WaitGroup::new();

        for i in 0..5u64 {
            let guard = wait_group.enter();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10 * i)).await;
                drop(guard);
            });
        }

        assert_eq!(wait_group.count(), 5);
        wait_group.wait().await;
        assert_eq!(wait_group.count(), 0);
    }

    #[tokio::test]
    async fn test_guard_released_when_task_panics() {
        let wait_group = WaitGroup::new();
        let guard = wait_group.enter();

        let handle = tokio::spawn(async move {
            let _guard = guard;
            panic!("worker failed");
        });

        assert!(handle.await.unwrap_err().is_panic());
        wait_group.wait().await;
        assert_eq!(wait_group.count(), 0);
    }
}
