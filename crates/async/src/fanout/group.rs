//! Error-collecting task group
//!
//! Runs fallible tasks concurrently and keeps the first error by completion
//! time.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use tracing::{debug, trace};

use super::panic_message;
use crate::sync::WaitGroup;

/// A set of concurrently running fallible tasks
///
/// [`spawn`](Self::spawn) starts a task right away on the tokio runtime.
/// [`wait`](Self::wait) waits for every task and returns the first error, by
/// completion order rather than spawn order. Later errors are discarded.
///
/// Handles are cheap to clone and all refer to the same group, so a running
/// task can spawn further work into its own group. `wait` consumes the
/// handle it is called on; a group is not meant to be reused once waited.
///
/// # Example
///
/// ```
/// use utilkit_async::TaskGroup;
///
/// # tokio_test::block_on(async {
/// let group = TaskGroup::new();
/// for i in 0..5 {
///     group.spawn(async move {
///         if i == 3 {
///             return Err(format!("error at {i}"));
///         }
///         Ok(())
///     });
/// }
///
/// assert_eq!(group.wait().await, Err("error at 3".to_string()));
/// # });
/// ```
pub struct TaskGroup<E> {
    inner: Arc<GroupState<E>>,
}

struct GroupState<E> {
    outstanding: WaitGroup,
    /// Write-once: the first failing task sets it
    error: Mutex<Option<E>>,
    panic: Mutex<Option<Box<dyn Any + Send>>>,
    discarded: AtomicUsize,
}

impl<E> GroupState<E> {
    fn record_error(&self, err: E) {
        let mut slot = self.error.lock();
        if slot.is_none() {
            *slot = Some(err);
            trace!("task group retained first error");
        } else {
            let discarded = self.discarded.fetch_add(1, Ordering::Relaxed) + 1;
            debug!(discarded, "task group discarded later error");
        }
    }

    fn record_panic(&self, payload: Box<dyn Any + Send>) {
        debug!(panic = panic_message(payload.as_ref()), "task group task panicked");
        let mut slot = self.panic.lock();
        if slot.is_none() {
            *slot = Some(payload);
        }
    }
}

impl<E> TaskGroup<E>
where
    E: Send + 'static,
{
    /// Create an empty task group
    pub fn new() -> Self {
        Self {
            inner: Arc::new(GroupState {
                outstanding: WaitGroup::new(),
                error: Mutex::new(None),
                panic: Mutex::new(None),
                discarded: AtomicUsize::new(0),
            }),
        }
    }

    /// Spawn a fallible task into the group
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
    {
        let guard = self.inner.outstanding.enter();
        let state = Arc::clone(&self.inner);

        tokio::spawn(async move {
            match AssertUnwindSafe(task).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => state.record_error(err),
                Err(payload) => state.record_panic(payload),
            }
            // Released only after the outcome is recorded
            drop(guard);
        });
    }

    /// Number of spawned tasks that have not finished yet
    pub fn outstanding(&self) -> usize {
        self.inner.outstanding.count()
    }

    /// Wait for every spawned task and return the first error
    ///
    /// Returns `Ok(())` if every task succeeded or nothing was spawned. If a
    /// task panicked, the panic is resumed here once all tasks have finished.
    pub async fn wait(self) -> Result<(), E> {
        self.inner.outstanding.wait().await;

        let panicked = self.inner.panic.lock().take();
        if let Some(payload) = panicked {
            panic::resume_unwind(payload);
        }

        match self.inner.error.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<E> Default for TaskGroup<E>
where
    E: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for TaskGroup<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> fmt::Debug for TaskGroup<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskGroup")
            .field("outstanding", &self.inner.outstanding.count())
            .field("failed", &self.inner.error.lock().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test_log::test(tokio::test(start_paused = true))]
    async fn test_all_succeed() {
        let group: TaskGroup<String> = TaskGroup::new();

        for _ in 0..5 {
            group.spawn(async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(())
            });
        }

        assert_eq!(group.outstanding(), 5);
        assert_eq!(group.wait().await, Ok(()));
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn test_one_fails() {
        let group = TaskGroup::new();

        for i in 0..5 {
            group.spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                if i == 2 {
                    return Err(format!("error at {i}"));
                }
                Ok(())
            });
        }

        assert_eq!(group.wait().await, Err("error at 2".to_string()));
    }

    #[tokio::test]
    async fn test_no_tasks() {
        let group: TaskGroup<anyhow::Error> = TaskGroup::new();
        assert!(group.wait().await.is_ok());
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn test_first_error_by_completion_order() {
        let group = TaskGroup::new();

        group.spawn(async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            Err("slow")
        });
        group.spawn(async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Err("fast")
        });
        group.spawn(async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Err("medium")
        });

        assert_eq!(group.wait().await, Err("fast"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_waits_for_successes_after_failure() {
        let finished = Arc::new(AtomicUsize::new(0));
        let group = TaskGroup::new();

        group.spawn(async { Err("immediate") });
        for _ in 0..3 {
            let finished = Arc::clone(&finished);
            group.spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                finished.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        assert_eq!(group.wait().await, Err("immediate"));
        assert_eq!(finished.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nested_spawn() {
        let group: TaskGroup<&'static str> = TaskGroup::new();
        let handle = group.clone();

        group.spawn(async move {
            handle.spawn(async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Err("nested")
            });
            Ok(())
        });

        assert_eq!(group.wait().await, Err("nested"));
    }

    async fn explode() -> Result<(), String> {
        panic!("task exploded")
    }

    #[tokio::test]
    #[should_panic(expected = "task exploded")]
    async fn test_panic_resumed_on_wait() {
        let group: TaskGroup<String> = TaskGroup::new();
        group.spawn(explode());
        group.spawn(async { Ok(()) });

        let _ = group.wait().await;
    }

    #[test]
    fn test_debug_output() {
        let group: TaskGroup<String> = TaskGroup::new();
        let debug = format!("{group:?}");
        assert!(debug.contains("outstanding: 0"));
        assert!(debug.contains("failed: false"));
    }
}
