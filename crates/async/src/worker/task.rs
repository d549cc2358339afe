//! Units of work for the worker pool

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::future::BoxFuture;
use futures::FutureExt;

/// A unit of work with no result
///
/// Failures are the task's own business: the pool has no error channel.
/// Optional tasks (`Option<Task>`) can be submitted; `None` entries are
/// skipped.
pub struct Task {
    future: BoxFuture<'static, ()>,
}

impl Task {
    /// Wrap a future
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            future: future.boxed(),
        }
    }

    /// Wrap a synchronous closure
    ///
    /// The closure runs on an async worker, so it should not block for long.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::new(async move { f() })
    }

    /// Run the task, catching a panic instead of unwinding into the worker
    pub(crate) async fn run(self) -> Result<(), Box<dyn Any + Send>> {
        AssertUnwindSafe(self.future).catch_unwind().await
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").finish_non_exhaustive()
    }
}
