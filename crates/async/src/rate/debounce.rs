//! Debounced actions

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::trace;

use super::config::RateLimitConfig;
use super::Action;

/// Collapses bursts of triggers into a single delayed execution
///
/// Each [`trigger`](Self::trigger) cancels the pending execution, if it has
/// not started yet, and schedules a new one `delay` later. A burst of
/// triggers closer together than `delay` therefore runs the action once,
/// `delay` after the last trigger.
///
/// The timer runs as a task on the runtime captured at construction. A
/// pending execution still fires if the debouncer is dropped; use
/// [`cancel`](Self::cancel) to prevent it.
pub struct Debouncer {
    action: Action,
    delay: Duration,
    runtime: Handle,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    /// Create a debouncer on the current tokio runtime
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn new<F>(action: F, delay: Duration) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::with_handle(Handle::current(), action, delay)
    }

    /// Create a debouncer whose timers run on the given runtime
    pub fn with_handle<F>(runtime: Handle, action: F, delay: Duration) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            action: Arc::new(action),
            delay,
            runtime,
            pending: Mutex::new(None),
        }
    }

    /// Create a debouncer from a configuration
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn from_config<F>(action: F, config: &RateLimitConfig) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::new(action, config.period)
    }

    /// (Re)schedule the action `delay` from now
    pub fn trigger(&self) {
        let action = Arc::clone(&self.action);
        let delay = self.delay;

        let mut pending = self.pending.lock();
        if let Some(previous) = pending.take() {
            // No effect once the action has started running
            previous.abort();
        }
        *pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            action();
        }));

        trace!(?delay, "debounce timer scheduled");
    }

    /// Cancel the pending execution
    ///
    /// Returns `true` if an execution was pending.
    pub fn cancel(&self) -> bool {
        match self.pending.lock().take() {
            Some(handle) => {
                let was_pending = !handle.is_finished();
                handle.abort();
                was_pending
            }
            None => false,
        }
    }

    /// Whether an execution is scheduled and has not finished yet
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// The debounce delay
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debouncer")
            .field("delay", &self.delay)
            .field("pending", &self.is_pending())
            .finish()
    }
}

/// Wrap `action` in a debounced trigger
///
/// # Panics
///
/// Panics if called outside of a tokio runtime.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use utilkit_async::debounce;
///
/// # tokio_test::block_on(async {
/// let save = debounce(|| println!("saved"), Duration::from_millis(100));
///
/// save(); // cancelled
/// save(); // cancelled
/// save(); // runs 100ms from now
/// # });
/// ```
pub fn debounce<F>(action: F, delay: Duration) -> impl Fn() + Send + Sync + 'static
where
    F: Fn() + Send + Sync + 'static,
{
    let debouncer = Debouncer::new(action, delay);
    move || debouncer.trigger()
}
