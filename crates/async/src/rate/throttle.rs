//! Throttled actions

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::trace;

use super::config::RateLimitConfig;
use super::Action;

/// Runs an action at most once per interval, dropping calls in between
///
/// The first [`trigger`](Self::trigger) runs the action immediately on the
/// caller. Later triggers are dropped (not queued) until `interval` has
/// passed since the last execution; the next trigger after that runs
/// immediately and starts a new window.
pub struct Throttler {
    action: Action,
    interval: Duration,
    last_run: Mutex<Option<Instant>>,
}

impl Throttler {
    /// Create a throttler
    pub fn new<F>(action: F, interval: Duration) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            action: Arc::new(action),
            interval,
            last_run: Mutex::new(None),
        }
    }

    /// Create a throttler from a configuration
    pub fn from_config<F>(action: F, config: &RateLimitConfig) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::new(action, config.period)
    }

    /// Run the action if the interval has elapsed
    ///
    /// Returns `true` if the action ran.
    pub fn trigger(&self) -> bool {
        {
            let mut last_run = self.last_run.lock();
            let now = Instant::now();
            if let Some(previous) = *last_run {
                if now.duration_since(previous) < self.interval {
                    trace!("throttled call dropped");
                    return false;
                }
            }
            *last_run = Some(now);
        }

        // Lock released so the action may trigger again without deadlocking
        (self.action)();
        true
    }

    /// Forget the last execution so the next trigger runs immediately
    pub fn reset(&self) {
        *self.last_run.lock() = None;
    }

    /// The throttle interval
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl fmt::Debug for Throttler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttler")
            .field("interval", &self.interval)
            .field("last_run", &*self.last_run.lock())
            .finish()
    }
}

/// Wrap `action` in a throttled trigger
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use utilkit_async::throttle;
///
/// let refresh = throttle(|| println!("refreshed"), Duration::from_millis(100));
///
/// refresh(); // runs immediately
/// refresh(); // dropped
/// ```
pub fn throttle<F>(action: F, interval: Duration) -> impl Fn() + Send + Sync + 'static
where
    F: Fn() + Send + Sync + 'static,
{
    let throttler = Throttler::new(action, interval);
    move || {
        throttler.trigger();
    }
}
