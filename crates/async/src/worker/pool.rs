//! Worker pool for task execution
//!
//! Runs submitted tasks on a fixed number of workers with a bounded queue and
//! graceful shutdown.

use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, debug_span, error, instrument, trace, Instrument};

use super::config::WorkerPoolConfig;
use super::task::Task;
use crate::fanout::panic_message;
use crate::sync::WaitGroup;

/// Worker pool status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerPoolStatus {
    /// Accepting submissions, workers pulling from the queue
    Running,
    /// Closing: no new submissions, workers draining the queue
    Draining,
    /// All workers have exited
    Stopped,
}

impl std::fmt::Display for WorkerPoolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Draining => write!(f, "draining"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Snapshot of pool counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerPoolStats {
    /// Tasks accepted into the queue
    pub submitted: u64,
    /// Tasks that ran to completion
    pub completed: u64,
    /// Tasks that panicked
    pub panicked: u64,
    /// Tasks dropped because the pool was closed
    pub dropped: u64,
}

/// Counters shared with the workers
#[derive(Debug, Default)]
struct PoolCounters {
    submitted: AtomicU64,
    completed: AtomicU64,
    panicked: AtomicU64,
    dropped: AtomicU64,
    active: AtomicUsize,
}

impl PoolCounters {
    fn snapshot(&self) -> WorkerPoolStats {
        WorkerPoolStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Queue receiver shared by all workers
type SharedQueue = Arc<tokio::sync::Mutex<mpsc::Receiver<Task>>>;

/// Fixed-size pool of workers draining a bounded task queue
///
/// At most `workers` tasks run at the same time. Submissions after
/// [`close`](Self::close) are dropped silently. Dropping the pool without
/// closing it closes the queue; workers finish the queued tasks in the
/// background and exit.
///
/// # Example
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use utilkit_async::{Task, WorkerPool};
///
/// # tokio_test::block_on(async {
/// let pool = WorkerPool::new(3);
/// let counter = Arc::new(AtomicUsize::new(0));
///
/// pool.submit((0..10).map(|_| {
///     let counter = Arc::clone(&counter);
///     Task::from_fn(move || {
///         counter.fetch_add(1, Ordering::SeqCst);
///     })
/// }))
/// .await;
///
/// pool.wait().await;
/// assert_eq!(counter.load(Ordering::SeqCst), 10);
///
/// pool.close().await;
/// # });
/// ```
pub struct WorkerPool {
    config: WorkerPoolConfig,
    workers: usize,
    sender: Mutex<Option<mpsc::Sender<Task>>>,
    pending: WaitGroup,
    status: Arc<watch::Sender<WorkerPoolStatus>>,
    counters: Arc<PoolCounters>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Create a pool with `workers` workers (zero is raised to one)
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn new(workers: usize) -> Self {
        Self::with_config(WorkerPoolConfig::new(workers))
    }

    /// Create a pool from a configuration
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn with_config(config: WorkerPoolConfig) -> Self {
        let workers = config.effective_workers();
        let capacity = config.effective_queue_capacity();

        let (sender, receiver) = mpsc::channel(capacity);
        let queue: SharedQueue = Arc::new(tokio::sync::Mutex::new(receiver));
        let pending = WaitGroup::new();
        let counters = Arc::new(PoolCounters::default());
        let (status, _) = watch::channel(WorkerPoolStatus::Running);
        let status = Arc::new(status);

        let handles: Vec<JoinHandle<()>> = (0..workers)
            .map(|id| {
                let span = debug_span!("worker", pool = %config.name, id);
                tokio::spawn(
                    run_worker(id, Arc::clone(&queue), pending.clone(), Arc::clone(&counters))
                        .instrument(span),
                )
            })
            .collect();

        debug!(pool = %config.name, workers, capacity, "worker pool started");

        Self {
            config,
            workers,
            sender: Mutex::new(Some(sender)),
            pending,
            status,
            counters,
            handles: Mutex::new(handles),
        }
    }

    /// Submit tasks to the pool
    ///
    /// Accepts anything that yields `Task` or `Option<Task>`; `None` entries
    /// are skipped. Waits for queue capacity when the queue is full. If the
    /// pool is closing or closed the tasks are dropped.
    ///
    /// Cancel safe: tasks already queued stay queued, the task waiting for
    /// capacity is dropped and never counted as pending.
    #[instrument(skip_all, fields(pool = %self.config.name))]
    pub async fn submit<I>(&self, tasks: I)
    where
        I: IntoIterator,
        I::Item: Into<Option<Task>>,
    {
        let tasks = tasks.into_iter().filter_map(Into::<Option<Task>>::into);

        // Clone out of the lock so a full queue never blocks `close`
        let sender = self.sender.lock().clone();
        let Some(sender) = sender else {
            let dropped = tasks.count();
            self.record_dropped(dropped);
            return;
        };

        for task in tasks {
            let Ok(permit) = sender.reserve().await else {
                // Receiver gone: every worker has exited
                self.record_dropped(1);
                continue;
            };
            // No await between counting and enqueueing
            self.pending.add(1);
            permit.send(task);
            self.counters.submitted.fetch_add(1, Ordering::Relaxed);
            trace!("task queued");
        }
    }

    /// Submit a single future
    pub async fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.submit([Task::new(future)]).await;
    }

    /// Wait until every task submitted so far has finished
    ///
    /// The pool stays open and can take more work afterwards.
    pub async fn wait(&self) {
        self.pending.wait().await;
    }

    /// Stop accepting work, drain the queue and wait for the workers to exit
    ///
    /// Safe to call more than once or concurrently: only the first call
    /// closes the queue, every call waits until the pool has stopped. The
    /// drain runs in its own task, so dropping a `close` future does not
    /// stop the pool from reaching [`WorkerPoolStatus::Stopped`].
    #[instrument(skip(self), fields(pool = %self.config.name))]
    pub async fn close(&self) {
        let first = self.status.send_if_modified(|status| {
            if *status == WorkerPoolStatus::Running {
                *status = WorkerPoolStatus::Draining;
                true
            } else {
                false
            }
        });

        if first {
            debug!(pending = self.pending.count(), "draining worker pool");

            // Dropping the last sender closes the queue once it is empty
            drop(self.sender.lock().take());

            let handles = std::mem::take(&mut *self.handles.lock());
            tokio::spawn(
                drain_workers(handles, Arc::clone(&self.status), Arc::clone(&self.counters))
                    .in_current_span(),
            );
        }

        let mut rx = self.status.subscribe();
        let _ = rx
            .wait_for(|status| *status == WorkerPoolStatus::Stopped)
            .await;
    }

    /// Current lifecycle status
    pub fn status(&self) -> WorkerPoolStatus {
        *self.status.borrow()
    }

    /// Pool name
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Number of workers
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Tasks submitted but not finished (queued or running)
    pub fn pending(&self) -> usize {
        self.pending.count()
    }

    /// Tasks currently running
    pub fn active(&self) -> usize {
        self.counters.active.load(Ordering::Relaxed)
    }

    /// Snapshot of the pool counters
    pub fn stats(&self) -> WorkerPoolStats {
        self.counters.snapshot()
    }

    fn record_dropped(&self, count: usize) {
        if count == 0 {
            return;
        }
        self.counters
            .dropped
            .fetch_add(count as u64, Ordering::Relaxed);
        debug!(count, status = %self.status(), "pool not accepting tasks, dropped submission");
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("name", &self.config.name)
            .field("workers", &self.workers)
            .field("status", &self.status())
            .field("pending", &self.pending())
            .finish()
    }
}

/// Join every worker, then mark the pool stopped
async fn drain_workers(
    handles: Vec<JoinHandle<()>>,
    status: Arc<watch::Sender<WorkerPoolStatus>>,
    counters: Arc<PoolCounters>,
) {
    for handle in handles {
        if let Err(err) = handle.await {
            error!("worker exited abnormally: {}", err);
        }
    }

    status.send_replace(WorkerPoolStatus::Stopped);
    debug!(stats = ?counters.snapshot(), "worker pool stopped");
}

/// Worker loop: take one task, run it, mark it done, until the queue closes
async fn run_worker(
    id: usize,
    queue: SharedQueue,
    pending: WaitGroup,
    counters: Arc<PoolCounters>,
) {
    trace!("worker started");

    loop {
        let next = {
            let mut receiver = queue.lock().await;
            receiver.recv().await
        };
        let Some(task) = next else {
            break;
        };

        counters.active.fetch_add(1, Ordering::Relaxed);
        let outcome = task.run().await;
        counters.active.fetch_sub(1, Ordering::Relaxed);

        match outcome {
            Ok(()) => {
                counters.completed.fetch_add(1, Ordering::Relaxed);
            }
            Err(payload) => {
                counters.panicked.fetch_add(1, Ordering::Relaxed);
                error!(worker = id, panic = panic_message(payload.as_ref()), "task panicked");
            }
        }
        pending.done();
    }

    debug!(worker = id, "worker exited");
}
