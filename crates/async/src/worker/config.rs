//! Worker pool configuration

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConfigError;

/// Environment variable for the worker count
pub const ENV_POOL_WORKERS: &str = "UTILKIT_POOL_WORKERS";

/// Environment variable for the queue capacity
pub const ENV_POOL_QUEUE_CAPACITY: &str = "UTILKIT_POOL_QUEUE_CAPACITY";

/// Environment variable for the pool name
pub const ENV_POOL_NAME: &str = "UTILKIT_POOL_NAME";

/// Queue slots per worker when no capacity is configured
const QUEUE_SLOTS_PER_WORKER: usize = 2;

/// Worker pool configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkerPoolConfig {
    /// Pool name used in logs (generated if not provided)
    pub name: String,

    /// Number of workers, fixed for the life of the pool
    pub workers: usize,

    /// Capacity of the task queue (defaults to twice the worker count)
    #[serde(default)]
    pub queue_capacity: Option<usize>,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            name: format!("pool-{}", Uuid::now_v7()),
            workers: 1,
            queue_capacity: None,
        }
    }
}

impl WorkerPoolConfig {
    /// Create a configuration with the given number of workers
    ///
    /// A count of zero is raised to one.
    pub fn new(workers: usize) -> Self {
        Self::default().with_workers(workers)
    }

    /// Set the pool name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the number of workers (at least one)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the queue capacity (at least one)
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity.max(1));
        self
    }

    /// Worker count the pool will actually run
    pub fn effective_workers(&self) -> usize {
        self.workers.max(1)
    }

    /// Queue capacity the pool will actually use
    pub fn effective_queue_capacity(&self) -> usize {
        self.queue_capacity
            .unwrap_or(self.effective_workers() * QUEUE_SLOTS_PER_WORKER)
            .max(1)
    }

    /// Validate the configuration
    ///
    /// Pools clamp out-of-range values on construction; this is for callers
    /// that want to reject them instead, e.g. when loading from the
    /// environment.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Empty("name".into()));
        }
        if self.workers == 0 {
            return Err(ConfigError::OutOfRange {
                key: "workers".into(),
                value: 0,
                min: 1,
            });
        }
        if self.queue_capacity == Some(0) {
            return Err(ConfigError::OutOfRange {
                key: "queue_capacity".into(),
                value: 0,
                min: 1,
            });
        }
        Ok(())
    }

    /// Load configuration from environment variables
    ///
    /// Reads [`ENV_POOL_WORKERS`], [`ENV_POOL_QUEUE_CAPACITY`] and
    /// [`ENV_POOL_NAME`]; unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through a variable lookup function
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(name) = lookup(ENV_POOL_NAME) {
            config.name = name;
        }
        if let Some(raw) = lookup(ENV_POOL_WORKERS) {
            config.workers = parse_count(ENV_POOL_WORKERS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_POOL_QUEUE_CAPACITY) {
            config.queue_capacity = Some(parse_count(ENV_POOL_QUEUE_CAPACITY, &raw)?);
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_count(key: &str, raw: &str) -> Result<usize, ConfigError> {
    raw.trim()
        .parse::<usize>()
        .map_err(|err| ConfigError::invalid_value(key, raw, err))
}
