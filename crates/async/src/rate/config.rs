//! Rate limiter configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Period of a debouncer (delay) or throttler (interval)
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use utilkit_async::RateLimitConfig;
///
/// let config = RateLimitConfig::new(Duration::from_millis(250));
/// assert_eq!(config.period, Duration::from_millis(250));
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Debounce delay or throttle interval
    #[serde(with = "duration_millis")]
    pub period: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(100),
        }
    }
}

impl RateLimitConfig {
    /// Create a configuration with the given period
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    /// Set the period
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }
}

/// Serde support for Duration as milliseconds
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
