//! Email delivery worker configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Background email delivery worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WorkerConfig {
    /// Whether the worker is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Interval in seconds between candidate polls.
    #[serde(default = "default_poll_interval")]
    #[validate(range(min = 1))]
    pub poll_interval_seconds: u64,
    /// Maximum number of candidates fetched per poll.
    #[serde(default = "default_batch_size")]
    #[validate(range(min = 1, max = 1000))]
    pub batch_size: u32,
    /// Lease taken on each claimed notification, in seconds.
    #[serde(default = "default_lease")]
    #[validate(range(min = 1))]
    pub lease_seconds: u64,
    /// Transient failures tolerated before a delivery is marked failed.
    #[serde(default = "default_max_attempts")]
    #[validate(range(min = 1, max = 100))]
    pub max_attempts: u32,
    /// Seconds to wait for an in-flight cycle during shutdown.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_seconds: u64,
}

impl WorkerConfig {
    /// The poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    /// The claim lease as a [`Duration`].
    pub fn lease(&self) -> Duration {
        Duration::from_secs(self.lease_seconds)
    }

    /// How long a retry entry outlives its retry time when its row is no
    /// longer a candidate. Covers one full poll gap.
    pub fn retry_horizon(&self) -> Duration {
        self.lease() + self.poll_interval().max(self.lease())
    }

    /// How long shutdown waits for the worker.
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_seconds)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            poll_interval_seconds: default_poll_interval(),
            batch_size: default_batch_size(),
            lease_seconds: default_lease(),
            max_attempts: default_max_attempts(),
            shutdown_grace_seconds: default_shutdown_grace(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    30
}

fn default_batch_size() -> u32 {
    50
}

fn default_lease() -> u64 {
    120
}

fn default_max_attempts() -> u32 {
    5
}

fn default_shutdown_grace() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_horizon_covers_poll_gap() {
        let config = WorkerConfig {
            poll_interval_seconds: 600,
            lease_seconds: 5,
            ..WorkerConfig::default()
        };
        assert_eq!(config.retry_horizon(), Duration::from_secs(605));

        let short_poll = WorkerConfig {
            poll_interval_seconds: 1,
            lease_seconds: 30,
            ..WorkerConfig::default()
        };
        assert_eq!(short_poll.retry_horizon(), Duration::from_secs(60));
    }
}
