//! Configuration for the worker pool
//!
//! Defines pool size, model recycling, job deadlines and queue polling.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the job orchestrator
///
/// # Examples
///
/// ```
/// use kbforge_worker::WorkerConfig;
///
/// // Default configuration: one worker, fresh model per job
/// let config = WorkerConfig::default();
/// assert_eq!(config.max_jobs_per_worker, 1);
/// assert_eq!(config.job_timeout_secs, 420);
///
/// // Throughput: more workers, models kept warm
/// let config = WorkerConfig::throughput();
/// assert_eq!(config.worker_count, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Concurrent workers, each holding its own model instance
    /// Default: 1 (the model is memory-heavy)
    pub worker_count: usize,

    /// Jobs a worker runs before its model is dropped and reloaded
    /// Default: 1
    pub max_jobs_per_worker: usize,

    /// Wall-clock limit for one job (in seconds)
    /// Default: 420 (7 minutes)
    pub job_timeout_secs: u64,

    /// Jobs that may wait in the in-process queue
    /// Default: 64
    pub queue_capacity: usize,

    /// How often the job store is polled for pending jobs (in seconds)
    /// Default: 5
    pub poll_interval_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_count: 1,
            max_jobs_per_worker: 1,
            job_timeout_secs: 420,
            queue_capacity: 64,
            poll_interval_secs: 5,
        }
    }
}

impl WorkerConfig {
    /// Throughput configuration (more workers, models reused across jobs)
    ///
    /// Needs memory for four resident models.
    pub fn throughput() -> Self {
        Self {
            worker_count: 4,
            max_jobs_per_worker: 25,
            job_timeout_secs: 420,
            queue_capacity: 256,
            poll_interval_secs: 2,
        }
    }

    /// Constrained configuration (single worker, short deadline, slow polling)
    ///
    /// Suitable for small machines or development.
    pub fn constrained() -> Self {
        Self {
            worker_count: 1,
            max_jobs_per_worker: 1,
            job_timeout_secs: 180,
            queue_capacity: 8,
            poll_interval_secs: 30,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".to_string());
        }
        if self.max_jobs_per_worker == 0 {
            return Err("max_jobs_per_worker must be greater than 0".to_string());
        }
        if self.job_timeout_secs == 0 {
            return Err("job_timeout_secs must be greater than 0".to_string());
        }
        if self.queue_capacity == 0 {
            return Err("queue_capacity must be greater than 0".to_string());
        }
        if self.poll_interval_secs == 0 {
            return Err("poll_interval_secs must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Get job timeout as Duration
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }

    /// Get poll interval as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
