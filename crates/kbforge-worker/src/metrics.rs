//! Metrics collection for the worker pool

use std::time::Duration;

/// Counters accumulated by all workers of one orchestrator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerMetrics {
    /// Jobs that reached `ready`
    pub jobs_completed: usize,

    /// Jobs that reached `error` for any reason other than the deadline
    pub jobs_failed: usize,

    /// Jobs that reached `error` because the deadline passed
    pub jobs_timed_out: usize,

    /// Generate calls made by completed jobs
    pub model_invocations: usize,

    /// Distinct relations stored by completed jobs
    pub relations_produced: usize,

    /// Model instances loaded
    pub models_loaded: usize,

    /// Model instances dropped (job quota reached or timeout)
    pub worker_recycles: usize,

    /// Total time spent running jobs in milliseconds
    pub busy_time_ms: u64,
}

impl WorkerMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed job
    pub fn record_completed(&mut self, model_invocations: usize, relations: usize) {
        self.jobs_completed += 1;
        self.model_invocations += model_invocations;
        self.relations_produced += relations;
    }

    /// Record a failed job
    pub fn record_failed(&mut self) {
        self.jobs_failed += 1;
    }

    /// Record a job that hit its deadline
    pub fn record_timed_out(&mut self) {
        self.jobs_timed_out += 1;
    }

    /// Record a model load
    pub fn record_model_loaded(&mut self) {
        self.models_loaded += 1;
    }

    /// Record a model being dropped
    pub fn record_recycle(&mut self) {
        self.worker_recycles += 1;
    }

    /// Add time spent on a job
    pub fn record_busy(&mut self, elapsed: Duration) {
        self.busy_time_ms += elapsed.as_millis() as u64;
    }

    /// Jobs that reached a terminal state
    pub fn total_jobs(&self) -> usize {
        self.jobs_completed + self.jobs_failed + self.jobs_timed_out
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        [
            "Worker Metrics Summary".to_string(),
            "======================".to_string(),
            format!("Jobs finished: {}", self.total_jobs()),
            format!("  Completed: {}", self.jobs_completed),
            format!("  Failed: {}", self.jobs_failed),
            format!("  Timed out: {}", self.jobs_timed_out),
            format!("Model invocations: {}", self.model_invocations),
            format!("Relations produced: {}", self.relations_produced),
            format!("Models loaded: {}", self.models_loaded),
            format!("Worker recycles: {}", self.worker_recycles),
            format!("Busy time: {}ms", self.busy_time_ms),
        ]
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = WorkerMetrics::new();
        assert_eq!(metrics.total_jobs(), 0);
        assert_eq!(metrics.model_invocations, 0);
    }

    #[test]
    fn test_record_jobs() {
        let mut metrics = WorkerMetrics::new();
        metrics.record_completed(6, 4);
        metrics.record_completed(3, 1);
        metrics.record_failed();
        metrics.record_timed_out();

        assert_eq!(metrics.jobs_completed, 2);
        assert_eq!(metrics.model_invocations, 9);
        assert_eq!(metrics.relations_produced, 5);
        assert_eq!(metrics.total_jobs(), 4);
    }

    #[test]
    fn test_reset() {
        let mut metrics = WorkerMetrics::new();
        metrics.record_completed(1, 1);
        metrics.record_recycle();
        metrics.record_busy(Duration::from_millis(250));

        metrics.reset();
        assert_eq!(metrics, WorkerMetrics::default());
    }

    #[test]
    fn test_summary() {
        let mut metrics = WorkerMetrics::new();
        metrics.record_completed(3, 2);
        metrics.record_timed_out();
        metrics.record_model_loaded();
        metrics.record_recycle();
        metrics.record_busy(Duration::from_millis(120));

        let summary = metrics.summary();
        assert!(summary.contains("Jobs finished: 2"));
        assert!(summary.contains("Timed out: 1"));
        assert!(summary.contains("Model invocations: 3"));
        assert!(summary.contains("Worker recycles: 1"));
        assert!(summary.contains("Busy time: 120ms"));
    }
}
