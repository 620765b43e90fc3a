//! Pool worker: pulls job ids, holds a model, runs extractions under a deadline

use crate::error::WorkerError;
use crate::metrics::WorkerMetrics;
use crate::queue::{JobReceiver, QueuedJobs};
use crate::runner::{deadline_after, extraction_failure, JobRunner};
use crate::WorkerConfig;
use kbforge_domain::traits::{ContentStore, JobStore, RelationModel};
use kbforge_domain::{ContentItem, JobId};
use kbforge_extractor::{ExtractionStats, RelationExtractor};
use std::fmt::Display;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Produces model instances for workers
///
/// Loading is assumed to be slow and blocking; it always runs off the async
/// runtime. Any `Fn() -> Result<M, E>` closure is a loader.
pub trait ModelLoader: Send + Sync + 'static {
    /// Model type produced
    type Model: RelationModel + Send + Sync + 'static;

    /// Load a fresh model instance
    fn load(&self) -> Result<Self::Model, String>;
}

impl<F, M, E> ModelLoader for F
where
    F: Fn() -> Result<M, E> + Send + Sync + 'static,
    M: RelationModel + Send + Sync + 'static,
    E: Display,
{
    type Model = M;

    fn load(&self) -> Result<M, String> {
        self().map_err(|e| e.to_string())
    }
}

pub(crate) type SharedMetrics = Arc<Mutex<WorkerMetrics>>;

/// How a dequeued job ended
enum Processed {
    Completed(ExtractionStats),
    Failed,
    TimedOut,
}

pub(crate) struct Worker<S, L: ModelLoader> {
    pub(crate) id: usize,
    pub(crate) runner: JobRunner<S>,
    pub(crate) loader: Arc<L>,
    pub(crate) receiver: JobReceiver,
    pub(crate) queued: QueuedJobs,
    pub(crate) config: WorkerConfig,
    pub(crate) metrics: SharedMetrics,
}

/// Drop a model on a blocking thread; model clients may own their own runtime
fn release_model<M: Send + Sync + 'static>(model: Arc<M>) {
    tokio::task::spawn_blocking(move || drop(model));
}

impl<S, L> Worker<S, L>
where
    S: ContentStore + JobStore + Send + 'static,
    <S as ContentStore>::Error: Display,
    <S as JobStore>::Error: Display,
    L: ModelLoader,
    <L::Model as RelationModel>::Error: Display,
{
    fn with_metrics(&self, update: impl FnOnce(&mut WorkerMetrics)) {
        if let Ok(mut metrics) = self.metrics.lock() {
            update(&mut metrics);
        }
    }

    /// Run until the queue is closed and drained
    pub(crate) async fn run(self) {
        tracing::info!("Worker {} started", self.id);

        let mut model: Option<Arc<L::Model>> = None;
        let mut jobs_on_model = 0;

        loop {
            let next = self.receiver.lock().await.recv().await;
            let Some(job_id) = next else { break };

            self.handle(job_id, &mut model, &mut jobs_on_model).await;
            // Recorded or not, the job is no longer in flight here
            self.queued.release(job_id);
        }

        if let Some(old) = model.take() {
            release_model(old);
        }
        tracing::info!("Worker {} stopped", self.id);
    }

    async fn handle(
        &self,
        job_id: JobId,
        model: &mut Option<Arc<L::Model>>,
        jobs_on_model: &mut usize,
    ) {
        let corpus = match self.runner.load_corpus(job_id) {
            Ok(Some(corpus)) => corpus,
            Ok(None) => return,
            Err(e) => {
                self.fail(job_id, &e);
                return;
            }
        };

        let current = match model.clone() {
            Some(loaded) => loaded,
            None => match self.load_model().await {
                Ok(loaded) => {
                    *model = Some(Arc::clone(&loaded));
                    loaded
                }
                Err(e) => {
                    self.fail(job_id, &e);
                    return;
                }
            },
        };

        let started = Instant::now();
        let processed = self.process(job_id, corpus, current).await;
        *jobs_on_model += 1;

        let timed_out = matches!(processed, Processed::TimedOut);
        self.with_metrics(|metrics| {
            match &processed {
                Processed::Completed(stats) => {
                    metrics.record_completed(stats.model_calls, stats.relations)
                }
                Processed::Failed => metrics.record_failed(),
                Processed::TimedOut => metrics.record_timed_out(),
            }
            metrics.record_busy(started.elapsed());
        });

        if timed_out || *jobs_on_model >= self.config.max_jobs_per_worker {
            if let Some(old) = model.take() {
                release_model(old);
            }
            *jobs_on_model = 0;
            self.with_metrics(WorkerMetrics::record_recycle);
            tracing::debug!("Worker {} released its model", self.id);
        }
    }

    async fn load_model(&self) -> Result<Arc<L::Model>, WorkerError> {
        let loader = Arc::clone(&self.loader);
        let model = tokio::task::spawn_blocking(move || loader.load())
            .await
            .map_err(|e| WorkerError::Worker(format!("Task join error: {}", e)))?
            .map_err(WorkerError::Model)?;

        self.with_metrics(WorkerMetrics::record_model_loaded);
        tracing::debug!("Worker {} loaded a model", self.id);
        Ok(Arc::new(model))
    }

    async fn process(
        &self,
        job_id: JobId,
        corpus: Vec<ContentItem>,
        model: Arc<L::Model>,
    ) -> Processed {
        let timeout = self.config.job_timeout();
        let deadline = deadline_after(timeout);
        let extractor = RelationExtractor::from_shared(model, self.runner.config().clone());

        tracing::info!(
            "Worker {} running job {} ({} items)",
            self.id,
            job_id,
            corpus.len()
        );

        let task = tokio::task::spawn_blocking(move || {
            extractor.extract_to_json(&corpus, deadline)
        });

        // The blocking task checks the deadline between spans; the outer
        // timeout covers a single model call that never returns.
        let (processed, outcome) = match tokio::time::timeout(timeout, task).await {
            Ok(Ok(Ok((json, stats)))) => (Processed::Completed(stats), Ok(json)),
            Ok(Ok(Err(e))) => {
                let failure = extraction_failure(e, timeout);
                let processed = match failure {
                    WorkerError::Timeout(_) => Processed::TimedOut,
                    _ => Processed::Failed,
                };
                (processed, Err(failure.to_string()))
            }
            Ok(Err(e)) => (
                Processed::Failed,
                Err(WorkerError::Worker(format!("Task join error: {}", e)).to_string()),
            ),
            Err(_) => (
                Processed::TimedOut,
                Err(WorkerError::Timeout(timeout.as_secs()).to_string()),
            ),
        };

        if let Err(e) = self.runner.record(job_id, outcome) {
            tracing::error!("Worker {} could not record job {}: {}", self.id, job_id, e);
        }
        processed
    }

    /// Record a failure that happened before extraction started
    fn fail(&self, job_id: JobId, error: &WorkerError) {
        if matches!(error, WorkerError::NotFound(_)) {
            tracing::warn!("Worker {} dropped unknown job {}", self.id, job_id);
            return;
        }
        match self.runner.record(job_id, Err(error.to_string())) {
            Ok(_) => self.with_metrics(WorkerMetrics::record_failed),
            Err(e) => {
                tracing::error!("Worker {} could not record job {}: {}", self.id, job_id, e)
            }
        }
    }
}
