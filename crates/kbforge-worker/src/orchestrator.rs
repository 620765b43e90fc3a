//! Job orchestrator: asynchronous acceptance, dispatch and worker pool

use crate::error::{lock, store_err, WorkerError};
use crate::metrics::WorkerMetrics;
use crate::queue::JobQueue;
use crate::runner::{JobRunner, JobSubmission, SharedStore};
use crate::worker::{ModelLoader, SharedMetrics, Worker};
use crate::WorkerConfig;
use kbforge_domain::traits::{ContentStore, JobStore, RelationModel};
use kbforge_domain::{Job, JobId};
use kbforge_extractor::ExtractorConfig;
use std::fmt::Display;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::interval;

/// Accepts extraction jobs and runs them on a pool of workers
///
/// A submission is validated and persisted synchronously, then queued; the
/// caller gets the job id back immediately and observes progress through
/// [`job`](Self::job). A dispatcher also polls the store so jobs created by
/// other processes, or left pending by a previous run, are picked up.
///
/// # Examples
///
/// ```no_run
/// use kbforge_domain::{ItemId, JobRequest};
/// use kbforge_extractor::ExtractorConfig;
/// use kbforge_model::{HttpRelationModel, ModelConfig};
/// use kbforge_store::SqliteStore;
/// use kbforge_worker::{JobOrchestrator, JobSubmission, WorkerConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = SqliteStore::new("kbforge.db")?;
///     let model_config = ModelConfig::default();
///     let loader = move || HttpRelationModel::new(&model_config);
///
///     let orchestrator = JobOrchestrator::start(
///         store,
///         loader,
///         ExtractorConfig::default(),
///         WorkerConfig::default(),
///     )?;
///
///     let id = orchestrator
///         .submit(JobSubmission::new("ideas", JobRequest::new(vec![ItemId(1)], vec![])))
///         .await?;
///     let job = orchestrator.wait_for(id, std::time::Duration::from_millis(500)).await?;
///     println!("{} is {}", job.id, job.status);
///
///     orchestrator.shutdown().await?;
///     Ok(())
/// }
/// ```
pub struct JobOrchestrator<S> {
    runner: JobRunner<S>,
    queue: JobQueue,
    metrics: SharedMetrics,
    workers: Vec<JoinHandle<()>>,
    dispatcher: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
}

impl<S> JobOrchestrator<S>
where
    S: ContentStore + JobStore + Send + 'static,
    <S as ContentStore>::Error: Display,
    <S as JobStore>::Error: Display,
{
    /// Start the dispatcher and `worker_count` workers
    ///
    /// Must be called from within a tokio runtime. Models are loaded lazily by
    /// each worker when it receives its first job.
    pub fn start<L>(
        store: S,
        loader: L,
        extractor_config: ExtractorConfig,
        config: WorkerConfig,
    ) -> Result<Self, WorkerError>
    where
        L: ModelLoader,
        <L::Model as RelationModel>::Error: Display,
    {
        config.validate().map_err(WorkerError::Config)?;
        extractor_config.validate().map_err(WorkerError::Config)?;

        let store: SharedStore<S> = Arc::new(Mutex::new(store));
        let runner = JobRunner::new(Arc::clone(&store), extractor_config);
        let (queue, receiver) = JobQueue::new(config.queue_capacity);
        let metrics: SharedMetrics = Arc::new(Mutex::new(WorkerMetrics::new()));
        let loader = Arc::new(loader);

        let workers = (0..config.worker_count)
            .map(|id| {
                let worker = Worker {
                    id,
                    runner: runner.clone(),
                    loader: Arc::clone(&loader),
                    receiver: Arc::clone(&receiver),
                    queued: queue.queued(),
                    config: config.clone(),
                    metrics: Arc::clone(&metrics),
                };
                tokio::spawn(worker.run())
            })
            .collect();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let dispatcher = tokio::spawn(dispatch(
            store,
            queue.clone(),
            config.poll_interval(),
            shutdown_rx,
        ));

        tracing::info!(
            "Job orchestrator started ({} workers, timeout {}s, poll {}s)",
            config.worker_count,
            config.job_timeout_secs,
            config.poll_interval_secs
        );

        Ok(Self {
            runner,
            queue,
            metrics,
            workers,
            dispatcher,
            shutdown_tx,
        })
    }

    /// Validate, persist and queue a job
    ///
    /// Returns as soon as the job is stored as pending. Unresolvable ids fail
    /// here with [`WorkerError::Validation`] and no job is created.
    pub async fn submit(&self, submission: JobSubmission) -> Result<JobId, WorkerError> {
        let job = self.runner.submit(submission)?;
        self.queue.enqueue(job.id).await?;
        Ok(job.id)
    }

    /// Create and queue a new job from a failed one
    pub async fn retry(&self, job_id: JobId) -> Result<JobId, WorkerError> {
        let job = self.runner.retry(job_id)?;
        self.queue.enqueue(job.id).await?;
        Ok(job.id)
    }

    /// Current state of a job
    pub fn job(&self, job_id: JobId) -> Result<Option<Job>, WorkerError> {
        self.runner.job(job_id)
    }

    /// Most recently created job
    pub fn latest_job(&self) -> Result<Option<Job>, WorkerError> {
        lock(self.runner.store())?.latest_job().map_err(store_err)
    }

    /// Poll until a job reaches a terminal state
    pub async fn wait_for(&self, job_id: JobId, poll: Duration) -> Result<Job, WorkerError> {
        loop {
            let job = self
                .job(job_id)?
                .ok_or_else(|| WorkerError::NotFound(job_id.to_string()))?;
            if job.status.is_terminal() {
                return Ok(job);
            }
            tokio::time::sleep(poll).await;
        }
    }

    /// Snapshot of the pool metrics
    pub fn metrics(&self) -> Result<WorkerMetrics, WorkerError> {
        Ok(lock(&self.metrics)?.clone())
    }

    /// The shared store
    pub fn store(&self) -> &SharedStore<S> {
        self.runner.store()
    }

    /// Stop dispatching, let workers drain the queue, and wait for them
    pub async fn shutdown(self) -> Result<WorkerMetrics, WorkerError> {
        let Self {
            queue,
            metrics,
            workers,
            dispatcher,
            shutdown_tx,
            ..
        } = self;

        shutdown_tx.send_replace(true);
        dispatcher
            .await
            .map_err(|e| WorkerError::Worker(format!("Dispatcher join error: {}", e)))?;

        // Workers exit once the last sender is gone and the queue is empty
        drop(queue);
        for worker in workers {
            worker
                .await
                .map_err(|e| WorkerError::Worker(format!("Worker join error: {}", e)))?;
        }

        let metrics = lock(&metrics)?.clone();
        tracing::info!("Job orchestrator stopped. Final metrics:\n{}", metrics.summary());
        Ok(metrics)
    }

    /// Run until Ctrl+C, then shut down gracefully
    pub async fn run_until_ctrl_c(self) -> Result<WorkerMetrics, WorkerError> {
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| WorkerError::Worker(format!("Failed to listen for Ctrl+C: {}", e)))?;
        tracing::info!("Shutdown signal received, draining queue");
        self.shutdown().await
    }
}

/// Periodically queue pending jobs found in the store
async fn dispatch<S>(
    store: SharedStore<S>,
    queue: JobQueue,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) where
    S: JobStore + Send + 'static,
    S::Error: Display,
{
    let mut ticker = interval(every);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let pending = match lock(&store).and_then(|s| s.pending_jobs().map_err(store_err)) {
                    Ok(pending) => pending,
                    Err(e) => {
                        tracing::error!("Dispatcher could not list pending jobs: {}", e);
                        continue;
                    }
                };

                let mut queued = 0;
                for job_id in pending {
                    match queue.try_enqueue(job_id) {
                        Ok(true) => queued += 1,
                        Ok(false) => {}
                        Err(e) => {
                            tracing::warn!("Dispatcher stopped queueing: {}", e);
                            break;
                        }
                    }
                }
                if queued > 0 {
                    tracing::debug!("Dispatcher queued {} pending jobs", queued);
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    tracing::debug!("Dispatcher stopped");
}
