//! Job execution: accept, resolve, extract and record
//!
//! Everything here is synchronous. The orchestrator calls these steps from
//! async workers; the CLI calls them directly to run a job in the foreground.

use crate::error::{lock, store_err, WorkerError};
use kbforge_domain::traits::{ContentStore, JobStore, RelationModel};
use kbforge_domain::{ContentItem, Job, JobId, JobRequest, JobStatus, Privacy};
use kbforge_extractor::{merge_corpus, ExtractionStats, ExtractorConfig, ExtractorError, RelationExtractor};
use std::fmt::Display;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info};

/// Store shared by the runner, the dispatcher and all workers
pub type SharedStore<S> = Arc<Mutex<S>>;

/// Current timestamp in seconds since Unix epoch
pub(crate) fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Deadline `timeout` from now; a timeout too large to represent means none
pub(crate) fn deadline_after(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}

/// Map an extraction failure, naming the deadline when it was the cause
pub(crate) fn extraction_failure(e: ExtractorError, timeout: Duration) -> WorkerError {
    match e {
        ExtractorError::Timeout => WorkerError::Timeout(timeout.as_secs()),
        other => other.into(),
    }
}

/// A request to run an extraction job
#[derive(Debug, Clone, PartialEq)]
pub struct JobSubmission {
    /// Display name
    pub name: String,

    /// Result visibility
    pub privacy: Privacy,

    /// Items and collections to extract from
    pub request: JobRequest,
}

impl JobSubmission {
    /// Create a private submission
    pub fn new(name: impl Into<String>, request: JobRequest) -> Self {
        Self {
            name: name.into(),
            privacy: Privacy::Private,
            request,
        }
    }

    /// Set the result visibility
    pub fn with_privacy(mut self, privacy: Privacy) -> Self {
        self.privacy = privacy;
        self
    }
}

/// Runs the lifecycle steps of individual jobs against a shared store
///
/// # Examples
///
/// ```
/// use kbforge_domain::{ContentItem, ContentKind, ItemId, JobRequest, JobStatus};
/// use kbforge_extractor::ExtractorConfig;
/// use kbforge_model::MockRelationModel;
/// use kbforge_store::SqliteStore;
/// use kbforge_worker::{JobRunner, JobSubmission};
/// use std::sync::{Arc, Mutex};
///
/// let mut store = SqliteStore::new(":memory:").unwrap();
/// store
///     .insert_item(&ContentItem::new(ItemId(1), ContentKind::Idea, "Paris", "Paris is in France", "2024-01-01"))
///     .unwrap();
///
/// let runner = JobRunner::new(Arc::new(Mutex::new(store)), ExtractorConfig::default());
/// let job = runner
///     .submit(JobSubmission::new("demo", JobRequest::new(vec![ItemId(1)], vec![])))
///     .unwrap();
///
/// let model = Arc::new(MockRelationModel::new(["<triplet> Paris <subj> France <obj> country"]));
/// let (job, _stats) = runner.execute(job.id, model, None).unwrap();
/// assert_eq!(job.status, JobStatus::Ready);
/// ```
pub struct JobRunner<S> {
    store: SharedStore<S>,
    config: ExtractorConfig,
}

impl<S> Clone for JobRunner<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S> JobRunner<S>
where
    S: ContentStore + JobStore,
    <S as ContentStore>::Error: Display,
    <S as JobStore>::Error: Display,
{
    /// Create a new runner
    pub fn new(store: SharedStore<S>, config: ExtractorConfig) -> Self {
        Self { store, config }
    }

    /// The shared store
    pub fn store(&self) -> &SharedStore<S> {
        &self.store
    }

    /// Extraction settings applied to every job
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Validate a submission and persist it as a pending job
    ///
    /// Unresolvable ids fail with [`WorkerError::Validation`] and no job is created.
    pub fn submit(&self, submission: JobSubmission) -> Result<Job, WorkerError> {
        let mut store = lock(&self.store)?;

        let corpus = merge_corpus(&*store, &submission.request)?;

        let job = Job::pending(
            submission.name,
            submission.privacy,
            submission.request,
            current_timestamp(),
        );
        store.create_job(&job).map_err(store_err)?;

        info!(
            "Accepted job {} '{}' ({} items)",
            job.id,
            job.name,
            corpus.len()
        );
        Ok(job)
    }

    /// Create a new pending job from a failed one
    pub fn retry(&self, job_id: JobId) -> Result<Job, WorkerError> {
        let mut store = lock(&self.store)?;

        let failed = store
            .get_job(job_id)
            .map_err(store_err)?
            .ok_or_else(|| WorkerError::NotFound(job_id.to_string()))?;
        let retry = failed
            .retry(current_timestamp())
            .map_err(|e| WorkerError::InvalidTransition(e.to_string()))?;
        store.create_job(&retry).map_err(store_err)?;

        info!("Job {} retried as {}", job_id, retry.id);
        Ok(retry)
    }

    /// Get a job by id
    pub fn job(&self, job_id: JobId) -> Result<Option<Job>, WorkerError> {
        lock(&self.store)?.get_job(job_id).map_err(store_err)
    }

    /// Resolve the corpus of a pending job
    ///
    /// Returns `Ok(None)` when the job is no longer pending.
    pub fn load_corpus(&self, job_id: JobId) -> Result<Option<Vec<ContentItem>>, WorkerError> {
        let store = lock(&self.store)?;

        let job = store
            .get_job(job_id)
            .map_err(store_err)?
            .ok_or_else(|| WorkerError::NotFound(job_id.to_string()))?;
        if job.status != JobStatus::Pending {
            debug!("Job {} is already {}, skipping", job_id, job.status);
            return Ok(None);
        }

        Ok(Some(merge_corpus(&*store, &job.request)?))
    }

    /// Persist the terminal state of a job
    ///
    /// `Ok` carries the serialized graph, `Err` the failure message.
    pub fn record(&self, job_id: JobId, outcome: Result<String, String>) -> Result<Job, WorkerError> {
        let mut store = lock(&self.store)?;

        let mut job = store
            .get_job(job_id)
            .map_err(store_err)?
            .ok_or_else(|| WorkerError::NotFound(job_id.to_string()))?;

        let now = current_timestamp();
        let transition = match outcome {
            Ok(result) => job.complete(result, now),
            Err(message) => job.fail(message, now),
        };
        transition.map_err(|e| WorkerError::InvalidTransition(e.to_string()))?;
        store.update_job(&job).map_err(store_err)?;

        match &job.error_message {
            None => info!("Job {} ready", job_id),
            Some(message) => error!("Job {} failed: {}", job_id, message),
        }
        Ok(job)
    }

    /// Run a pending job to completion on the current thread
    ///
    /// Extraction failures are recorded on the job and returned as `Ok` with
    /// `status = error`; only infrastructure failures are returned as `Err`.
    pub fn execute<M>(
        &self,
        job_id: JobId,
        model: Arc<M>,
        timeout: Option<Duration>,
    ) -> Result<(Job, Option<ExtractionStats>), WorkerError>
    where
        M: RelationModel,
        M::Error: Display,
    {
        let corpus = match self.load_corpus(job_id) {
            Ok(Some(corpus)) => corpus,
            Ok(None) => {
                return Err(WorkerError::InvalidTransition(format!(
                    "job {} is not pending",
                    job_id
                )))
            }
            Err(e @ WorkerError::Validation(_)) => {
                return self.record(job_id, Err(e.to_string())).map(|job| (job, None));
            }
            Err(e) => return Err(e),
        };

        let deadline = timeout.and_then(deadline_after);
        let extractor = RelationExtractor::from_shared(model, self.config.clone());

        match extractor.extract_to_json(&corpus, deadline) {
            Ok((json, stats)) => self.record(job_id, Ok(json)).map(|job| (job, Some(stats))),
            Err(e) => {
                let failure = extraction_failure(e, timeout.unwrap_or_default());
                self.record(job_id, Err(failure.to_string())).map(|job| (job, None))
            }
        }
    }
}
