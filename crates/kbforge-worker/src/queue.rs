//! In-process job queue

use crate::error::{lock, WorkerError};
use kbforge_domain::JobId;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, error::TrySendError};

/// Receiving end shared by all workers
pub(crate) type JobReceiver = Arc<tokio::sync::Mutex<mpsc::Receiver<JobId>>>;

/// Ids that are queued or being worked on
///
/// Workers release an id once its job has been recorded, so the set only ever
/// holds in-flight jobs.
#[derive(Clone, Default)]
pub(crate) struct QueuedJobs(Arc<Mutex<HashSet<JobId>>>);

impl QueuedJobs {
    fn mark(&self, job_id: JobId) -> Result<bool, WorkerError> {
        Ok(lock(&self.0)?.insert(job_id))
    }

    /// Forget `job_id`; the dispatcher may queue it again if it is still pending
    pub(crate) fn release(&self, job_id: JobId) {
        if let Ok(mut queued) = self.0.lock() {
            queued.remove(&job_id);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.0.lock().map(|queued| queued.len()).unwrap_or(0)
    }
}

/// Bounded queue of job ids; an id is never queued twice while in flight
#[derive(Clone)]
pub(crate) struct JobQueue {
    sender: mpsc::Sender<JobId>,
    queued: QueuedJobs,
}

impl JobQueue {
    pub(crate) fn new(capacity: usize) -> (Self, JobReceiver) {
        let (sender, receiver) = mpsc::channel(capacity);
        let queue = Self {
            sender,
            queued: QueuedJobs::default(),
        };
        (queue, Arc::new(tokio::sync::Mutex::new(receiver)))
    }

    /// Handle for workers to release ids; holds no sender
    pub(crate) fn queued(&self) -> QueuedJobs {
        self.queued.clone()
    }

    /// Enqueue, waiting for room. Returns false if the id is already in flight.
    pub(crate) async fn enqueue(&self, job_id: JobId) -> Result<bool, WorkerError> {
        if !self.queued.mark(job_id)? {
            return Ok(false);
        }
        if self.sender.send(job_id).await.is_err() {
            self.queued.release(job_id);
            return Err(WorkerError::Worker("Job queue closed".to_string()));
        }
        Ok(true)
    }

    /// Enqueue without waiting. A full queue leaves the id for a later attempt.
    pub(crate) fn try_enqueue(&self, job_id: JobId) -> Result<bool, WorkerError> {
        if !self.queued.mark(job_id)? {
            return Ok(false);
        }
        match self.sender.try_send(job_id) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(_)) => {
                self.queued.release(job_id);
                Ok(false)
            }
            Err(TrySendError::Closed(_)) => {
                self.queued.release(job_id);
                Err(WorkerError::Worker("Job queue closed".to_string()))
            }
        }
    }
}
