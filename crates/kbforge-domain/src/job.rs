//! Job module - one asynchronous extraction run and its lifecycle
//!
//! A job is created `pending` and transitions exactly once, to `ready` (with a
//! result) or `error` (with a message). Terminal jobs are never mutated; a retry
//! creates a fresh pending job from the same request.

use crate::{CollectionId, ItemId};
use std::fmt;

/// Unique identifier for a job based on UUIDv7
///
/// UUIDv7 keeps job ids roughly chronologically sortable and needs no
/// coordination between submitting processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(u128);

impl JobId {
    /// Generate a new UUIDv7-based JobId
    ///
    /// # Examples
    ///
    /// ```
    /// use kbforge_domain::JobId;
    ///
    /// let id = JobId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a JobId from a raw u128 value (storage deserialization)
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a JobId from its UUID string form
    ///
    /// # Examples
    ///
    /// ```
    /// use kbforge_domain::JobId;
    ///
    /// let id = JobId::new();
    /// let parsed = JobId::from_string(&id.to_string()).unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid job id '{}': {}", s, e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// Lifecycle status of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    /// Accepted, waiting for or undergoing extraction
    Pending,

    /// Finished; the result artifact is available
    Ready,

    /// Failed; an error message is available
    Error,
}

impl JobStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Ready => "ready",
            JobStatus::Error => "error",
        }
    }

    /// Parse a status from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(JobStatus::Pending),
            "ready" => Some(JobStatus::Ready),
            "error" => Some(JobStatus::Error),
            _ => None,
        }
    }

    /// Ready and error are terminal
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid job status: {}", s))
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visibility of a job's result to unauthenticated readers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Privacy {
    /// Readable only with authorization
    #[default]
    Private,

    /// Readable by anyone
    Public,
}

impl Privacy {
    /// Get the privacy name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Privacy::Private => "private",
            Privacy::Public => "public",
        }
    }

    /// Parse a privacy setting from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "private" => Some(Privacy::Private),
            "public" => Some(Privacy::Public),
            _ => None,
        }
    }
}

/// What a job extracts from: direct items plus whole collections
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobRequest {
    /// Items requested directly, in request order
    pub item_ids: Vec<ItemId>,

    /// Collections to expand, in request order
    pub collection_ids: Vec<CollectionId>,
}

impl JobRequest {
    /// Create a request
    pub fn new(item_ids: Vec<ItemId>, collection_ids: Vec<CollectionId>) -> Self {
        Self {
            item_ids,
            collection_ids,
        }
    }

    /// True if nothing was requested
    pub fn is_empty(&self) -> bool {
        self.item_ids.is_empty() && self.collection_ids.is_empty()
    }
}

/// Rejected lifecycle transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionError {
    /// Status the job was in
    pub from: JobStatus,

    /// Status that was requested
    pub to: JobStatus,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot move job from {} to {}", self.from, self.to)
    }
}

impl std::error::Error for TransitionError {}

/// A job record
///
/// Invariant: `result` is set iff `status == Ready`; `error_message` is set iff
/// `status == Error`. Fields are public for storage mapping; use the
/// transition methods to change status.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    /// Unique identifier
    pub id: JobId,

    /// Display name
    pub name: String,

    /// Result visibility
    pub privacy: Privacy,

    /// Lifecycle status
    pub status: JobStatus,

    /// Inputs the job was accepted with
    pub request: JobRequest,

    /// Serialized knowledge graph (JSON artifact), only when ready
    pub result: Option<String>,

    /// Failure description, only on error
    pub error_message: Option<String>,

    /// Creation time (seconds since Unix epoch)
    pub created_at: u64,

    /// Last transition time (seconds since Unix epoch)
    pub updated_at: u64,
}

impl Job {
    /// Create a new pending job
    pub fn pending(name: impl Into<String>, privacy: Privacy, request: JobRequest, now: u64) -> Self {
        Self {
            id: JobId::new(),
            name: name.into(),
            privacy,
            status: JobStatus::Pending,
            request,
            result: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition `pending → ready` with the serialized result
    pub fn complete(&mut self, result: String, now: u64) -> Result<(), TransitionError> {
        self.ensure_pending(JobStatus::Ready)?;
        self.status = JobStatus::Ready;
        self.result = Some(result);
        self.error_message = None;
        self.updated_at = now;
        Ok(())
    }

    /// Transition `pending → error` with a diagnostic message
    pub fn fail(&mut self, message: impl Into<String>, now: u64) -> Result<(), TransitionError> {
        self.ensure_pending(JobStatus::Error)?;
        self.status = JobStatus::Error;
        self.result = None;
        self.error_message = Some(message.into());
        self.updated_at = now;
        Ok(())
    }

    /// Build a new pending job from a failed one
    ///
    /// The failed job itself is left untouched.
    pub fn retry(&self, now: u64) -> Result<Job, TransitionError> {
        if self.status != JobStatus::Error {
            return Err(TransitionError {
                from: self.status,
                to: JobStatus::Pending,
            });
        }
        Ok(Job::pending(self.name.clone(), self.privacy, self.request.clone(), now))
    }

    /// Check the status/result/error_message invariant
    pub fn is_consistent(&self) -> bool {
        match self.status {
            JobStatus::Pending => self.result.is_none() && self.error_message.is_none(),
            JobStatus::Ready => self.result.is_some() && self.error_message.is_none(),
            JobStatus::Error => self.result.is_none() && self.error_message.is_some(),
        }
    }

    fn ensure_pending(&self, to: JobStatus) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError {
                from: self.status,
                to,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> JobRequest {
        JobRequest::new(vec![ItemId(1)], vec![CollectionId(7)])
    }

    #[test]
    fn test_new_job_is_pending() {
        let job = Job::pending("kb", Privacy::Private, request(), 100);
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.is_consistent());
    }

    #[test]
    fn test_complete_sets_result() {
        let mut job = Job::pending("kb", Privacy::Public, request(), 100);
        job.complete("{\"relations\":[]}".to_string(), 105).unwrap();

        assert_eq!(job.status, JobStatus::Ready);
        assert_eq!(job.updated_at, 105);
        assert!(job.is_consistent());
    }

    #[test]
    fn test_fail_sets_message() {
        let mut job = Job::pending("kb", Privacy::Private, request(), 100);
        job.fail("model crashed", 101).unwrap();

        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.error_message.as_deref(), Some("model crashed"));
        assert!(job.result.is_none());
        assert!(job.is_consistent());
    }

    #[test]
    fn test_terminal_jobs_do_not_transition() {
        let mut job = Job::pending("kb", Privacy::Private, request(), 100);
        job.fail("boom", 101).unwrap();

        let err = job.complete("{}".to_string(), 102).unwrap_err();
        assert_eq!(err.from, JobStatus::Error);
        assert_eq!(err.to, JobStatus::Ready);
        assert!(job.fail("again", 103).is_err());
        assert_eq!(job.error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn test_retry_creates_fresh_job() {
        let mut job = Job::pending("kb", Privacy::Public, request(), 100);
        job.fail("timeout", 101).unwrap();

        let retried = job.retry(200).unwrap();
        assert_ne!(retried.id, job.id);
        assert_eq!(retried.status, JobStatus::Pending);
        assert_eq!(retried.request, job.request);
        assert_eq!(retried.privacy, Privacy::Public);
        assert_eq!(job.status, JobStatus::Error);
    }

    #[test]
    fn test_retry_requires_error() {
        let job = Job::pending("kb", Privacy::Private, request(), 100);
        assert!(job.retry(101).is_err());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("READY".parse::<JobStatus>().unwrap(), JobStatus::Ready);
        assert!("done".parse::<JobStatus>().is_err());
        assert_eq!(Privacy::parse("public"), Some(Privacy::Public));
    }
}
