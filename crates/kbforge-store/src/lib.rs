//! kbforge Storage Layer
//!
//! Implements the `ContentStore` and `JobStore` traits on SQLite.
//!
//! # Architecture
//!
//! - Content items and collections are read-only to the pipeline; `insert_*`
//!   exists for seeding only
//! - Job records hold the originating request (JSON) and, once ready, the
//!   serialized knowledge graph verbatim
//! - Job updates are guarded so a terminal job is never overwritten
//!
//! # Examples
//!
//! ```no_run
//! use kbforge_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for content and job operations
//! ```

#![warn(missing_docs)]

use kbforge_domain::traits::{ContentStore, JobStore};
use kbforge_domain::{
    Collection, CollectionId, CollectionKind, ContentItem, ContentKind, ItemId, Job, JobId,
    JobRequest, JobStatus, Privacy,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Record with the same id already exists
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    /// Job is terminal and cannot be updated
    #[error("Invalid job transition: {0}")]
    InvalidTransition(String),
}

/// Stored form of a job request
#[derive(Serialize, Deserialize)]
struct StoredRequest {
    items: Vec<i64>,
    collections: Vec<i64>,
}

impl From<&JobRequest> for StoredRequest {
    fn from(request: &JobRequest) -> Self {
        Self {
            items: request.item_ids.iter().map(|id| id.0).collect(),
            collections: request.collection_ids.iter().map(|id| id.0).collect(),
        }
    }
}

impl From<StoredRequest> for JobRequest {
    fn from(stored: StoredRequest) -> Self {
        JobRequest::new(
            stored.items.into_iter().map(ItemId).collect(),
            stored.collections.into_iter().map(CollectionId).collect(),
        )
    }
}

const JOB_COLUMNS: &str =
    "id, name, privacy, status, request, result, error_message, created_at, updated_at";

/// SQLite-based implementation of ContentStore and JobStore
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Share a store across threads by
/// wrapping it in a `Mutex`, or give each thread its own instance.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Insert a content item
    pub fn insert_item(&mut self, item: &ContentItem) -> Result<ItemId, StoreError> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO content_items (id, kind, title, text, url, publish_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                item.id.0,
                item.kind.as_str(),
                &item.title,
                &item.text,
                &item.url,
                &item.publish_date,
            ],
        )?;

        if inserted == 0 {
            return Err(StoreError::Duplicate(format!("item {}", item.id)));
        }
        Ok(item.id)
    }

    /// Insert a collection and its ordered membership
    pub fn insert_collection(&mut self, collection: &Collection) -> Result<CollectionId, StoreError> {
        let tx = self.conn.transaction()?;

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO collections (id, kind, name) VALUES (?1, ?2, ?3)",
            params![collection.id.0, collection.kind.as_str(), &collection.name],
        )?;
        if inserted == 0 {
            return Err(StoreError::Duplicate(format!("collection {}", collection.id)));
        }

        for (position, item_id) in collection.members.iter().enumerate() {
            tx.execute(
                "INSERT INTO collection_members (collection_id, position, item_id)
                 VALUES (?1, ?2, ?3)",
                params![collection.id.0, position as i64, item_id.0],
            )?;
        }

        tx.commit()?;
        Ok(collection.id)
    }

    /// Convert JobId to bytes for storage
    fn job_id_to_bytes(id: JobId) -> Vec<u8> {
        id.value().to_be_bytes().to_vec()
    }

    /// Convert bytes to JobId
    fn bytes_to_job_id(bytes: &[u8]) -> Result<JobId, StoreError> {
        if bytes.len() != 16 {
            return Err(StoreError::InvalidData(format!(
                "Expected 16 bytes for JobId, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 16];
        arr.copy_from_slice(bytes);
        Ok(JobId::from_value(u128::from_be_bytes(arr)))
    }

    fn conversion_error(column: usize, err: StoreError) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(err))
    }

    fn job_from_row(row: &Row<'_>) -> rusqlite::Result<Job> {
        let id_bytes: Vec<u8> = row.get(0)?;
        let id = Self::bytes_to_job_id(&id_bytes).map_err(|e| Self::conversion_error(0, e))?;

        let privacy_str: String = row.get(2)?;
        let privacy = Privacy::parse(&privacy_str).ok_or_else(|| {
            Self::conversion_error(2, StoreError::InvalidData(format!("privacy '{}'", privacy_str)))
        })?;

        let status_str: String = row.get(3)?;
        let status = JobStatus::parse(&status_str).ok_or_else(|| {
            Self::conversion_error(3, StoreError::InvalidData(format!("status '{}'", status_str)))
        })?;

        let request_json: String = row.get(4)?;
        let stored: StoredRequest = serde_json::from_str(&request_json).map_err(|e| {
            Self::conversion_error(4, StoreError::InvalidData(format!("request: {}", e)))
        })?;

        Ok(Job {
            id,
            name: row.get(1)?,
            privacy,
            status,
            request: stored.into(),
            result: row.get(5)?,
            error_message: row.get(6)?,
            created_at: row.get::<_, i64>(7)? as u64,
            updated_at: row.get::<_, i64>(8)? as u64,
        })
    }

    fn item_from_row(row: &Row<'_>) -> rusqlite::Result<ContentItem> {
        let kind_str: String = row.get(1)?;
        let kind = ContentKind::parse(&kind_str).ok_or_else(|| {
            Self::conversion_error(1, StoreError::InvalidData(format!("content kind '{}'", kind_str)))
        })?;

        Ok(ContentItem {
            id: ItemId(row.get(0)?),
            kind,
            title: row.get(2)?,
            text: row.get(3)?,
            url: row.get(4)?,
            publish_date: row.get(5)?,
        })
    }

    fn status_of(&self, id: JobId) -> Result<Option<JobStatus>, StoreError> {
        let status: Option<String> = self
            .conn
            .query_row(
                "SELECT status FROM jobs WHERE id = ?1",
                params![Self::job_id_to_bytes(id)],
                |row| row.get(0),
            )
            .optional()?;

        status
            .map(|s| {
                JobStatus::parse(&s)
                    .ok_or_else(|| StoreError::InvalidData(format!("status '{}'", s)))
            })
            .transpose()
    }
}

impl ContentStore for SqliteStore {
    type Error = StoreError;

    fn get_item(&self, id: ItemId) -> Result<Option<ContentItem>, Self::Error> {
        let item = self
            .conn
            .query_row(
                "SELECT id, kind, title, text, url, publish_date FROM content_items WHERE id = ?1",
                params![id.0],
                Self::item_from_row,
            )
            .optional()?;
        Ok(item)
    }

    fn get_collection(&self, id: CollectionId) -> Result<Option<Collection>, Self::Error> {
        let header: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT kind, name FROM collections WHERE id = ?1",
                params![id.0],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((kind_str, name)) = header else {
            return Ok(None);
        };

        let kind = CollectionKind::parse(&kind_str)
            .ok_or_else(|| StoreError::InvalidData(format!("collection kind '{}'", kind_str)))?;

        let mut stmt = self.conn.prepare(
            "SELECT item_id FROM collection_members WHERE collection_id = ?1 ORDER BY position",
        )?;
        let members = stmt
            .query_map(params![id.0], |row| Ok(ItemId(row.get(0)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Collection {
            id,
            kind,
            name,
            members,
        }))
    }
}

impl JobStore for SqliteStore {
    type Error = StoreError;

    fn create_job(&mut self, job: &Job) -> Result<JobId, Self::Error> {
        let request = serde_json::to_string(&StoredRequest::from(&job.request))
            .map_err(|e| StoreError::InvalidData(format!("request: {}", e)))?;

        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO jobs (id, name, privacy, status, request, result, error_message, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                Self::job_id_to_bytes(job.id),
                &job.name,
                job.privacy.as_str(),
                job.status.as_str(),
                request,
                &job.result,
                &job.error_message,
                job.created_at as i64,
                job.updated_at as i64,
            ],
        )?;

        if inserted == 0 {
            return Err(StoreError::Duplicate(format!("job {}", job.id)));
        }
        Ok(job.id)
    }

    fn get_job(&self, id: JobId) -> Result<Option<Job>, Self::Error> {
        let job = self
            .conn
            .query_row(
                &format!("SELECT {} FROM jobs WHERE id = ?1", JOB_COLUMNS),
                params![Self::job_id_to_bytes(id)],
                Self::job_from_row,
            )
            .optional()?;
        Ok(job)
    }

    fn latest_job(&self) -> Result<Option<Job>, Self::Error> {
        let job = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM jobs ORDER BY created_at DESC, rowid DESC LIMIT 1",
                    JOB_COLUMNS
                ),
                [],
                Self::job_from_row,
            )
            .optional()?;
        Ok(job)
    }

    fn update_job(&mut self, job: &Job) -> Result<(), Self::Error> {
        let updated = self.conn.execute(
            "UPDATE jobs SET status = ?1, result = ?2, error_message = ?3, updated_at = ?4
             WHERE id = ?5 AND status = 'pending'",
            params![
                job.status.as_str(),
                &job.result,
                &job.error_message,
                job.updated_at as i64,
                Self::job_id_to_bytes(job.id),
            ],
        )?;

        if updated == 0 {
            return match self.status_of(job.id)? {
                None => Err(StoreError::NotFound(format!("job {}", job.id))),
                Some(current) => Err(StoreError::InvalidTransition(format!(
                    "job {} is already {}",
                    job.id, current
                ))),
            };
        }
        Ok(())
    }

    fn pending_jobs(&self) -> Result<Vec<JobId>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id FROM jobs WHERE status = 'pending' ORDER BY created_at, rowid",
        )?;
        let ids = stmt
            .query_map([], |row| {
                let bytes: Vec<u8> = row.get(0)?;
                Self::bytes_to_job_id(&bytes).map_err(|e| Self::conversion_error(0, e))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_bytes_round_trip() {
        let id = JobId::new();
        let bytes = SqliteStore::job_id_to_bytes(id);
        assert_eq!(SqliteStore::bytes_to_job_id(&bytes).unwrap(), id);
    }

    #[test]
    fn test_invalid_job_id_bytes() {
        assert!(matches!(
            SqliteStore::bytes_to_job_id(&[1, 2, 3]),
            Err(StoreError::InvalidData(_))
        ));
    }

    #[test]
    fn test_stored_request_preserves_order() {
        let request = JobRequest::new(vec![ItemId(3), ItemId(1)], vec![CollectionId(9)]);
        let json = serde_json::to_string(&StoredRequest::from(&request)).unwrap();
        let stored: StoredRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(JobRequest::from(stored), request);
    }
}
