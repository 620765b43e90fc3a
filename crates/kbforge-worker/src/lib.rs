//! kbforge Worker
//!
//! Asynchronous job orchestration for relation extraction.
//!
//! # Overview
//!
//! A job names items and collections to extract from. Its lifecycle is
//! `pending → ready` or `pending → error`; both end states are terminal and a
//! failed job is retried by creating a new job with the same request.
//!
//! - **Acceptance** is synchronous: ids are resolved, the job is stored as
//!   pending, and its id is returned immediately.
//! - **Dispatch** queues every pending job exactly once, whether it was just
//!   submitted or found in the store by periodic polling.
//! - **Workers** each hold one model instance, run extractions on blocking
//!   threads under a wall-clock deadline, and drop their model after
//!   `max_jobs_per_worker` jobs or after a timeout.
//!
//! # Usage
//!
//! ## Foreground run
//!
//! ```
//! use kbforge_domain::{ContentItem, ContentKind, ItemId, JobRequest, JobStatus};
//! use kbforge_extractor::ExtractorConfig;
//! use kbforge_model::MockRelationModel;
//! use kbforge_store::SqliteStore;
//! use kbforge_worker::{JobRunner, JobSubmission};
//! use std::sync::{Arc, Mutex};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = SqliteStore::new(":memory:")?;
//! store.insert_item(&ContentItem::new(ItemId(1), ContentKind::Idea, "Paris", "Paris is in France", "2024-01-01"))?;
//!
//! let runner = JobRunner::new(Arc::new(Mutex::new(store)), ExtractorConfig::default());
//! let job = runner.submit(JobSubmission::new("demo", JobRequest::new(vec![ItemId(1)], vec![])))?;
//!
//! let model = Arc::new(MockRelationModel::new(["<triplet> Paris <subj> France <obj> country"]));
//! let (job, _) = runner.execute(job.id, model, None)?;
//! assert_eq!(job.status, JobStatus::Ready);
//! # Ok(())
//! # }
//! ```
//!
//! ## Background pool
//!
//! ```no_run
//! use kbforge_extractor::ExtractorConfig;
//! use kbforge_model::MockRelationModel;
//! use kbforge_store::SqliteStore;
//! use kbforge_worker::{JobOrchestrator, WorkerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SqliteStore::new("kbforge.db")?;
//!     let loader = || Ok::<_, String>(MockRelationModel::default());
//!
//!     let orchestrator =
//!         JobOrchestrator::start(store, loader, ExtractorConfig::default(), WorkerConfig::throughput())?;
//!
//!     // Run until Ctrl+C, then drain the queue
//!     let metrics = orchestrator.run_until_ctrl_c().await?;
//!     println!("{}", metrics.summary());
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [worker]
//! worker_count = 1
//! max_jobs_per_worker = 1
//! job_timeout_secs = 420
//! queue_capacity = 64
//! poll_interval_secs = 5
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod metrics;
mod orchestrator;
mod queue;
mod runner;
mod worker;

pub use config::WorkerConfig;
pub use error::WorkerError;
pub use metrics::WorkerMetrics;
pub use orchestrator::JobOrchestrator;
pub use runner::{JobRunner, JobSubmission, SharedStore};
pub use worker::ModelLoader;
