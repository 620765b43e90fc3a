//! Job inspection commands: status, latest, show and retry.

use crate::cli::JobArgs;
use crate::commands::{open_store, parse_job_id};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use kbforge_domain::traits::JobStore;
use kbforge_domain::{Job, JobStatus};
use kbforge_extractor::GraphDocument;
use kbforge_store::SqliteStore;
use kbforge_worker::JobRunner;
use std::sync::{Arc, Mutex};

fn load_job(store: &SqliteStore, raw_id: &str) -> Result<Job> {
    let job_id = parse_job_id(raw_id)?;
    store
        .get_job(job_id)?
        .ok_or_else(|| CliError::NotFound(job_id.to_string()))
}

/// Parse the graph of a ready job.
pub fn job_graph(job: &Job) -> Result<GraphDocument> {
    match (job.status, &job.result) {
        (JobStatus::Ready, Some(result)) => Ok(GraphDocument::from_json(result)?),
        (JobStatus::Error, _) => Err(CliError::InvalidInput(format!(
            "job {} failed: {}",
            job.id,
            job.error_message.as_deref().unwrap_or("unknown error")
        ))),
        _ => Err(CliError::InvalidInput(format!(
            "job {} is {}; no graph yet",
            job.id, job.status
        ))),
    }
}

/// Execute the status command.
pub fn execute_status(args: JobArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let store = open_store(config)?;
    let job = load_job(&store, &args.job_id)?;
    println!("{}", formatter.format_job(&job)?);
    Ok(())
}

/// Execute the latest command.
pub fn execute_latest(config: &Config, formatter: &Formatter) -> Result<()> {
    let store = open_store(config)?;
    match store.latest_job()? {
        Some(job) => println!("{}", formatter.format_job(&job)?),
        None => {
            if !formatter.is_quiet() {
                println!("{}", formatter.warning("No jobs yet."));
            }
        }
    }
    Ok(())
}

/// Execute the show command.
pub fn execute_show(args: JobArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let store = open_store(config)?;
    let job = load_job(&store, &args.job_id)?;
    let document = job_graph(&job)?;
    println!("{}", formatter.format_graph(&document)?);
    Ok(())
}

/// Execute the retry command.
pub fn execute_retry(args: JobArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let job_id = parse_job_id(&args.job_id)?;
    let store = open_store(config)?;
    let runner = JobRunner::new(Arc::new(Mutex::new(store)), config.extractor.clone());

    let retry = runner.retry(job_id)?;
    if !formatter.is_quiet() {
        println!(
            "{}",
            formatter.success(&format!("Job {} retried as {}", job_id, retry.id))
        );
    }
    println!("{}", formatter.format_job(&retry)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbforge_domain::{JobRequest, Privacy};

    fn pending() -> Job {
        Job::pending("t", Privacy::Private, JobRequest::default(), 1)
    }

    #[test]
    fn test_graph_of_ready_job() {
        let mut job = pending();
        job.complete(r#"{"relations":[]}"#.to_string(), 2).unwrap();
        assert!(job_graph(&job).unwrap().is_empty());
    }

    #[test]
    fn test_no_graph_for_pending_or_failed_job() {
        let job = pending();
        match job_graph(&job) {
            Err(CliError::InvalidInput(msg)) => assert!(msg.contains("pending")),
            other => panic!("Expected InvalidInput error, got {:?}", other),
        }

        let mut job = pending();
        job.fail("Model unavailable: offline", 2).unwrap();
        match job_graph(&job) {
            Err(CliError::InvalidInput(msg)) => assert!(msg.contains("offline")),
            other => panic!("Expected InvalidInput error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_unknown_job() {
        let store = SqliteStore::new(":memory:").unwrap();
        let id = kbforge_domain::JobId::new().to_string();
        assert!(matches!(load_job(&store, &id), Err(CliError::NotFound(_))));
    }
}
