//! Job execution commands: run one job in the foreground, or run the pool.

use crate::cli::RunArgs;
use crate::commands::{model_loader, open_store, parse_job_id};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use kbforge_model::HttpRelationModel;
use kbforge_worker::{JobOrchestrator, JobRunner, WorkerError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Execute the run command.
///
/// The model client blocks, so the whole job runs on a blocking thread.
pub async fn execute_run(args: RunArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let job_id = parse_job_id(&args.job_id)?;
    let timeout_secs = args.timeout.unwrap_or(config.worker.job_timeout_secs);
    if timeout_secs == 0 {
        return Err(CliError::InvalidInput(
            "timeout must be greater than 0".to_string(),
        ));
    }

    let runner = JobRunner::new(Arc::new(Mutex::new(open_store(config)?)), config.extractor.clone());
    let model_config = config.model.clone();

    let (job, stats) = tokio::task::spawn_blocking(move || -> Result<_> {
        let model = HttpRelationModel::new(&model_config)?;
        Ok(runner.execute(job_id, Arc::new(model), Some(Duration::from_secs(timeout_secs)))?)
    })
    .await
    .map_err(|e| WorkerError::Worker(format!("Task join error: {}", e)))??;

    if let (Some(stats), false) = (&stats, formatter.is_quiet()) {
        println!(
            "{}",
            formatter.info(&format!(
                "{} items, {} spans, {} model calls, {} relations in {} ms",
                stats.items,
                stats.spans,
                stats.model_calls,
                stats.relations,
                stats.processing_time_ms
            ))
        );
    }
    println!("{}", formatter.format_job(&job)?);
    Ok(())
}

/// Execute the work command.
pub async fn execute_work(config: &Config, formatter: &Formatter) -> Result<()> {
    let store = open_store(config)?;
    let orchestrator = JobOrchestrator::start(
        store,
        model_loader(&config.model),
        config.extractor.clone(),
        config.worker.clone(),
    )?;

    if !formatter.is_quiet() {
        println!(
            "{}",
            formatter.info(&format!(
                "Worker pool running with {} worker(s) on {}; press Ctrl+C to stop",
                config.worker.worker_count,
                config.database.path.display()
            ))
        );
    }

    let metrics = orchestrator.run_until_ctrl_c().await?;
    println!("{}", formatter.format_metrics(&metrics));
    Ok(())
}
