//! Submit command implementation.

use crate::cli::SubmitArgs;
use crate::commands::{model_loader, open_store};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use kbforge_domain::{CollectionId, ItemId, JobRequest, Privacy};
use kbforge_worker::{JobOrchestrator, JobRunner, JobSubmission};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const WAIT_POLL: Duration = Duration::from_millis(500);

/// Build a submission from command-line arguments.
pub fn submission_from_args(args: SubmitArgs) -> Result<JobSubmission> {
    if args.items.is_empty() && args.collections.is_empty() {
        return Err(CliError::InvalidInput(
            "nothing to extract; pass --item or --collection".to_string(),
        ));
    }

    let request = JobRequest::new(
        args.items.into_iter().map(ItemId).collect(),
        args.collections.into_iter().map(CollectionId).collect(),
    );
    let privacy = if args.public {
        Privacy::Public
    } else {
        Privacy::Private
    };
    Ok(JobSubmission::new(args.name, request).with_privacy(privacy))
}

/// Execute the submit command.
///
/// Without `--wait` the job is only persisted; `kbforge work` or
/// `kbforge run` processes it later.
pub async fn execute_submit(args: SubmitArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let wait = args.wait;
    let submission = submission_from_args(args)?;
    let store = open_store(config)?;

    let job = if wait {
        let orchestrator = JobOrchestrator::start(
            store,
            model_loader(&config.model),
            config.extractor.clone(),
            config.worker.clone(),
        )?;

        let outcome = match orchestrator.submit(submission).await {
            Ok(job_id) => orchestrator.wait_for(job_id, WAIT_POLL).await,
            Err(e) => Err(e),
        };
        orchestrator.shutdown().await?;
        outcome?
    } else {
        let runner = JobRunner::new(Arc::new(Mutex::new(store)), config.extractor.clone());
        let job = runner.submit(submission)?;
        if !formatter.is_quiet() {
            println!("{}", formatter.success(&format!("Job submitted: {}", job.id)));
        }
        job
    };

    println!("{}", formatter.format_job(&job)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: Vec<i64>, collections: Vec<i64>, public: bool) -> SubmitArgs {
        SubmitArgs {
            items,
            collections,
            name: "test".to_string(),
            public,
            wait: false,
        }
    }

    #[test]
    fn test_submission_from_args() {
        let submission = submission_from_args(args(vec![1, 2], vec![10], true)).unwrap();
        assert_eq!(submission.name, "test");
        assert_eq!(submission.privacy, Privacy::Public);
        assert_eq!(submission.request.item_ids, vec![ItemId(1), ItemId(2)]);
        assert_eq!(submission.request.collection_ids, vec![CollectionId(10)]);
    }

    #[test]
    fn test_private_by_default() {
        let submission = submission_from_args(args(vec![1], vec![], false)).unwrap();
        assert_eq!(submission.privacy, Privacy::Private);
    }

    #[test]
    fn test_empty_submission_rejected() {
        assert!(matches!(
            submission_from_args(args(vec![], vec![], false)),
            Err(CliError::InvalidInput(_))
        ));
    }
}
