//! Command implementations.

pub mod import;
pub mod jobs;
pub mod run;
pub mod submit;

pub use self::import::execute_import;
pub use self::jobs::{execute_latest, execute_retry, execute_show, execute_status};
pub use self::run::{execute_run, execute_work};
pub use self::submit::execute_submit;

use crate::config::Config;
use crate::error::{CliError, Result};
use kbforge_domain::JobId;
use kbforge_model::{HttpRelationModel, ModelConfig, ModelError};
use kbforge_store::SqliteStore;
use std::fs;

/// Open the configured database, creating its directory if needed.
pub fn open_store(config: &Config) -> Result<SqliteStore> {
    if let Some(parent) = config.database.path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(SqliteStore::new(&config.database.path)?)
}

/// Parse a job id given on the command line.
pub fn parse_job_id(raw: &str) -> Result<JobId> {
    JobId::from_string(raw.trim()).map_err(CliError::InvalidInput)
}

/// Loader creating one HTTP model client per worker.
pub(crate) fn model_loader(
    config: &ModelConfig,
) -> impl Fn() -> std::result::Result<HttpRelationModel, ModelError> + Send + Sync + 'static {
    let config = config.clone();
    move || HttpRelationModel::new(&config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_job_id() {
        let id = JobId::new();
        assert_eq!(parse_job_id(&format!(" {} ", id)).unwrap(), id);
        assert!(matches!(
            parse_job_id("not-a-job"),
            Err(CliError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_open_store_creates_directory() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.database.path = dir.path().join("data").join("kb.db");

        open_store(&config).unwrap();
        assert!(config.database.path.exists());
    }
}
