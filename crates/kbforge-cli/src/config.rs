//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use kbforge_extractor::ExtractorConfig;
use kbforge_model::ModelConfig;
use kbforge_worker::WorkerConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Global settings
    #[serde(default)]
    pub settings: Settings,

    /// Database location
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Generation server connection
    #[serde(default)]
    pub model: ModelConfig,

    /// Span and decoding parameters
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Worker pool settings
    #[serde(default)]
    pub worker: WorkerConfig,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file holding content and jobs
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Directory holding the default config and database.
    pub fn home() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".kbforge"))
    }

    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        Ok(Self::home()?.join("config.toml"))
    }

    /// Load configuration from the default path, or defaults if absent.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load configuration from `path`, or defaults if absent.
    pub fn load_from(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let contents = fs::read_to_string(path)?;
            toml::from_str(&contents)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.model
            .validate()
            .map_err(|e| CliError::Config(format!("[model] {}", e)))?;
        self.extractor
            .validate()
            .map_err(|e| CliError::Config(format!("[extractor] {}", e)))?;
        self.worker
            .validate()
            .map_err(|e| CliError::Config(format!("[worker] {}", e)))?;
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_database_path() -> PathBuf {
    Config::home()
        .map(|home| home.join("kbforge.db"))
        .unwrap_or_else(|_| PathBuf::from("kbforge.db"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.settings.color);
        assert_eq!(config.settings.format, OutputFormat::Table);
        assert!(config.database.path.ends_with("kbforge.db"));
        assert_eq!(config.worker.job_timeout_secs, 420);
        assert_eq!(config.extractor.span_length, 128);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.worker.worker_count, 1);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.database.path = dir.path().join("test.db");
        config.settings.format = OutputFormat::Json;
        config.worker = WorkerConfig::throughput();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.database.path, dir.path().join("test.db"));
        assert_eq!(loaded.settings.format, OutputFormat::Json);
        assert_eq!(loaded.worker, WorkerConfig::throughput());
        assert_eq!(loaded.model, config.model);
    }

    #[test]
    fn test_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[database]\npath = \"/tmp/kb.db\"\n\n[worker]\nworker_count = 3\n\n[extractor]\nspan_length = 64\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.database.path, PathBuf::from("/tmp/kb.db"));
        assert_eq!(config.worker.worker_count, 3);
        assert_eq!(config.worker.max_jobs_per_worker, 1);
        assert_eq!(config.extractor.span_length, 64);
        assert_eq!(config.extractor.num_beams, 3);
    }

    #[test]
    fn test_invalid_section_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[worker]\nworker_count = 0\n").unwrap();

        match Config::load_from(&path) {
            Err(CliError::Config(msg)) => assert!(msg.contains("[worker]")),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }
}
