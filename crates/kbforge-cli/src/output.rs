//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use kbforge_domain::{Job, JobStatus};
use kbforge_extractor::GraphDocument;
use kbforge_worker::WorkerMetrics;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

fn join_ids<T: ToString>(ids: &[T]) -> String {
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a job record.
    pub fn format_job(&self, job: &Job) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_job_json(job),
            OutputFormat::Table => Ok(self.format_job_table(job)),
            OutputFormat::Quiet => Ok(job.id.to_string()),
        }
    }

    fn format_job_json(&self, job: &Job) -> Result<String> {
        // The stored artifact is embedded as JSON, not as an escaped string
        let result = match &job.result {
            Some(raw) => Some(serde_json::from_str::<serde_json::Value>(raw)?),
            None => None,
        };

        let value = serde_json::json!({
            "id": job.id.to_string(),
            "name": job.name,
            "status": job.status.as_str(),
            "privacy": job.privacy.as_str(),
            "items": job.request.item_ids.iter().map(|id| id.0).collect::<Vec<_>>(),
            "collections": job.request.collection_ids.iter().map(|id| id.0).collect::<Vec<_>>(),
            "created_at": job.created_at,
            "updated_at": job.updated_at,
            "error": job.error_message,
            "result": result,
        });

        Ok(serde_json::to_string_pretty(&value)?)
    }

    fn format_job_table(&self, job: &Job) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        builder.push_record(["ID".to_string(), job.id.to_string()]);
        builder.push_record(["Name".to_string(), job.name.clone()]);
        builder.push_record(["Status".to_string(), self.status(job.status)]);
        builder.push_record(["Privacy".to_string(), job.privacy.as_str().to_string()]);
        builder.push_record(["Items".to_string(), join_ids(&job.request.item_ids)]);
        builder.push_record([
            "Collections".to_string(),
            join_ids(&job.request.collection_ids),
        ]);
        builder.push_record(["Created".to_string(), job.created_at.to_string()]);
        builder.push_record(["Updated".to_string(), job.updated_at.to_string()]);
        if let Some(message) = &job.error_message {
            builder.push_record(["Error".to_string(), message.clone()]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Format a relation graph.
    pub fn format_graph(&self, document: &GraphDocument) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(document)?),
            OutputFormat::Table => Ok(self.format_graph_table(document)),
            OutputFormat::Quiet => Ok(document
                .relations
                .iter()
                .map(|r| format!("{}\t{}\t{}", r.head, r.relation, r.tail))
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    fn format_graph_table(&self, document: &GraphDocument) -> String {
        if document.is_empty() {
            return self.colorize("No relations found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Head", "Relation", "Tail", "Spans"]);

        for entry in &document.relations {
            let spans = entry
                .meta
                .spans
                .iter()
                .map(|[start, end]| format!("[{}, {})", start, end))
                .collect::<Vec<_>>()
                .join(" ");
            builder.push_record([
                entry.head.clone(),
                entry.relation.clone(),
                entry.tail.clone(),
                spans,
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        format!("{}\n{} relation(s)", table, document.len())
    }

    /// Format worker pool metrics.
    pub fn format_metrics(&self, metrics: &WorkerMetrics) -> String {
        match self.format {
            OutputFormat::Quiet => metrics.total_jobs().to_string(),
            _ => metrics.summary(),
        }
    }

    /// Format an import result.
    pub fn imported(&self, items: usize, collections: usize) -> String {
        self.success(&format!(
            "Imported {} item(s) and {} collection(s)",
            items, collections
        ))
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// True when only ids should be printed.
    pub fn is_quiet(&self) -> bool {
        self.format == OutputFormat::Quiet
    }

    fn status(&self, status: JobStatus) -> String {
        let color = match status {
            JobStatus::Pending => "yellow",
            JobStatus::Ready => "green",
            JobStatus::Error => "red",
        };
        self.colorize(status.as_str(), color)
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}
