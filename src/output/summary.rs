use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::output::tsv::ProphageSplit;
use crate::output::OutputError;
use crate::pipeline::{GenomeResult, GenomeStatus};

/// Metadata written next to the records of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub tool: String,
    pub version: String,
    pub created_at: String,
    /// Subcommand that produced the run
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<SearchConfig>,
    #[serde(default)]
    pub genomes: Vec<GenomeResult>,
    pub records: usize,
    pub in_prophage: usize,
    pub outside_prophage: usize,
    pub prophage_not_analysed: usize,
}

impl RunSummary {
    #[must_use]
    pub fn new(command: &str, records: usize, split: ProphageSplit) -> Self {
        Self {
            tool: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            command: command.to_string(),
            config: None,
            genomes: Vec::new(),
            records,
            in_prophage: split.in_prophage,
            outside_prophage: split.outside_prophage,
            prophage_not_analysed: split.not_analysed,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: &SearchConfig) -> Self {
        self.config = Some(config.clone());
        self
    }

    #[must_use]
    pub fn with_genomes(mut self, genomes: Vec<GenomeResult>) -> Self {
        self.genomes = genomes;
        self
    }

    #[must_use]
    pub fn failed_genomes(&self) -> usize {
        self.genomes
            .iter()
            .filter(|g| matches!(g.status, GenomeStatus::Failed { .. }))
            .count()
    }

    /// Write the summary as pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns `OutputError` if the file cannot be written.
    pub fn write(&self, path: &Path) -> Result<(), OutputError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(OutputError::io(path))
    }
}
