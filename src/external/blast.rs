use std::path::PathBuf;
use std::process::Command;

use super::{run_tool, SearchHit, SimilaritySearch, ToolError};
use crate::core::{Genome, SpacerRef};
use crate::parsing::blast::parse_tabular;
use crate::parsing::fasta::write_fasta_file;

const TOOL: &str = "blastn";

/// `blastn` with spacers as queries and the raw genome as subject
#[derive(Debug, Clone)]
pub struct BlastnSearch {
    pub binary: PathBuf,
    pub max_evalue: f64,
}

impl BlastnSearch {
    #[must_use]
    pub fn new(binary: PathBuf, max_evalue: f64) -> Self {
        Self { binary, max_evalue }
    }
}

impl SimilaritySearch for BlastnSearch {
    fn search(
        &self,
        queries: &[(SpacerRef, String)],
        genome: &Genome,
    ) -> Result<Vec<SearchHit>, ToolError> {
        if queries.is_empty() {
            return Ok(Vec::new());
        }
        let dir = tempfile::tempdir()?;
        let query_path = dir.path().join("spacers.fa");
        let subject_path = dir.path().join("genome.fa");

        let names: Vec<String> = queries.iter().map(|(spacer, _)| spacer.to_string()).collect();
        let spacers: Vec<(&str, &[u8])> = names
            .iter()
            .zip(queries)
            .map(|(name, (_, sequence))| (name.as_str(), sequence.as_bytes()))
            .collect();
        write_fasta_file(&query_path, &spacers)?;

        let contigs: Vec<(&str, &[u8])> = genome
            .contigs
            .iter()
            .map(|c| (c.name.as_str(), c.sequence.as_slice()))
            .collect();
        write_fasta_file(&subject_path, &contigs)?;

        let mut cmd = Command::new(&self.binary);
        cmd.arg("-query")
            .arg(&query_path)
            .arg("-subject")
            .arg(&subject_path)
            .args(["-task", "blastn-short"])
            .args(["-outfmt", "6"])
            .args(["-evalue", &self.max_evalue.to_string()]);
        let output = run_tool(TOOL, &mut cmd, None)?;
        parse_tabular(&output).map_err(|e| ToolError::output(TOOL, e))
    }
}
