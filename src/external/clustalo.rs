use std::path::PathBuf;
use std::process::Command;

use super::{run_tool, MultipleAligner, ToolError};
use crate::parsing::alignment::{parse_aligned, write_inputs};

const TOOL: &str = "clustalo";

/// Clustal Omega reading FASTA on stdin and writing aligned FASTA in input order
#[derive(Debug, Clone)]
pub struct ClustalOmega {
    pub binary: PathBuf,
}

impl ClustalOmega {
    #[must_use]
    pub fn new(binary: PathBuf) -> Self {
        Self { binary }
    }
}

impl MultipleAligner for ClustalOmega {
    fn align(&self, sequences: &[String]) -> Result<Vec<String>, ToolError> {
        if sequences.len() < 2 {
            return Err(ToolError::Input {
                tool: TOOL.to_string(),
                message: format!("need at least 2 sequences, got {}", sequences.len()),
            });
        }
        let input = write_inputs(sequences);
        let mut cmd = Command::new(&self.binary);
        cmd.args(["-i", "-", "--outfmt=fa", "--output-order=input-order", "--force"]);
        let output = run_tool(TOOL, &mut cmd, Some(input.as_slice()))?;
        parse_aligned(&output, sequences.len()).map_err(|e| ToolError::output(TOOL, e))
    }
}
