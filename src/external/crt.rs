use std::path::PathBuf;
use std::process::Command;

use super::{run_tool, RawArray, RepeatFinder, ToolError};
use crate::config::RepeatFinderParams;
use crate::parsing::crt::parse_crt_report;
use crate::parsing::fasta::write_fasta_file;

const TOOL: &str = "CRT";

/// CRT run through `java -cp <jar> crt`, one contig per call
#[derive(Debug, Clone)]
pub struct CrtRepeatFinder {
    pub java: PathBuf,
    pub jar: PathBuf,
    pub params: RepeatFinderParams,
}

impl CrtRepeatFinder {
    #[must_use]
    pub fn new(jar: PathBuf, params: RepeatFinderParams) -> Self {
        Self {
            java: PathBuf::from("java"),
            jar,
            params,
        }
    }
}

impl RepeatFinder for CrtRepeatFinder {
    fn find_arrays(&self, contig: &str, masked: &[u8]) -> Result<Vec<RawArray>, ToolError> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("contig.fa");
        let output = dir.path().join("crt.out");

        write_fasta_file(&input, &[(contig, masked)])?;

        let p = &self.params;
        let mut cmd = Command::new(&self.java);
        cmd.arg("-cp")
            .arg(&self.jar)
            .arg("crt")
            .args(["-minNR", &p.min_repeats.to_string()])
            .args(["-minRL", &p.min_repeat_len.to_string()])
            .args(["-maxRL", &p.max_repeat_len.to_string()])
            .args(["-minSL", &p.min_spacer_len.to_string()])
            .args(["-maxSL", &p.max_spacer_len.to_string()])
            .arg(&input)
            .arg(&output);
        run_tool(TOOL, &mut cmd, None)?;

        // CRT writes no report when the input holds no usable sequence
        let report = match std::fs::read_to_string(&output) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        parse_crt_report(&report, contig).map_err(|e| ToolError::output(TOOL, e))
    }
}
