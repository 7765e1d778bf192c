//! Result files.
//!
//! Every run writes the same layout into its output directory:
//!
//! | File | Content |
//! |------|---------|
//! | `records.jsonl` | one [`StsRecord`] per line; input for `rerun-loci` and `annotate-islands` |
//! | `sts.tsv` | every record, one row each |
//! | `sts_in_prophage.tsv` | records whose target lies in a prophage |
//! | `sts_outside_prophage.tsv` | records checked and outside any prophage |
//! | `sts_no_prophage_analysis.tsv` | records never checked |
//! | `summary.json` | run metadata and per-genome status |
//!
//! TSV coordinates are 1-based and inclusive; JSON spans are 0-based and
//! half-open.

pub mod records;
pub mod summary;
pub mod tsv;

pub use records::{read_records, write_records};
pub use summary::RunSummary;
pub use tsv::{write_prophage_split, write_tsv, ProphageSplit};

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::StsRecord;

pub const RECORDS_FILE: &str = "records.jsonl";
pub const ALL_RECORDS_TSV: &str = "sts.tsv";
pub const IN_PROPHAGE_TSV: &str = "sts_in_prophage.tsv";
pub const OUTSIDE_PROPHAGE_TSV: &str = "sts_outside_prophage.tsv";
pub const NO_PROPHAGE_ANALYSIS_TSV: &str = "sts_no_prophage_analysis.tsv";
pub const SUMMARY_FILE: &str = "summary.json";

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid record on line {line} of {path}: {source}")]
    Record {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OutputError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Write the record files of a run (everything except the summary)
///
/// # Errors
///
/// Returns `OutputError` if the directory or a file cannot be written.
pub fn write_record_files(dir: &Path, records: &[StsRecord]) -> Result<ProphageSplit, OutputError> {
    std::fs::create_dir_all(dir).map_err(OutputError::io(dir))?;
    write_records(&dir.join(RECORDS_FILE), records)?;
    write_tsv(&dir.join(ALL_RECORDS_TSV), records.iter())?;
    write_prophage_split(dir, records)
}
