//! Per-genome pipeline, batch runner and locus rerun.
//!
//! A genome runs through the stages strictly in order:
//!
//! | # | Stage | Module |
//! |---|-------|--------|
//! | 1 | mask degenerate runs | [`crate::masking`] |
//! | 2 | find candidate arrays | [`crate::external::RepeatFinder`] |
//! | 3 | resolve overlaps, correct boundaries, filter, build consensus | [`crate::array`] |
//! | 4 | search spacers against the genome | [`crate::external::SimilaritySearch`] |
//! | 5 | keep self-targets | [`crate::targeting::match_targets`] |
//! | 6 | classify the locus and resolve orientation | [`crate::locus`] |
//! | 7 | annotate mutations and context | [`crate::targeting::annotate_hit`] |
//! | 8 | prophage lookup | [`crate::external::ProphageService`] |
//!
//! Genomes are independent; [`batch::run_batch`] processes them
//! concurrently and collects results through a single channel.
//! [`rerun::rerun_loci`] re-enters at stage 6 with previously written records.

pub mod batch;
pub mod genome;
pub mod rerun;

pub use batch::{run_batch, BatchOutcome, GenomeResult, GenomeStatus};
pub use genome::{process_genome, GenomeReport, GenomeStats};
pub use rerun::rerun_loci;

use thiserror::Error;

use crate::core::{ArrayError, StsRecord};
use crate::external::{ProphageService, ToolError};
use crate::parsing::ParseError;

/// Input that could not be turned into the data model
#[derive(Error, Debug)]
pub enum MalformedInput {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Array(#[from] ArrayError),
}

/// Failure of one genome's pipeline; never fatal to the batch
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("External tool failure: {0}")]
    ExternalToolFailure(#[from] ToolError),

    #[error("Malformed input: {0}")]
    MalformedInput(#[from] MalformedInput),
}

impl PipelineError {
    /// Short machine-readable failure kind
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ExternalToolFailure(_) => "external_tool_failure",
            Self::MalformedInput(_) => "malformed_input",
        }
    }
}

impl From<ParseError> for PipelineError {
    fn from(e: ParseError) -> Self {
        Self::MalformedInput(e.into())
    }
}

impl From<ArrayError> for PipelineError {
    fn from(e: ArrayError) -> Self {
        Self::MalformedInput(e.into())
    }
}

/// Look up whether a record's target lies in a prophage.
///
/// Lookup failures are logged and leave the flag unset, so a later
/// `annotate-islands` run can retry them.
#[must_use]
pub fn lookup_prophage(service: &dyn ProphageService, record: &StsRecord) -> Option<bool> {
    match service.in_island(&record.hit.contig, record.mutation.target_span) {
        Ok(flag) => flag,
        Err(e) => {
            tracing::warn!(
                genome = %record.genome,
                contig = %record.hit.contig,
                error = %e,
                "Prophage lookup failed"
            );
            None
        }
    }
}
