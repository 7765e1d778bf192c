//! Collaborator contracts and their implementations.
//!
//! The pipeline never calls a binary directly. Every external collaborator
//! is a trait, and a run is wired up with a [`Toolkit`] of trait objects:
//!
//! | Trait | Contract | Implementations |
//! |-------|----------|-----------------|
//! | [`RepeatFinder`] | masked contig → raw arrays | [`CrtRepeatFinder`] |
//! | [`SimilaritySearch`] | spacers × genome → hits | [`BlastnSearch`] |
//! | [`MultipleAligner`] | sequences → aligned rows | [`ClustalOmega`] |
//! | [`CasGeneSearch`] | window → Cas gene hits | [`HmmscanCasSearch`], [`CasHitTable`] |
//! | [`RepeatModelSearch`] | consensus repeat → family + strand | [`NhmmscanRepeatModel`], [`NoRepeatModel`] |
//! | [`ProphageService`] | span → island flag | [`IslandTable`] |
//! | [`GeneAnnotation`] | genome → gene coordinates | [`ProteinDirectory`] |
//!
//! Process-backed implementations stage their inputs in temporary
//! directories and treat any non-zero exit as a definite failure.

mod blast;
mod clustalo;
mod command;
mod crt;
mod hmmer;
mod tables;

pub use blast::BlastnSearch;
pub use clustalo::ClustalOmega;
pub use command::run_tool;
pub use crt::CrtRepeatFinder;
pub use hmmer::{HmmscanCasSearch, NhmmscanRepeatModel, ProteinDirectory};
pub use tables::{CasHitTable, IslandTable, NoRepeatModel, RepeatFamilyTable};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{CasGeneHit, Genome, Span, SpacerRef, Strand};
use crate::parsing::ParseError;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    NonZeroExit {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("Unreadable output from {tool}: {source}")]
    Output {
        tool: String,
        #[source]
        source: ParseError,
    },

    #[error("Invalid input for {tool}: {message}")]
    Input { tool: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    pub(crate) fn output(tool: &str, source: ParseError) -> Self {
        Self::Output {
            tool: tool.to_string(),
            source,
        }
    }
}

/// One candidate array as reported by the repeat-finder (0-based, masked coordinates)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawArray {
    pub contig: String,
    pub repeats: Vec<Span>,
    pub spacers: Vec<Span>,
}

/// One local alignment of a spacer against the genome
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub query: SpacerRef,
    pub contig: String,
    pub span: Span,
    pub strand: Strand,
    /// Aligned part of the query (0-based, spacer coordinates)
    pub query_span: Span,
    pub mismatches: usize,
    pub gap_opens: usize,
    pub evalue: f64,
    pub bitscore: f64,
}

/// Best repeat-family model matching a consensus repeat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatModelHit {
    pub family: String,
    /// Strand of the consensus the model matched
    pub strand: Strand,
    pub evalue: f64,
    /// Subtypes known to carry this repeat family
    #[serde(default)]
    pub subtypes: Vec<String>,
}

/// An annotated gene (or predicted CDS)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gene {
    pub id: String,
    pub contig: String,
    pub span: Span,
    pub strand: Strand,
}

/// Where to look for Cas genes around one array
#[derive(Debug, Clone, Copy)]
pub struct CasQuery<'a> {
    pub genome: &'a str,
    pub contig: &'a str,
    /// `None` searches the whole genome
    pub window: Option<Span>,
    /// Contigs belonging to the genome, for whole-genome queries
    pub genome_contigs: &'a [String],
}

impl CasQuery<'_> {
    /// Whether a feature on `contig` at `span` falls inside the query
    #[must_use]
    pub fn admits(&self, contig: &str, span: &Span) -> bool {
        match self.window {
            Some(window) => contig == self.contig && window.overlaps(span),
            None => contig == self.contig || self.genome_contigs.iter().any(|c| c == contig),
        }
    }
}

pub trait RepeatFinder: Send + Sync {
    /// Report candidate arrays on one masked contig
    ///
    /// # Errors
    ///
    /// Returns `ToolError` if the repeat-finder fails or its output cannot be read.
    fn find_arrays(&self, contig: &str, masked: &[u8]) -> Result<Vec<RawArray>, ToolError>;
}

pub trait SimilaritySearch: Send + Sync {
    /// Search every spacer against every contig of the genome
    ///
    /// # Errors
    ///
    /// Returns `ToolError` if the search tool fails or its output cannot be read.
    fn search(
        &self,
        queries: &[(SpacerRef, String)],
        genome: &Genome,
    ) -> Result<Vec<SearchHit>, ToolError>;
}

pub trait MultipleAligner: Send + Sync {
    /// Align sequences; rows come back in input order with equal lengths
    ///
    /// # Errors
    ///
    /// Returns `ToolError` if fewer than two sequences are given or the aligner fails.
    fn align(&self, sequences: &[String]) -> Result<Vec<String>, ToolError>;
}

pub trait CasGeneSearch: Send + Sync {
    /// Cas genes found within the query window
    ///
    /// # Errors
    ///
    /// Returns `ToolError` if the profile search fails.
    fn find_cas_genes(&self, query: &CasQuery<'_>) -> Result<Vec<CasGeneHit>, ToolError>;
}

pub trait RepeatModelSearch: Send + Sync {
    /// Best repeat-family hit for a consensus repeat, if any passes the cutoff
    ///
    /// # Errors
    ///
    /// Returns `ToolError` if the profile search fails.
    fn classify(&self, consensus: &str, max_evalue: f64) -> Result<Option<RepeatModelHit>, ToolError>;
}

pub trait ProphageService: Send + Sync {
    /// Whether `span` lies in a predicted island; `None` if the contig was never analysed
    ///
    /// # Errors
    ///
    /// Returns `ToolError` if the lookup fails.
    fn in_island(&self, contig: &str, span: Span) -> Result<Option<bool>, ToolError>;
}

pub trait GeneAnnotation: Send + Sync {
    /// Genes of a genome, `None` if the genome is not annotated
    ///
    /// # Errors
    ///
    /// Returns `ToolError` if the annotation exists but cannot be read.
    fn genes(&self, genome: &str) -> Result<Option<Vec<Gene>>, ToolError>;
}

/// The collaborators used by one run
pub struct Toolkit {
    pub repeat_finder: Box<dyn RepeatFinder>,
    pub search: Box<dyn SimilaritySearch>,
    pub aligner: Box<dyn MultipleAligner>,
    pub cas_genes: Option<Box<dyn CasGeneSearch>>,
    pub repeat_model: Box<dyn RepeatModelSearch>,
    pub prophage: Option<Box<dyn ProphageService>>,
    pub annotation: Option<Box<dyn GeneAnnotation>>,
}

impl std::fmt::Debug for Toolkit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolkit")
            .field("cas_genes", &self.cas_genes.is_some())
            .field("prophage", &self.prophage.is_some())
            .field("annotation", &self.annotation.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cas_query_window() {
        let contigs = vec!["c1".to_string(), "c2".to_string()];
        let query = CasQuery {
            genome: "g",
            contig: "c1",
            window: Some(Span::new(1000, 2000)),
            genome_contigs: &contigs,
        };
        assert!(query.admits("c1", &Span::new(1900, 2500)));
        assert!(!query.admits("c1", &Span::new(2000, 2500)));
        assert!(!query.admits("c2", &Span::new(1500, 1600)));

        let whole = CasQuery {
            window: None,
            ..query
        };
        assert!(whole.admits("c2", &Span::new(1, 2)));
        assert!(!whole.admits("c3", &Span::new(1, 2)));
    }
}
