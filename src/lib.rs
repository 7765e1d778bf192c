//! # sts-search
//!
//! A library for finding self-targeting CRISPR spacers in prokaryotic genomes.
//!
//! A CRISPR array stores spacers copied from foreign DNA between short
//! repeats. Occasionally a spacer matches a site in its own genome, which
//! makes the CRISPR-Cas system a threat to its host unless that target, the
//! spacer, or the Cas machinery has been disabled.
//!
//! `sts-search` finds these self-targeting spacers and annotates each one
//! with the information needed to judge why the host survives.
//!
//! ## Features
//!
//! - **Array detection**: Degenerate runs are masked before an external repeat-finder runs
//! - **Boundary correction**: Repeat/spacer boundaries are shifted onto conserved columns
//! - **Consensus repeats**: Built from a multiple alignment of the repeats
//! - **Target annotation**: Mismatches, indels, repeat drift, and flanks for every target
//! - **Locus classification**: CRISPR-Cas subtype, completeness, and orientation
//! - **Batch runs**: Genomes are processed concurrently; one failure never stops the rest
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! use sts_search::external::{
//!     BlastnSearch, CasHitTable, ClustalOmega, CrtRepeatFinder, NoRepeatModel, Toolkit,
//! };
//! use sts_search::SearchConfig;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let config = SearchConfig::default();
//! let toolkit = Toolkit {
//!     repeat_finder: Box::new(CrtRepeatFinder::new("CRT1.2-CLI.jar".into(), config.repeat_finder.clone())),
//!     search: Box::new(BlastnSearch::new("blastn".into(), config.matching.max_evalue)),
//!     aligner: Box::new(ClustalOmega::new("clustalo".into())),
//!     cas_genes: Some(Box::new(CasHitTable::load("cas.tsv".as_ref())?)),
//!     repeat_model: Box::new(NoRepeatModel),
//!     prophage: None,
//!     annotation: None,
//! };
//!
//! let outcome = sts_search::run_batch(
//!     vec![PathBuf::from("genome.fna")],
//!     Arc::new(toolkit),
//!     Arc::new(config),
//! )
//! .await;
//!
//! for record in &outcome.records {
//!     println!("{} {} {}", record.genome, record.hit.contig, record.mutation.notation());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Spans, contigs, arrays, and the self-targeting record
//! - [`masking`]: Degenerate-run masking ahead of array detection
//! - [`array`]: Array refinement: boundaries, consensus, validity
//! - [`targeting`]: Spacer targets and their mutation and context annotation
//! - [`locus`]: Cas-gene subtype classification and array orientation
//! - [`external`]: Collaborator traits and the tools behind them
//! - [`parsing`]: Parsers for FASTA genomes, tool output, and tables
//! - [`pipeline`]: Per-genome pipeline and the concurrent batch runner
//! - [`output`]: Record files, TSV export, and the run summary
//! - [`cli`]: Command-line interface implementation

pub mod array;
pub mod cli;
pub mod config;
pub mod core;
pub mod external;
pub mod locus;
pub mod masking;
pub mod output;
pub mod parsing;
pub mod pipeline;
pub mod targeting;

// Re-export commonly used types for convenience
pub use config::SearchConfig;
pub use core::record::*;
pub use core::types::*;
pub use core::{Array, ArrayId, ConsensusStatus, Contig, Genome, SpacerRef};
pub use pipeline::{process_genome, rerun_loci, run_batch, BatchOutcome, PipelineError};
