//! Command-line interface for sts-search.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **search**: Find self-targeting spacers in one or more genomes
//! - **rerun-loci**: Re-classify the CRISPR loci of existing records
//! - **annotate-islands**: Fill in prophage flags left unset by an earlier run
//!
//! ## Usage
//!
//! ```text
//! # Search a directory of genomes with precomputed Cas gene hits
//! sts-search search --genomes genomes/ --out results/ --cas-hits cas.tsv
//!
//! # Re-run locus classification against new Cas profiles
//! sts-search rerun-loci results/records.jsonl --out rerun/ \
//!     --cas-hmms cas.hmm --proteins-dir proteins/
//!
//! # JSON run summary for scripting
//! sts-search --format json annotate-islands results/records.jsonl \
//!     --islands islands.tsv --out annotated/
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::external::{
    CasGeneSearch, CasHitTable, HmmscanCasSearch, NhmmscanRepeatModel, NoRepeatModel,
    ProteinDirectory, RepeatFamilyTable, RepeatModelSearch,
};
use crate::output::{RunSummary, ALL_RECORDS_TSV, SUMMARY_FILE};

pub mod islands;
pub mod rerun;
pub mod search;

#[derive(Parser)]
#[command(name = "sts-search")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Find self-targeting CRISPR spacers in prokaryotic genomes")]
#[command(
    long_about = "sts-search finds CRISPR spacers that match a location in their own genome.\n\nFor every such self-targeting spacer it reports:\n- The exact target site and its mutations relative to the spacer\n- Drift of the repeats flanking the spacer\n- The CRISPR-Cas subtype and orientation of the source locus\n- The genomic context of the target, including prophage islands"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search genomes for self-targeting spacers
    Search(search::SearchArgs),

    /// Re-run locus classification and orientation on existing records
    RerunLoci(rerun::RerunArgs),

    /// Look up prophage islands for records that were never checked
    AnnotateIslands(islands::IslandArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Where Cas genes and repeat families come from
#[derive(Args, Debug, Clone)]
pub struct LocusSourceArgs {
    /// Precomputed Cas gene hits (TSV: contig, start, end, strand, family, score[, id])
    #[arg(long, conflicts_with = "cas_hmms")]
    pub cas_hits: Option<PathBuf>,

    /// Cas protein profiles searched with hmmscan (requires --proteins-dir)
    #[arg(long, requires = "proteins_dir")]
    pub cas_hmms: Option<PathBuf>,

    /// Directory of predicted proteins, one `<genome>.faa` per genome
    #[arg(long)]
    pub proteins_dir: Option<PathBuf>,

    /// Repeat-family profiles searched with nhmmscan
    #[arg(long)]
    pub repeat_hmms: Option<PathBuf>,

    /// Subtypes carrying each repeat family (TSV: family, subtypes)
    #[arg(long, requires = "repeat_hmms")]
    pub repeat_families: Option<PathBuf>,

    /// hmmscan executable
    #[arg(long, default_value = "hmmscan")]
    pub hmmscan: PathBuf,

    /// nhmmscan executable
    #[arg(long, default_value = "nhmmscan")]
    pub nhmmscan: PathBuf,
}

impl LocusSourceArgs {
    /// Cas gene search, `None` when no Cas source was given
    ///
    /// # Errors
    ///
    /// Returns an error if the Cas hit table cannot be loaded.
    pub fn cas_search(&self) -> anyhow::Result<Option<Box<dyn CasGeneSearch>>> {
        if let Some(path) = &self.cas_hits {
            let table = CasHitTable::load(path)
                .with_context(|| format!("Failed to load Cas hits from {}", path.display()))?;
            return Ok(Some(Box::new(table)));
        }
        match (&self.cas_hmms, &self.proteins_dir) {
            (Some(profiles), Some(dir)) => Ok(Some(Box::new(HmmscanCasSearch::new(
                self.hmmscan.clone(),
                profiles.clone(),
                ProteinDirectory::new(dir.clone()),
            )))),
            _ => Ok(None),
        }
    }

    /// Repeat model; [`NoRepeatModel`] when no profiles were given
    ///
    /// # Errors
    ///
    /// Returns an error if the repeat family table cannot be loaded.
    pub fn repeat_model(&self) -> anyhow::Result<Box<dyn RepeatModelSearch>> {
        let Some(profiles) = &self.repeat_hmms else {
            return Ok(Box::new(NoRepeatModel));
        };
        let families = match &self.repeat_families {
            Some(path) => RepeatFamilyTable::load(path)
                .with_context(|| format!("Failed to load repeat families from {}", path.display()))?,
            None => RepeatFamilyTable::default(),
        };
        Ok(Box::new(NhmmscanRepeatModel::new(
            self.nhmmscan.clone(),
            profiles.clone(),
            families,
        )))
    }
}

/// Write the summary next to the records and report it
///
/// # Errors
///
/// Returns an error if the summary cannot be written or serialized.
pub fn finish(summary: &RunSummary, out: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let path = out.join(SUMMARY_FILE);
    summary
        .write(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(summary)?);
        }
        OutputFormat::Text => {
            println!("{} {} ({})", summary.tool, summary.command, summary.version);
            if !summary.genomes.is_empty() {
                println!(
                    "Genomes:            {} ({} failed)",
                    summary.genomes.len(),
                    summary.failed_genomes()
                );
            }
            println!("Records:            {}", summary.records);
            println!("  In prophage:      {}", summary.in_prophage);
            println!("  Outside prophage: {}", summary.outside_prophage);
            println!("  Not analysed:     {}", summary.prophage_not_analysed);
            println!("Results:            {}", out.join(ALL_RECORDS_TSV).display());
            for genome in &summary.genomes {
                if let crate::pipeline::GenomeStatus::Failed { kind, message } = &genome.status {
                    println!("  FAILED {} [{kind}]: {message}", genome.genome);
                }
            }
        }
    }
    Ok(())
}
