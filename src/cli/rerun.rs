use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::cli::{finish, LocusSourceArgs, OutputFormat};
use crate::config::LocusParams;
use crate::locus::LocusSources;
use crate::output::{read_records, write_record_files, RunSummary};
use crate::pipeline::rerun_loci;

#[derive(Args)]
pub struct RerunArgs {
    /// Records written by an earlier run (records.jsonl)
    #[arg(required = true)]
    pub records: PathBuf,

    /// Output directory
    #[arg(short, long)]
    pub out: PathBuf,

    #[command(flatten)]
    pub sources: LocusSourceArgs,

    /// Maximum distance between an array and its Cas genes (0 = whole genome)
    #[arg(long)]
    pub cas_distance: Option<usize>,

    /// Maximum e-value of a repeat-family hit
    #[arg(long)]
    pub repeat_evalue: Option<f64>,
}

pub fn run(args: RerunArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let records = read_records(&args.records)
        .with_context(|| format!("Failed to read records from {}", args.records.display()))?;
    if verbose {
        eprintln!("Re-classifying loci for {} record(s)", records.len());
    }

    let mut params = LocusParams::default();
    if let Some(distance) = args.cas_distance {
        params.cas_gene_distance = distance;
    }
    if let Some(evalue) = args.repeat_evalue {
        params.repeat_max_evalue = evalue;
    }

    let cas_genes = args.sources.cas_search()?;
    if cas_genes.is_none() {
        tracing::warn!("No Cas gene source given; loci will be unresolved");
    }
    let repeat_model = args.sources.repeat_model()?;
    let sources = LocusSources {
        cas_genes: cas_genes.as_deref(),
        repeat_model: &*repeat_model,
    };

    let records = rerun_loci(records, sources, &params)?;
    let split = write_record_files(&args.out, &records)
        .with_context(|| format!("Failed to write results to {}", args.out.display()))?;
    let summary = RunSummary::new("rerun-loci", records.len(), split);
    finish(&summary, &args.out, format)
}
