use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::cli::{finish, OutputFormat};
use crate::core::StsRecord;
use crate::external::{IslandTable, ProphageService};
use crate::output::{read_records, write_record_files, RunSummary};
use crate::pipeline::lookup_prophage;

#[derive(Args)]
pub struct IslandArgs {
    /// Records written by an earlier run (records.jsonl)
    #[arg(required = true)]
    pub records: PathBuf,

    /// Prophage islands (TSV: contig, start, end[, island id])
    #[arg(long)]
    pub islands: PathBuf,

    /// Output directory
    #[arg(short, long)]
    pub out: PathBuf,
}

/// Look up records whose prophage flag is unset; returns how many were resolved
pub fn annotate_islands(records: &mut [StsRecord], service: &dyn ProphageService) -> usize {
    let mut resolved = 0;
    for record in records.iter_mut().filter(|r| r.prophage.is_none()) {
        record.prophage = lookup_prophage(service, record);
        if record.prophage.is_some() {
            resolved += 1;
        }
    }
    resolved
}

pub fn run(args: IslandArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let mut records = read_records(&args.records)
        .with_context(|| format!("Failed to read records from {}", args.records.display()))?;
    let table = IslandTable::load(&args.islands)
        .with_context(|| format!("Failed to load islands from {}", args.islands.display()))?;

    let pending = records.iter().filter(|r| r.prophage.is_none()).count();
    let resolved = annotate_islands(&mut records, &table);
    tracing::info!(pending, resolved, "Annotated prophage islands");
    if verbose {
        eprintln!("Resolved {resolved} of {pending} unchecked record(s)");
    }

    let split = write_record_files(&args.out, &records)
        .with_context(|| format!("Failed to write results to {}", args.out.display()))?;
    let summary = RunSummary::new("annotate-islands", records.len(), split);
    finish(&summary, &args.out, format)
}
