use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;

use crate::cli::{finish, LocusSourceArgs, OutputFormat};
use crate::config::SearchConfig;
use crate::external::{
    BlastnSearch, ClustalOmega, CrtRepeatFinder, GeneAnnotation, IslandTable, ProphageService,
    ProteinDirectory, Toolkit,
};
use crate::output::{write_record_files, RunSummary};
use crate::parsing::fasta::collect_genome_paths;
use crate::pipeline::run_batch;

#[derive(Args)]
pub struct SearchArgs {
    /// Genome FASTA files (optionally gzipped) or directories of them
    #[arg(long, required = true, num_args = 1..)]
    pub genomes: Vec<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    pub out: PathBuf,

    /// JSON configuration file; flags below override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    // === Tools ===
    /// CRT jar used to find CRISPR arrays
    #[arg(long, default_value = "CRT1.2-CLI.jar")]
    pub crt_jar: PathBuf,

    /// Java executable used to run CRT
    #[arg(long, default_value = "java")]
    pub java: PathBuf,

    /// blastn executable
    #[arg(long, default_value = "blastn")]
    pub blastn: PathBuf,

    /// Clustal Omega executable
    #[arg(long, default_value = "clustalo")]
    pub clustalo: PathBuf,

    #[command(flatten)]
    pub sources: LocusSourceArgs,

    /// Prophage islands (TSV: contig, start, end[, island id])
    #[arg(long)]
    pub islands: Option<PathBuf>,

    // === Tuning ===
    /// Minimum number of spacers an array must have
    #[arg(long)]
    pub spacers: Option<usize>,

    /// Bases of padding added around each array footprint
    #[arg(long)]
    pub pad: Option<usize>,

    /// Maximum spacer length deviation from the mean, in percent
    #[arg(long)]
    pub percent_reject: Option<f64>,

    /// Maximum distance between an array and its Cas genes (0 = whole genome)
    #[arg(long)]
    pub cas_distance: Option<usize>,

    /// Maximum e-value of a spacer hit
    #[arg(long)]
    pub evalue: Option<f64>,

    /// Width of the flanks reported around each target
    #[arg(long)]
    pub flank_width: Option<usize>,

    /// Number of genomes processed concurrently
    #[arg(short = 't', long)]
    pub threads: Option<usize>,
}

impl SearchArgs {
    /// Defaults, then the config file, then flags
    fn config(&self) -> anyhow::Result<SearchConfig> {
        let mut config = match &self.config {
            Some(path) => SearchConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => SearchConfig::default(),
        };
        if let Some(spacers) = self.spacers {
            config.repeat_finder.min_repeats = spacers + 1;
            config.boundary.min_spacers = spacers;
        }
        if let Some(pad) = self.pad {
            config.matching.pad = pad;
        }
        if let Some(percent) = self.percent_reject {
            config.validity.percent_reject = percent;
        }
        if let Some(distance) = self.cas_distance {
            config.locus.cas_gene_distance = distance;
        }
        if let Some(evalue) = self.evalue {
            config.matching.max_evalue = evalue;
        }
        if let Some(width) = self.flank_width {
            config.annotation.flank_width = width;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        config.validate()?;
        Ok(config)
    }

    fn toolkit(&self, config: &SearchConfig) -> anyhow::Result<Toolkit> {
        let mut repeat_finder = CrtRepeatFinder::new(self.crt_jar.clone(), config.repeat_finder.clone());
        repeat_finder.java = self.java.clone();

        let prophage = match &self.islands {
            Some(path) => {
                let table = IslandTable::load(path)
                    .with_context(|| format!("Failed to load islands from {}", path.display()))?;
                Some(Box::new(table) as Box<dyn ProphageService>)
            }
            None => None,
        };
        let annotation = self
            .sources
            .proteins_dir
            .as_ref()
            .map(|dir| Box::new(ProteinDirectory::new(dir.clone())) as Box<dyn GeneAnnotation>);

        Ok(Toolkit {
            repeat_finder: Box::new(repeat_finder),
            search: Box::new(BlastnSearch::new(self.blastn.clone(), config.matching.max_evalue)),
            aligner: Box::new(ClustalOmega::new(self.clustalo.clone())),
            cas_genes: self.sources.cas_search()?,
            repeat_model: self.sources.repeat_model()?,
            prophage,
            annotation,
        })
    }
}

pub fn run(args: SearchArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = args.config()?;
    let paths = collect_genome_paths(&args.genomes)?;
    let toolkit = args.toolkit(&config)?;

    if verbose {
        eprintln!("Searching {} genome(s) with {} worker(s)", paths.len(), config.threads.max(1));
    }
    tracing::info!(genomes = paths.len(), threads = config.threads, "Starting search");

    let rt = tokio::runtime::Runtime::new()?;
    let outcome = rt.block_on(run_batch(paths, Arc::new(toolkit), Arc::new(config.clone())));

    let split = write_record_files(&args.out, &outcome.records)
        .with_context(|| format!("Failed to write results to {}", args.out.display()))?;
    let summary = RunSummary::new("search", outcome.records.len(), split)
        .with_config(&config)
        .with_genomes(outcome.genomes);
    finish(&summary, &args.out, format)
}
