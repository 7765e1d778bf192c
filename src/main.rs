use clap::Parser;
use tracing_subscriber::EnvFilter;

mod array;
mod cli;
mod config;
mod core;
mod external;
mod locus;
mod masking;
mod output;
mod parsing;
mod pipeline;
mod targeting;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("sts_search=debug,info")
    } else {
        EnvFilter::new("sts_search=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        cli::Commands::Search(args) => {
            cli::search::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::RerunLoci(args) => {
            cli::rerun::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::AnnotateIslands(args) => {
            cli::islands::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
