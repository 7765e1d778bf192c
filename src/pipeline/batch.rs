use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Semaphore};

use crate::config::SearchConfig;
use crate::core::StsRecord;
use crate::external::Toolkit;
use crate::parsing::fasta::{genome_name, read_genome};
use crate::pipeline::genome::{process_genome, GenomeStats};

/// Outcome of one genome in a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenomeStatus {
    Success(GenomeStats),
    Failed { kind: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenomeResult {
    pub genome: String,
    pub path: PathBuf,
    pub status: GenomeStatus,
}

/// Everything the collector gathered, sorted by genome
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub records: Vec<StsRecord>,
    pub genomes: Vec<GenomeResult>,
}

impl BatchOutcome {
    #[must_use]
    pub fn failures(&self) -> usize {
        self.genomes
            .iter()
            .filter(|g| matches!(g.status, GenomeStatus::Failed { .. }))
            .count()
    }

    fn sort(&mut self) {
        self.records.sort_by_key(StsRecord::sort_key);
        self.genomes.sort_by(|a, b| a.genome.cmp(&b.genome).then_with(|| a.path.cmp(&b.path)));
    }
}

/// Read and process genomes concurrently.
///
/// At most `config.threads` genomes are in flight; each runs on the
/// blocking pool because every collaborator call blocks. Workers hand their
/// results to a single collector task, which is the only place results are
/// appended. A failing or panicking genome is recorded as
/// [`GenomeStatus::Failed`] and never affects the others.
pub async fn run_batch(
    paths: Vec<PathBuf>,
    toolkit: Arc<Toolkit>,
    config: Arc<SearchConfig>,
) -> BatchOutcome {
    let limit = config.threads.max(1);
    let semaphore = Arc::new(Semaphore::new(limit));
    let (tx, mut rx) = mpsc::channel::<(GenomeResult, Vec<StsRecord>)>(limit);

    let collector = tokio::spawn(async move {
        let mut outcome = BatchOutcome::default();
        while let Some((result, records)) = rx.recv().await {
            outcome.records.extend(records);
            outcome.genomes.push(result);
        }
        outcome
    });

    tracing::info!(genomes = paths.len(), workers = limit, "Processing genomes");

    let mut workers = Vec::with_capacity(paths.len());
    for path in paths {
        let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
            break;
        };
        let tx = tx.clone();
        let toolkit = Arc::clone(&toolkit);
        let config = Arc::clone(&config);

        workers.push(tokio::spawn(async move {
            let _permit = permit;
            let name = genome_name(&path);
            let input = path.clone();
            let joined = tokio::task::spawn_blocking(move || {
                let genome = read_genome(&input)?;
                process_genome(&genome, &toolkit, &config)
            })
            .await;

            let (status, records) = match joined {
                Ok(Ok(report)) => (GenomeStatus::Success(report.stats), report.records),
                Ok(Err(e)) => {
                    tracing::warn!(genome = %name, error = %e, "Genome failed");
                    let status = GenomeStatus::Failed {
                        kind: e.kind().to_string(),
                        message: e.to_string(),
                    };
                    (status, Vec::new())
                }
                Err(e) => {
                    tracing::warn!(genome = %name, error = %e, "Genome worker panicked");
                    let status = GenomeStatus::Failed {
                        kind: "panic".to_string(),
                        message: e.to_string(),
                    };
                    (status, Vec::new())
                }
            };

            let result = GenomeResult {
                genome: name,
                path,
                status,
            };
            if tx.send((result, records)).await.is_err() {
                tracing::warn!("Result collector stopped early");
            }
        }));
    }
    drop(tx);

    for worker in workers {
        if let Err(e) = worker.await {
            tracing::warn!(error = %e, "Worker task failed");
        }
    }

    let mut outcome = match collector.await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(error = %e, "Result collector failed");
            BatchOutcome::default()
        }
    };
    outcome.sort();
    tracing::info!(
        genomes = outcome.genomes.len(),
        failed = outcome.failures(),
        records = outcome.records.len(),
        "Batch finished"
    );
    outcome
}
