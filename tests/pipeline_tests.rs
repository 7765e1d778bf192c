//! End-to-end pipeline tests

mod common;

use std::path::PathBuf;
use std::sync::Arc;

use common::*;
use sts_search::pipeline::{process_genome, run_batch, GenomeStatus};
use sts_search::{Contig, EditType, Genome, Orientation, Span, Strand, Subtype, TargetContext};
use tempfile::TempDir;

#[test]
fn test_genome_yields_annotated_targets() {
    let report = process_genome(&genome("alpha"), &toolkit(), &config()).unwrap();

    assert_eq!(report.stats.arrays, 1);
    assert_eq!(report.stats.valid_arrays, 1);
    // the copy next to the array is dropped, the two distant ones kept
    assert_eq!(report.stats.targets, 2);
    assert_eq!(report.records.len(), 2);

    let forward = &report.records[0];
    assert_eq!(forward.hit.spacer.spacer, 2);
    assert_eq!(forward.hit.strand, Strand::Forward);
    assert_eq!(forward.mutation.target_span, Span::with_len(FORWARD_TARGET, 32));
    assert_eq!(forward.mutation.notation(), "Perfect match");
    assert_eq!(forward.locus.subtype, Subtype::Resolved("I-E".to_string()));
    assert_eq!(forward.orientation.orientation, Orientation::Forward);
    assert_eq!(forward.prophage, Some(false));
    assert_eq!(
        forward.target_context,
        TargetContext::Within {
            gene: "chr1_7".to_string()
        }
    );
    let contig = Contig::new(CONTIG, genome_sequence(7));
    assert_eq!(
        forward.mutation.flanks.upstream,
        contig.slice_str(Span::new(FORWARD_TARGET - 9, FORWARD_TARGET))
    );
    assert_eq!(
        forward.mutation.flanks.downstream,
        contig.slice_str(Span::new(FORWARD_TARGET + 32, FORWARD_TARGET + 41))
    );
    assert_eq!(forward.consensus.consensus().unwrap().sequence, REPEAT);

    let reverse = &report.records[1];
    assert_eq!(reverse.hit.spacer.spacer, 3);
    assert_eq!(reverse.hit.strand, Strand::Reverse);
    assert_eq!(reverse.mutation.mismatches, 1);
    assert_eq!(reverse.mutation.target_span, Span::with_len(REVERSE_TARGET, 32));
    let changed: Vec<_> = reverse.mutation.differences().collect();
    assert_eq!(changed.len(), 1);
    assert_eq!(changed[0].guide_pos, 5);
    assert_eq!(changed[0].kind, EditType::Mismatch);
    assert_eq!(reverse.prophage, Some(true));
    assert_eq!(
        reverse.target_context,
        TargetContext::Between {
            upstream: Some("chr1_7".to_string()),
            downstream: None
        }
    );
}

#[test]
fn test_masked_array_is_rejected() {
    let mut sequence = genome_sequence(11);
    // a long N run over the array
    for base in &mut sequence[1_500..2_200] {
        *base = b'N';
    }
    let genome = Genome::new("masked", vec![Contig::new(CONTIG, sequence)]);
    let report = process_genome(&genome, &toolkit(), &config()).unwrap();
    assert_eq!(report.stats.arrays, 1);
    assert_eq!(report.stats.valid_arrays, 0);
    assert!(report.records.is_empty());
}

#[test]
fn test_tool_failure_is_reported() {
    let genome = Genome::new("bad", vec![Contig::new("broken", random_bases(500, 3))]);
    let err = process_genome(&genome, &toolkit(), &config()).unwrap_err();
    assert_eq!(err.kind(), "external_tool_failure");
}

#[tokio::test]
async fn test_batch_isolates_failing_genomes() {
    let dir = TempDir::new().unwrap();
    let paths = vec![
        write_fasta(&dir, "beta.fa", &[(CONTIG, genome_sequence(21))]),
        write_fasta(&dir, "broken.fa", &[("broken", random_bases(800, 5))]),
        write_fasta(&dir, "alpha.fa", &[(CONTIG, genome_sequence(7))]),
        dir.path().join("missing.fa"),
    ];

    let outcome = run_batch(paths, Arc::new(toolkit()), Arc::new(config())).await;

    assert_eq!(outcome.genomes.len(), 4);
    assert_eq!(outcome.failures(), 2);
    let names: Vec<&str> = outcome.genomes.iter().map(|g| g.genome.as_str()).collect();
    assert_eq!(names, ["alpha", "beta", "broken", "missing"]);

    match &outcome.genomes[2].status {
        GenomeStatus::Failed { kind, message } => {
            assert_eq!(kind, "external_tool_failure");
            assert!(message.contains("simulated failure"));
        }
        GenomeStatus::Success(_) => panic!("broken genome should fail"),
    }
    assert!(matches!(
        &outcome.genomes[3].status,
        GenomeStatus::Failed { kind, .. } if kind == "malformed_input"
    ));

    // records of both healthy genomes, grouped by genome
    assert_eq!(outcome.records.len(), 4);
    let genomes: Vec<&str> = outcome.records.iter().map(|r| r.genome.as_str()).collect();
    assert_eq!(genomes, ["alpha", "alpha", "beta", "beta"]);
}

#[tokio::test]
async fn test_batch_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let paths: Vec<PathBuf> = (0..4)
        .map(|i| write_fasta(&dir, &format!("g{i}.fa"), &[(CONTIG, genome_sequence(100 + i))]))
        .collect();

    let first = run_batch(paths.clone(), Arc::new(toolkit()), Arc::new(config())).await;
    let second = run_batch(paths, Arc::new(toolkit()), Arc::new(config())).await;
    assert_eq!(first.records, second.records);
    assert_eq!(first.genomes, second.genomes);
    assert_eq!(first.failures(), 0);
}
