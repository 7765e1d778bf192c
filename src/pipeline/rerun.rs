use std::collections::{BTreeSet, HashMap};

use crate::config::LocusParams;
use crate::core::{ArrayId, StsRecord};
use crate::locus::{analyze_locus, LocusAnalysis, LocusSources};
use crate::pipeline::PipelineError;

/// Contigs known for each genome from the records alone
fn contigs_by_genome(records: &[StsRecord]) -> HashMap<String, Vec<String>> {
    let mut sets: HashMap<String, BTreeSet<String>> = HashMap::new();
    for record in records {
        let set = sets.entry(record.genome.clone()).or_default();
        set.insert(record.array.contig.clone());
        set.insert(record.hit.contig.clone());
    }
    sets.into_iter()
        .map(|(genome, set)| (genome, set.into_iter().collect()))
        .collect()
}

/// Re-run locus classification and orientation on existing records.
///
/// Locus fields and the orientation call are overwritten unconditionally.
/// Everything else is kept as recorded, except that the flanks are swapped
/// when the effective orientation changes. Edits are stored in the
/// repeat-finder's orientation and are never touched.
///
/// # Errors
///
/// Returns `PipelineError` if a Cas gene or repeat-model search fails.
pub fn rerun_loci(
    records: Vec<StsRecord>,
    sources: LocusSources<'_>,
    params: &LocusParams,
) -> Result<Vec<StsRecord>, PipelineError> {
    let contigs = contigs_by_genome(&records);
    let mut cache: HashMap<(String, ArrayId), LocusAnalysis> = HashMap::new();
    let mut flipped = 0usize;

    let mut updated = Vec::with_capacity(records.len());
    for mut record in records {
        let key = (record.genome.clone(), record.array.id);
        let analysis = match cache.get(&key) {
            Some(analysis) => analysis.clone(),
            None => {
                let genome_contigs = contigs.get(&record.genome).map_or(&[][..], Vec::as_slice);
                let analysis = analyze_locus(
                    &record.genome,
                    genome_contigs,
                    &record.array,
                    &record.consensus,
                    sources,
                    params,
                )?;
                cache.insert(key, analysis.clone());
                analysis
            }
        };

        let before = record.orientation.orientation.effective_strand();
        let after = analysis.orientation.orientation.effective_strand();
        if before != after {
            record.mutation.flanks = record.mutation.flanks.flipped();
            flipped += 1;
        }
        record.locus = analysis.locus;
        record.orientation = analysis.orientation;
        updated.push(record);
    }

    tracing::info!(records = updated.len(), arrays = cache.len(), flipped, "Re-ran locus classification");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::array::fixtures::array_from_parts;
    use crate::core::{
        CasGeneHit, Completeness, ConsensusStatus, Edit, EditType, FlankPair, LocusCall,
        MutationRecord, Orientation, OrientationCall, OrientationEvidence, RepeatDrift, Span,
        SpacerRef, Strand, Subtype, TargetContext, TargetHit,
    };
    use crate::external::{CasHitTable, NoRepeatModel};

    fn record() -> StsRecord {
        let array = array_from_parts(1, 10_000, &["GTTTCAGTGGCCTTAA"; 3], &["ACGTACGTACGTACGTACGT"; 2]);
        StsRecord {
            genome: "g1".to_string(),
            hit: TargetHit {
                contig: "contig1".to_string(),
                span: Span::new(50_000, 50_020),
                strand: Strand::Forward,
                spacer: SpacerRef {
                    array: ArrayId(1),
                    spacer: 1,
                },
                query_span: Span::new(0, 20),
                mismatches: 1,
                gap_opens: 0,
                evalue: 1e-5,
                bitscore: 32.0,
            },
            array,
            consensus: ConsensusStatus::Unavailable {
                reason: "test".to_string(),
            },
            orientation: OrientationCall {
                orientation: Orientation::Forward,
                evidence: OrientationEvidence::GeneBased,
            },
            mutation: MutationRecord {
                target_span: Span::new(50_000, 50_020),
                target_sequence: "ACGTACGTACGTACGTACGA".to_string(),
                edits: vec![Edit {
                    guide_pos: 19,
                    kind: EditType::Mismatch,
                    guide_base: Some('T'),
                    target_base: Some('A'),
                }],
                mismatches: 1,
                insertions: 0,
                deletions: 0,
                repeat_drift: RepeatDrift::Skipped {
                    reason: "test".to_string(),
                },
                flanks: FlankPair {
                    upstream: "AAACCCGGG".to_string(),
                    downstream: "TTTAAACCC".to_string(),
                },
            },
            locus: LocusCall {
                subtype: Subtype::Resolved("I-E".to_string()),
                completeness: Completeness::Complete,
                genes: Vec::new(),
                repeat_family: None,
                repeat_subtypes: Vec::new(),
            },
            target_context: TargetContext::NotAnnotated,
            prophage: Some(false),
        }
    }

    /// Type I-F genes downstream of the array, so it reads as reverse
    fn downstream_type_if() -> CasHitTable {
        let gene = |family: &str, start: usize| CasGeneHit {
            family: family.to_string(),
            contig: "contig1".to_string(),
            span: Span::with_len(start, 900),
            strand: Strand::Reverse,
            score: 200.0,
            id: None,
        };
        CasHitTable::new(vec![
            gene("Cas1", 12_000),
            gene("Cas3", 13_000),
            gene("Csy1", 14_000),
            gene("Csy2", 15_000),
            gene("Csy3", 16_000),
            gene("Csy4", 17_000),
        ])
    }

    #[test]
    fn test_orientation_flip_swaps_flanks_only() {
        let original = record();
        let table = downstream_type_if();
        let sources = LocusSources {
            cas_genes: Some(&table),
            repeat_model: &NoRepeatModel,
        };
        let updated = rerun_loci(vec![original.clone()], sources, &LocusParams::default()).unwrap();
        let updated = &updated[0];

        assert_eq!(updated.orientation.orientation, Orientation::Reverse);
        assert_eq!(updated.locus.subtype, Subtype::Resolved("I-F".to_string()));
        assert_eq!(updated.mutation.flanks, original.mutation.flanks.flipped());
        assert_eq!(updated.mutation.flanks.upstream, "GGGTTTAAA");
        assert_eq!(updated.mutation.edits, original.mutation.edits);
        assert_eq!(updated.mutation.target_span, original.mutation.target_span);
        assert_eq!(updated.hit, original.hit);
        assert_eq!(updated.prophage, original.prophage);
    }

    #[test]
    fn test_unchanged_orientation_keeps_flanks() {
        let original = record();
        let sources = LocusSources {
            cas_genes: None,
            repeat_model: &NoRepeatModel,
        };
        let updated = rerun_loci(vec![original.clone()], sources, &LocusParams::default()).unwrap();
        // no evidence: unknown reads like forward, so flanks stay put
        assert_eq!(updated[0].orientation.orientation, Orientation::Unknown);
        assert_eq!(updated[0].locus.subtype, Subtype::Unresolved);
        assert_eq!(updated[0].mutation.flanks, original.mutation.flanks);
    }
}
