use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::core::{LocusCall, StsRecord};
use crate::output::{OutputError, IN_PROPHAGE_TSV, NO_PROPHAGE_ANALYSIS_TSV, OUTSIDE_PROPHAGE_TSV};

pub const HEADER: &[&str] = &[
    "genome",
    "array",
    "spacer",
    "spacer_sequence",
    "array_contig",
    "array_start",
    "array_end",
    "target_contig",
    "target_start",
    "target_end",
    "target_strand",
    "target_sequence",
    "mutations",
    "mismatches",
    "insertions",
    "deletions",
    "evalue",
    "consensus_repeat",
    "repeat_drift",
    "upstream_flank",
    "downstream_flank",
    "orientation",
    "subtype",
    "completeness",
    "cas_genes",
    "repeat_family",
    "target_context",
    "in_prophage",
];

fn repeat_family(locus: &LocusCall) -> String {
    match (&locus.repeat_family, locus.repeat_subtypes.is_empty()) {
        (Some(family), true) => family.clone(),
        (Some(family), false) => format!("{family} ({})", locus.repeat_subtypes.join(", ")),
        (None, _) => "NA".to_string(),
    }
}

/// One TSV row; coordinates 1-based inclusive
#[must_use]
pub fn row(record: &StsRecord) -> Vec<String> {
    let array_span = record.array.span();
    let target = record.mutation.target_span;
    let consensus = record
        .consensus
        .consensus()
        .map_or_else(|| "NA".to_string(), |c| c.sequence.clone());
    let prophage = match record.prophage {
        Some(true) => "yes",
        Some(false) => "no",
        None => "NA",
    };
    vec![
        record.genome.clone(),
        record.array.id.to_string(),
        record.hit.spacer.spacer.to_string(),
        record.oriented_spacer(),
        record.array.contig.clone(),
        (array_span.start + 1).to_string(),
        array_span.end.to_string(),
        record.hit.contig.clone(),
        (target.start + 1).to_string(),
        target.end.to_string(),
        record.hit.strand.to_string(),
        record.mutation.target_sequence.clone(),
        record.mutation.notation(),
        record.mutation.mismatches.to_string(),
        record.mutation.insertions.to_string(),
        record.mutation.deletions.to_string(),
        format!("{:e}", record.hit.evalue),
        consensus,
        record.mutation.repeat_drift.summary(),
        record.mutation.flanks.upstream.clone(),
        record.mutation.flanks.downstream.clone(),
        record.orientation.describe(),
        record.locus.subtype.to_string(),
        record.locus.completeness.to_string(),
        record.locus.gene_list(),
        repeat_family(&record.locus),
        record.target_context.to_string(),
        prophage.to_string(),
    ]
}

/// Write records as TSV with a header row
///
/// # Errors
///
/// Returns `OutputError` if the file cannot be written.
pub fn write_tsv<'a>(
    path: &Path,
    records: impl IntoIterator<Item = &'a StsRecord>,
) -> Result<usize, OutputError> {
    let file = File::create(path).map_err(OutputError::io(path))?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{}", HEADER.join("\t")).map_err(OutputError::io(path))?;
    let mut count = 0;
    for record in records {
        writeln!(writer, "{}", row(record).join("\t")).map_err(OutputError::io(path))?;
        count += 1;
    }
    writer.flush().map_err(OutputError::io(path))?;
    Ok(count)
}

/// Number of records in each prophage file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProphageSplit {
    pub in_prophage: usize,
    pub outside_prophage: usize,
    pub not_analysed: usize,
}

/// Split records by their prophage flag into the three prophage files
///
/// # Errors
///
/// Returns `OutputError` if a file cannot be written.
pub fn write_prophage_split(dir: &Path, records: &[StsRecord]) -> Result<ProphageSplit, OutputError> {
    let with_flag = |flag: Option<bool>| records.iter().filter(move |r| r.prophage == flag);
    Ok(ProphageSplit {
        in_prophage: write_tsv(&dir.join(IN_PROPHAGE_TSV), with_flag(Some(true)))?,
        outside_prophage: write_tsv(&dir.join(OUTSIDE_PROPHAGE_TSV), with_flag(Some(false)))?,
        not_analysed: write_tsv(&dir.join(NO_PROPHAGE_ANALYSIS_TSV), with_flag(None))?,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::array::fixtures::array_from_parts;
    use crate::core::{
        ArrayId, Completeness, ConsensusRepeat, ConsensusStatus, Edit, EditType, FlankPair,
        MutationRecord, Orientation, OrientationCall, OrientationEvidence, RepeatComparison,
        RepeatDrift, Span, SpacerRef, Strand, Subtype, TargetContext, TargetHit,
    };
    use tempfile::TempDir;

    pub fn sample_record(prophage: Option<bool>) -> StsRecord {
        let array = array_from_parts(2, 99, &["GTTTCAGTGGCCTTAA"; 3], &["ACGGATTCAGTCCATG", "TTGACCAGTAGGACAT"]);
        StsRecord {
            genome: "genomeA".to_string(),
            hit: TargetHit {
                contig: "contig7".to_string(),
                span: Span::new(4_999, 5_015),
                strand: Strand::Reverse,
                spacer: SpacerRef {
                    array: ArrayId(2),
                    spacer: 1,
                },
                query_span: Span::new(0, 16),
                mismatches: 0,
                gap_opens: 0,
                evalue: 2.5e-7,
                bitscore: 32.2,
            },
            array,
            consensus: ConsensusStatus::Available(ConsensusRepeat {
                sequence: "GTTTCAGTGGCCTTAA".to_string(),
                aligned: "GTTTCAGTGGCCTTAA".to_string(),
                conservation: vec![1.0; 16],
                rows: vec![Some("GTTTCAGTGGCCTTAA".to_string()); 3],
                deviations: vec![Some(0); 3],
            }),
            orientation: OrientationCall {
                orientation: Orientation::Forward,
                evidence: OrientationEvidence::Concordant,
            },
            mutation: MutationRecord {
                target_span: Span::new(4_999, 5_015),
                target_sequence: "ACGGATTCAGTCCATG".to_string(),
                edits: (0..16)
                    .map(|i| Edit {
                        guide_pos: i,
                        kind: EditType::Match,
                        guide_base: Some('A'),
                        target_base: Some('A'),
                    })
                    .collect(),
                mismatches: 0,
                insertions: 0,
                deletions: 0,
                repeat_drift: RepeatDrift::Assessed {
                    upstream: RepeatComparison::Identical,
                    downstream: RepeatComparison::Identical,
                },
                flanks: FlankPair {
                    upstream: "CCCAAAGGG".to_string(),
                    downstream: "TTTGGGAAA".to_string(),
                },
            },
            locus: LocusCall {
                subtype: Subtype::Resolved("I-E".to_string()),
                completeness: Completeness::Missing(vec!["Cas2".to_string()]),
                genes: Vec::new(),
                repeat_family: Some("F2".to_string()),
                repeat_subtypes: vec!["I-E".to_string()],
            },
            target_context: TargetContext::Within {
                gene: "contig7_12".to_string(),
            },
            prophage,
        }
    }

    #[test]
    fn test_row_uses_one_based_coordinates() {
        let record = sample_record(Some(true));
        let row = row(&record);
        assert_eq!(row.len(), HEADER.len());
        let field = |name: &str| row[HEADER.iter().position(|h| *h == name).unwrap()].clone();
        assert_eq!(field("target_start"), "5000");
        assert_eq!(field("target_end"), "5015");
        assert_eq!(field("array_start"), "100");
        assert_eq!(field("target_strand"), "-");
        assert_eq!(field("mutations"), "Perfect match");
        assert_eq!(field("subtype"), "Type I-E");
        assert_eq!(field("completeness"), "Proteins missing: Cas2");
        assert_eq!(field("repeat_family"), "F2 (I-E)");
        assert_eq!(field("repeat_drift"), "None");
        assert_eq!(field("in_prophage"), "yes");
    }

    #[test]
    fn test_prophage_split() {
        let dir = TempDir::new().unwrap();
        let records = vec![
            sample_record(Some(true)),
            sample_record(Some(false)),
            sample_record(None),
            sample_record(None),
        ];
        let split = write_prophage_split(dir.path(), &records).unwrap();
        assert_eq!(
            split,
            ProphageSplit {
                in_prophage: 1,
                outside_prophage: 1,
                not_analysed: 2
            }
        );
        let text = std::fs::read_to_string(dir.path().join(NO_PROPHAGE_ANALYSIS_TSV)).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.starts_with("genome\tarray\tspacer"));
    }
}
