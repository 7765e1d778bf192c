use crate::array::consensus::drift_notation;
use crate::config::AnnotationParams;
use crate::core::types::reverse_complement;
use crate::core::{
    Array, ConsensusStatus, Contig, Edit, EditType, FlankPair, MutationRecord, RepeatComparison,
    RepeatDrift, Spacer, Span, Strand, TargetHit,
};
use crate::targeting::align::{align_guide, bases_match, AlignOp};

/// Result of annotating one hit
#[derive(Debug, Clone, PartialEq)]
pub enum HitAnnotation {
    Annotated(MutationRecord),
    /// The target is flanked by the array's own repeat: an unannotated repeat copy
    RepeatCopy,
}

/// Genomic window to re-align the guide in, and whether it hit a contig edge
struct Window {
    span: Span,
    clipped_start: bool,
    clipped_end: bool,
}

/// Full spacer register implied by a (possibly partial) local hit, padded by `slack`
fn target_window(hit: &TargetHit, guide_len: usize, contig_len: usize, slack: usize) -> Window {
    let (before, after) = match hit.strand {
        Strand::Forward => (hit.query_span.start, guide_len.saturating_sub(hit.query_span.end)),
        Strand::Reverse => (guide_len.saturating_sub(hit.query_span.end), hit.query_span.start),
    };
    let want_start = hit.span.start as i64 - (before + slack) as i64;
    let want_end = (hit.span.end + after + slack) as i64;
    let start = want_start.max(0) as usize;
    let end = (want_end as usize).min(contig_len);

    // Clipping is reported relative to the guide's 5' and 3' ends
    let (left, right) = (want_start < 0, want_end > contig_len as i64);
    let (clipped_start, clipped_end) = match hit.strand {
        Strand::Forward => (left, right),
        Strand::Reverse => (right, left),
    };
    Window {
        span: Span::new(start, end.max(start)),
        clipped_start,
        clipped_end,
    }
}

fn to_char(base: u8) -> char {
    char::from(base.to_ascii_uppercase())
}

fn count_mismatches(a: &str, b: &str) -> usize {
    a.bytes()
        .zip(b.bytes())
        .filter(|(x, y)| !x.eq_ignore_ascii_case(y))
        .count()
}

fn compare_repeat(consensus_aligned: &str, row: Option<&String>) -> RepeatComparison {
    match row {
        Some(row) => {
            let notation = drift_notation(consensus_aligned, row);
            if notation.chars().all(|c| c == '.') {
                RepeatComparison::Identical
            } else {
                RepeatComparison::Drift(notation)
            }
        }
        None => RepeatComparison::Absent,
    }
}

/// Repeat drift of the repeats on either side of spacer `index` (as called)
#[must_use]
pub fn repeat_drift(array: &Array, index: usize, consensus: &ConsensusStatus) -> RepeatDrift {
    let consensus = match consensus {
        ConsensusStatus::Available(c) => c,
        ConsensusStatus::Unavailable { reason } => {
            return RepeatDrift::Skipped {
                reason: reason.clone(),
            }
        }
    };
    // rows follow repeat order; spacer i sits between repeats i-1 and i (0-based)
    let row = |i: usize| consensus.rows.get(i).and_then(Option::as_ref);
    let (up, down) = array.flanking_repeats(index);
    RepeatDrift::Assessed {
        upstream: compare_repeat(&consensus.aligned, up.and_then(|_| row(index - 1))),
        downstream: compare_repeat(&consensus.aligned, down.and_then(|_| row(index))),
    }
}

/// Compare the guide spacer with its target and report the surrounding context.
///
/// The guide is re-aligned against the full spacer register around the hit,
/// so partial or gapped local hits still produce one edit per guide base.
/// Edits, target sequence and repeat drift are given in the orientation the
/// repeat-finder called the array in; the flanks are given in crRNA
/// orientation (`orientation`). Hits whose flanks reproduce the ends of the
/// consensus repeat are reported as [`HitAnnotation::RepeatCopy`].
#[must_use]
pub fn annotate_hit(
    hit: &TargetHit,
    array: &Array,
    spacer: &Spacer,
    consensus: &ConsensusStatus,
    contig: &Contig,
    orientation: Strand,
    params: &AnnotationParams,
) -> HitAnnotation {
    let guide = spacer.sequence.as_bytes();
    let window = target_window(hit, guide.len(), contig.len(), params.realign_slack);
    let raw = contig.slice(window.span);
    let seq = match hit.strand {
        Strand::Forward => raw.to_vec(),
        Strand::Reverse => reverse_complement(raw),
    };
    let expected_end = (guide.len() + params.realign_slack).min(seq.len());
    let alignment = align_guide(guide, &seq, expected_end);

    let first_placed = alignment
        .ops
        .iter()
        .position(|op| !matches!(op, AlignOp::Deletion(_)));
    let last_placed = alignment
        .ops
        .iter()
        .rposition(|op| !matches!(op, AlignOp::Deletion(_)));

    let mut edits = Vec::with_capacity(alignment.ops.len());
    let mut next_guide = 0;
    for (k, op) in alignment.ops.iter().enumerate() {
        let edit = match *op {
            AlignOp::Pair(g, w) => {
                next_guide = g + 1;
                Edit {
                    guide_pos: g,
                    kind: if bases_match(guide[g], seq[w]) {
                        EditType::Match
                    } else {
                        EditType::Mismatch
                    },
                    guide_base: Some(to_char(guide[g])),
                    target_base: Some(to_char(seq[w])),
                }
            }
            AlignOp::Insertion(w) => Edit {
                guide_pos: next_guide,
                kind: EditType::Insertion,
                guide_base: None,
                target_base: Some(to_char(seq[w])),
            },
            AlignOp::Deletion(g) => {
                next_guide = g + 1;
                let before_target = first_placed.map_or(true, |f| k < f);
                let after_target = last_placed.map_or(true, |l| k > l);
                let off = (before_target && window.clipped_start) || (after_target && window.clipped_end);
                Edit {
                    guide_pos: g,
                    kind: if off {
                        EditType::OffContig
                    } else {
                        EditType::Deletion
                    },
                    guide_base: Some(to_char(guide[g])),
                    target_base: None,
                }
            }
        };
        edits.push(edit);
    }

    let (ws, we) = (alignment.window_start, alignment.window_end);
    let target_span = match hit.strand {
        Strand::Forward => Span::new(window.span.start + ws, window.span.start + we),
        Strand::Reverse => Span::new(window.span.end - we, window.span.end - ws),
    };
    let target_sequence = String::from_utf8_lossy(&seq[ws..we]).into_owned();

    // Flanks on the guide's strand, 5' (upstream) and 3' (downstream) of the target
    let w = params.flank_width;
    let left = contig.slice_str(Span::new(target_span.start.saturating_sub(w), target_span.start));
    let right = contig.slice_str(Span::with_len(target_span.end, w));
    let as_called = match hit.strand {
        Strand::Forward => FlankPair {
            upstream: left,
            downstream: right,
        },
        Strand::Reverse => FlankPair {
            upstream: String::from_utf8_lossy(&reverse_complement(right.as_bytes())).into_owned(),
            downstream: String::from_utf8_lossy(&reverse_complement(left.as_bytes())).into_owned(),
        },
    };

    if let Some(c) = consensus.consensus() {
        if c.sequence.len() >= w {
            let repeat_head = &c.sequence[..w];
            let repeat_tail = &c.sequence[c.sequence.len() - w..];
            let max = params.repeat_flank_max_mismatches;
            let head_copy = as_called.downstream.len() == w
                && count_mismatches(&as_called.downstream, repeat_head) <= max;
            let tail_copy = as_called.upstream.len() == w
                && count_mismatches(&as_called.upstream, repeat_tail) <= max;
            if head_copy || tail_copy {
                tracing::debug!(spacer = %hit.spacer, target = %target_span, "Target is flanked by repeat; skipping");
                return HitAnnotation::RepeatCopy;
            }
        }
    }

    let count = |kind: EditType| edits.iter().filter(|e| e.kind == kind).count();
    let (mismatches, insertions, deletions) = (
        count(EditType::Mismatch),
        count(EditType::Insertion),
        count(EditType::Deletion),
    );

    let flanks = match orientation {
        Strand::Forward => as_called,
        Strand::Reverse => as_called.flipped(),
    };

    HitAnnotation::Annotated(MutationRecord {
        target_span,
        target_sequence,
        edits,
        mismatches,
        insertions,
        deletions,
        repeat_drift: repeat_drift(array, spacer.index, consensus),
        flanks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::array::fixtures::array_from_parts;
    use crate::core::types::reverse_complement_str;
    use crate::core::{ArrayId, ConsensusRepeat, SpacerRef};

    const GUIDE: &str = "ACGGATTCAGTCCATGCATTGC";

    fn array() -> Array {
        array_from_parts(
            1,
            0,
            &["GTTTCAGTGGCCTTAA", "GTTTCAGTGGCCTTAA", "GTTTCAGTGGCCTTAT"],
            &[GUIDE, "TTGACCAGTAGGACATTTGCAA"],
        )
    }

    fn consensus() -> ConsensusStatus {
        ConsensusStatus::Available(ConsensusRepeat {
            sequence: "GTTTCAGTGGCCTTAA".to_string(),
            aligned: "GTTTCAGTGGCCTTAA".to_string(),
            conservation: vec![1.0; 16],
            rows: vec![
                Some("GTTTCAGTGGCCTTAA".to_string()),
                Some("GTTTCAGTGGCCTTAA".to_string()),
                Some("GTTTCAGTGGCCTTAT".to_string()),
            ],
            deviations: vec![Some(0), Some(0), Some(1)],
        })
    }

    /// Contig: 200 bp of filler with `target` placed at 100
    fn contig_with(target: &str) -> Contig {
        let filler = "CATG".repeat(60);
        let mut seq = filler[..100].to_string();
        seq.push_str(target);
        seq.push_str(&filler[..100]);
        Contig::new("contig2", seq.into_bytes())
    }

    fn hit(strand: Strand, span: Span, query_span: Span) -> TargetHit {
        TargetHit {
            contig: "contig2".to_string(),
            span,
            strand,
            spacer: SpacerRef {
                array: ArrayId(1),
                spacer: 1,
            },
            query_span,
            mismatches: 0,
            gap_opens: 0,
            evalue: 1e-8,
            bitscore: 40.0,
        }
    }

    fn annotate(hit: &TargetHit, contig: &Contig, orientation: Strand) -> MutationRecord {
        let array = array();
        let spacer = array.spacer(1).unwrap().clone();
        match annotate_hit(
            hit,
            &array,
            &spacer,
            &consensus(),
            contig,
            orientation,
            &AnnotationParams::default(),
        ) {
            HitAnnotation::Annotated(record) => record,
            HitAnnotation::RepeatCopy => panic!("unexpected repeat copy"),
        }
    }

    #[test]
    fn test_perfect_forward_target() {
        let contig = contig_with(GUIDE);
        let record = annotate(
            &hit(Strand::Forward, Span::with_len(100, 22), Span::new(0, 22)),
            &contig,
            Strand::Forward,
        );
        assert!(record.is_perfect());
        assert_eq!(record.notation(), "Perfect match");
        assert_eq!(record.target_span, Span::with_len(100, 22));
        assert_eq!(record.flanks.upstream, contig.slice_str(Span::new(91, 100)));
        assert_eq!(record.flanks.downstream, contig.slice_str(Span::new(122, 131)));
        assert_eq!(
            record.repeat_drift,
            RepeatDrift::Assessed {
                upstream: RepeatComparison::Identical,
                downstream: RepeatComparison::Identical
            }
        );
    }

    #[test]
    fn test_partial_hit_is_extended_to_full_register() {
        let mut target = GUIDE.to_string();
        target.replace_range(20..21, "A");
        let contig = contig_with(&target);
        // local hit only covered guide positions 0..18
        let record = annotate(
            &hit(Strand::Forward, Span::with_len(100, 18), Span::new(0, 18)),
            &contig,
            Strand::Forward,
        );
        assert_eq!(record.target_span, Span::with_len(100, 22));
        assert_eq!(record.mismatches, 1);
        let diff: Vec<&Edit> = record.differences().collect();
        assert_eq!(diff[0].guide_pos, 20);
        assert_eq!(diff[0].target_base, Some('A'));
    }

    #[test]
    fn test_reverse_hit_and_deletion() {
        // target lacks guide base 10
        let mut target = GUIDE.to_string();
        target.remove(10);
        let contig = contig_with(&reverse_complement_str(&target));
        let record = annotate(
            &hit(Strand::Reverse, Span::with_len(100, 21), Span::new(0, 22)),
            &contig,
            Strand::Forward,
        );
        assert_eq!(record.deletions, 1);
        assert_eq!(record.mismatches, 0);
        assert_eq!(record.target_sequence, target);
        assert_eq!(record.target_span, Span::with_len(100, 21));
    }

    #[test]
    fn test_flanks_follow_orientation() {
        let contig = contig_with(GUIDE);
        let h = hit(Strand::Forward, Span::with_len(100, 22), Span::new(0, 22));
        let forward = annotate(&h, &contig, Strand::Forward);
        let reverse = annotate(&h, &contig, Strand::Reverse);
        assert_eq!(reverse.flanks, forward.flanks.flipped());
        assert_eq!(reverse.edits, forward.edits);
    }

    #[test]
    fn test_target_at_contig_edge_is_off_contig() {
        let mut seq = GUIDE[4..].to_string();
        seq.push_str(&"CATG".repeat(20));
        let contig = Contig::new("contig2", seq.into_bytes());
        let record = annotate(
            &hit(Strand::Forward, Span::new(0, 18), Span::new(4, 22)),
            &contig,
            Strand::Forward,
        );
        let off: Vec<usize> = record
            .edits
            .iter()
            .filter(|e| e.kind == EditType::OffContig)
            .map(|e| e.guide_pos)
            .collect();
        assert_eq!(off, vec![0, 1, 2, 3]);
        assert_eq!(record.deletions, 0);
        assert!(record.notation().starts_with("xxxx...."));
    }

    #[test]
    fn test_repeat_flanked_target_is_discarded() {
        // target followed by the start of the consensus repeat
        let mut target = GUIDE.to_string();
        target.push_str("GTTTCAGTGG");
        let contig = contig_with(&target);
        let array = array();
        let spacer = array.spacer(1).unwrap().clone();
        let annotation = annotate_hit(
            &hit(Strand::Forward, Span::with_len(100, 22), Span::new(0, 22)),
            &array,
            &spacer,
            &consensus(),
            &contig,
            Strand::Forward,
            &AnnotationParams::default(),
        );
        assert_eq!(annotation, HitAnnotation::RepeatCopy);
    }

    #[test]
    fn test_drift_skipped_without_consensus() {
        let array = array();
        let drift = repeat_drift(
            &array,
            2,
            &ConsensusStatus::Unavailable {
                reason: "aligner failed".into(),
            },
        );
        assert_eq!(drift.summary(), "Skipped");

        let drift = repeat_drift(&array, 2, &consensus());
        assert_eq!(drift.summary(), "Downstream repeat mutated: ...............t");
    }
}
