use std::collections::HashMap;

use crate::config::MatchParams;
use crate::core::{Array, ArrayId, Genome, Span, TargetHit};
use crate::external::SearchHit;

/// Region occupied by a detected array; hits inside it (plus the pad) are the array itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footprint {
    pub contig: String,
    pub span: Span,
}

impl From<&Array> for Footprint {
    fn from(array: &Array) -> Self {
        Self {
            contig: array.contig.clone(),
            span: array.span(),
        }
    }
}

/// Keep the similarity hits that are genuine self-targets.
///
/// A hit survives when it lies on a contig of `genome`, its spacer belongs
/// to one of the `valid` arrays, its e-value passes the cutoff, and it does
/// not overlap any footprint widened by `pad` on either side. Every other
/// hit is the spacer finding its own (or another) array and is dropped.
///
/// The result is ordered by array, then by genomic position.
#[must_use]
pub fn match_targets(
    hits: Vec<SearchHit>,
    valid: &[&Array],
    footprints: &[Footprint],
    genome: &Genome,
    params: &MatchParams,
) -> Vec<TargetHit> {
    let arrays: HashMap<ArrayId, &Array> = valid.iter().map(|a| (a.id, *a)).collect();
    let total = hits.len();

    let mut targets: Vec<(usize, TargetHit)> = hits
        .into_iter()
        .filter_map(|hit| {
            let contig_index = genome.contig_index(&hit.contig)?;
            let array = arrays.get(&hit.query.array)?;
            if array.spacer(hit.query.spacer).is_none() || hit.evalue > params.max_evalue {
                return None;
            }
            let inside = footprints
                .iter()
                .any(|f| f.contig == hit.contig && f.span.padded(params.pad).overlaps(&hit.span));
            if inside {
                return None;
            }
            Some((
                contig_index,
                TargetHit {
                    contig: hit.contig,
                    span: hit.span,
                    strand: hit.strand,
                    spacer: hit.query,
                    query_span: hit.query_span,
                    mismatches: hit.mismatches,
                    gap_opens: hit.gap_opens,
                    evalue: hit.evalue,
                    bitscore: hit.bitscore,
                },
            ))
        })
        .collect();

    targets.sort_by(|(ca, a), (cb, b)| {
        (a.spacer.array, *ca, a.span.start, a.spacer.spacer, a.span.end)
            .cmp(&(b.spacer.array, *cb, b.span.start, b.spacer.spacer, b.span.end))
    });
    targets.dedup_by(|(_, a), (_, b)| a.spacer == b.spacer && a.contig == b.contig && a.span == b.span);

    tracing::debug!(hits = total, targets = targets.len(), "Filtered similarity hits");

    targets.into_iter().map(|(_, t)| t).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::array::fixtures::array_from_parts;
    use crate::core::{Contig, SpacerRef, Strand};

    fn genome() -> Genome {
        Genome::new(
            "g",
            vec![
                Contig::new("contig1", vec![b'A'; 10_000]),
                Contig::new("contig2", vec![b'C'; 5_000]),
            ],
        )
    }

    fn hit(array: usize, spacer: usize, contig: &str, start: usize) -> SearchHit {
        SearchHit {
            query: SpacerRef {
                array: ArrayId(array),
                spacer,
            },
            contig: contig.to_string(),
            span: Span::with_len(start, 30),
            strand: Strand::Forward,
            query_span: Span::new(0, 30),
            mismatches: 0,
            gap_opens: 0,
            evalue: 1e-10,
            bitscore: 55.0,
        }
    }

    /// Array spanning 1000..1500 on contig1
    fn array() -> Array {
        let repeat = "G".repeat(30);
        let spacer = "T".repeat(38);
        let repeats: Vec<&str> = vec![repeat.as_str(); 8];
        let spacers: Vec<&str> = vec![spacer.as_str(); 7];
        array_from_parts(1, 1000, &repeats, &spacers)
    }

    #[test]
    fn test_padded_boundary_excludes_nearby_hits() {
        let array = array();
        assert_eq!(array.span(), Span::new(1000, 1506));
        let footprints = vec![Footprint::from(&array)];
        let params = MatchParams {
            pad: 100,
            max_evalue: 1e-6,
        };

        // 50 bases inside the padded boundary, then 150 bases past the array end
        let inside = hit(1, 2, "contig1", array.span().end + 50);
        let outside = hit(1, 2, "contig1", array.span().end + 150);
        let targets = match_targets(vec![inside, outside], &[&array], &footprints, &genome(), &params);

        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].span.start, array.span().end + 150);
        for t in &targets {
            assert!(!array.span().padded(params.pad).overlaps(&t.span));
        }
    }

    #[test]
    fn test_rejects_unknown_arrays_contigs_and_weak_hits() {
        let array = array();
        let footprints = vec![Footprint::from(&array)];
        let mut weak = hit(1, 1, "contig2", 100);
        weak.evalue = 0.5;
        let hits = vec![
            hit(2, 1, "contig1", 5000),
            hit(1, 1, "other", 5000),
            hit(1, 99, "contig1", 5000),
            weak,
            hit(1, 1, "contig2", 100),
        ];
        let targets = match_targets(hits, &[&array], &footprints, &genome(), &MatchParams::default());
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].contig, "contig2");
    }

    #[test]
    fn test_rejected_array_footprint_still_excludes() {
        let array = array();
        let rejected = Footprint {
            contig: "contig1".to_string(),
            span: Span::new(7000, 7400),
        };
        let footprints = vec![Footprint::from(&array), rejected];
        let hits = vec![hit(1, 3, "contig1", 7200), hit(1, 3, "contig1", 9000)];
        let targets = match_targets(hits, &[&array], &footprints, &genome(), &MatchParams::default());
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].span.start, 9000);
    }

    #[test]
    fn test_ordering_and_duplicates() {
        let array = array();
        let footprints = vec![Footprint::from(&array)];
        let hits = vec![
            hit(1, 4, "contig2", 300),
            hit(1, 2, "contig1", 8000),
            hit(1, 1, "contig1", 3000),
            hit(1, 1, "contig1", 3000),
        ];
        let targets = match_targets(hits, &[&array], &footprints, &genome(), &MatchParams::default());
        let starts: Vec<(String, usize)> = targets.iter().map(|t| (t.contig.clone(), t.span.start)).collect();
        assert_eq!(
            starts,
            vec![
                ("contig1".to_string(), 3000),
                ("contig1".to_string(), 8000),
                ("contig2".to_string(), 300)
            ]
        );
    }
}
