use crate::core::{CasGeneHit, Orientation, OrientationCall, OrientationEvidence, Span, Strand, Subtype};
use crate::external::RepeatModelHit;
use crate::locus::definitions::{expected_placement, CasPlacement};

/// Expected Cas operon placement for a locus call, if every candidate subtype agrees
fn expected_for(subtype: &Subtype) -> Option<CasPlacement> {
    let labels: Vec<&str> = match subtype {
        Subtype::Resolved(s) => vec![s.as_str()],
        Subtype::Multiple(list) => list.iter().map(String::as_str).collect(),
        // II-C and II-A/II-B expect opposite layouts
        Subtype::AmbiguousTypeII | Subtype::Unresolved => return None,
    };
    let mut placements = labels.into_iter().map(expected_placement);
    let first = placements.next()??;
    placements.all(|p| p == Some(first)).then_some(first)
}

/// Strand implied by where the Cas genes sit relative to the array.
///
/// Genes entirely before the array count as upstream, genes entirely after
/// it as downstream; the majority is compared with the layout expected for
/// the subtype. No majority, no expectation or no genes give `None`.
#[must_use]
pub fn gene_strand(contig: &str, array: &Span, genes: &[CasGeneHit], subtype: &Subtype) -> Option<Strand> {
    let expected = expected_for(subtype)?;

    let balance: i64 = genes
        .iter()
        .filter(|g| g.contig == contig)
        .map(|g| {
            if g.span.end <= array.start {
                1
            } else if g.span.start >= array.end {
                -1
            } else {
                0
            }
        })
        .sum();

    let observed = match balance.signum() {
        1 => CasPlacement::Upstream,
        -1 => CasPlacement::Downstream,
        _ => return None,
    };
    Some(if observed == expected {
        Strand::Forward
    } else {
        Strand::Reverse
    })
}

/// Strand implied by the repeat model: a model matching the consensus as
/// called means the array is read in the repeat-finder's orientation
#[must_use]
pub fn repeat_strand(hit: Option<&RepeatModelHit>) -> Option<Strand> {
    hit.map(|h| h.strand)
}

/// Combine gene and repeat-model evidence into an orientation call.
///
/// Evidence from a single source is used as is. When both sources are
/// present they must agree; a disagreement, like the absence of any
/// evidence, yields [`Orientation::Unknown`] carrying both calls.
#[must_use]
pub fn resolve_orientation(gene: Option<Strand>, repeat: Option<Strand>) -> OrientationCall {
    let (orientation, evidence) = match (gene, repeat) {
        (Some(g), Some(r)) if g == r => (Orientation::from(g), OrientationEvidence::Concordant),
        (Some(g), None) => (Orientation::from(g), OrientationEvidence::GeneBased),
        (None, Some(r)) => (Orientation::from(r), OrientationEvidence::RepeatModel),
        (gene, repeat) => (Orientation::Unknown, OrientationEvidence::Conflict { gene, repeat }),
    };
    OrientationCall {
        orientation,
        evidence,
    }
}
