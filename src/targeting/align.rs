//! Semi-global alignment of a guide against a target window.
//!
//! The guide is aligned end to end; leading and trailing target bases are
//! free, so the window can be wider than the expected target. Costs are unit
//! edit costs. The dynamic programming is done by `bio`'s pairwise aligner.

use bio::alignment::pairwise::{Aligner, Scoring};
use bio::alignment::AlignmentOperation;

/// One column of a guide/target alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignOp {
    /// Guide position, window position; bases may or may not be equal
    Pair(usize, usize),
    /// Window base with no guide counterpart
    Insertion(usize),
    /// Guide base with no window counterpart
    Deletion(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    pub ops: Vec<AlignOp>,
    /// Window range covered by the alignment, half-open
    pub window_start: usize,
    pub window_end: usize,
    pub cost: usize,
}

/// Unit costs expressed as scores: 0 for a match, -1 for anything else
fn unit_score(a: u8, b: u8) -> i32 {
    if bases_match(a, b) {
        0
    } else {
        -1
    }
}

/// Align `guide` end to end within `window`.
///
/// Among equally good end points the one closest to `preferred_end` wins.
#[must_use]
pub fn align_guide(guide: &[u8], window: &[u8], preferred_end: usize) -> Alignment {
    if guide.is_empty() || window.is_empty() {
        return Alignment {
            ops: (0..guide.len()).map(AlignOp::Deletion).collect(),
            window_start: 0,
            window_end: 0,
            cost: guide.len(),
        };
    }

    let mut free = Aligner::with_capacity(guide.len(), window.len(), 0, -1, unit_score);
    let best = free.semiglobal(guide, window);

    // Same scoring, but the window must be consumed up to its last base, so
    // aligning against a prefix pins the end point.
    let pinned_scoring = Scoring::new(0, -1, unit_score).yclip_prefix(0);
    let mut pinned = Aligner::with_capacity_and_scoring(guide.len(), window.len(), pinned_scoring);

    let rank = |end: usize| (end.abs_diff(preferred_end), end);
    let mut ends: Vec<usize> = (1..=window.len()).collect();
    ends.sort_by_key(|&end| rank(end));
    let chosen = ends
        .into_iter()
        .take_while(|&end| rank(end) < rank(best.yend))
        .map(|end| pinned.custom(guide, &window[..end]))
        .find(|aln| aln.score == best.score)
        .unwrap_or(best);

    from_operations(&chosen.operations, chosen.ystart, chosen.yend, chosen.score)
}

/// Convert `bio` operations (guide as x, window as y) to guide/window columns
fn from_operations(operations: &[AlignmentOperation], ystart: usize, yend: usize, score: i32) -> Alignment {
    let mut ops = Vec::with_capacity(operations.len());
    let (mut g, mut w) = (0, ystart);
    for op in operations {
        match op {
            AlignmentOperation::Match | AlignmentOperation::Subst => {
                ops.push(AlignOp::Pair(g, w));
                g += 1;
                w += 1;
            }
            AlignmentOperation::Del => {
                ops.push(AlignOp::Insertion(w));
                w += 1;
            }
            AlignmentOperation::Ins => {
                ops.push(AlignOp::Deletion(g));
                g += 1;
            }
            AlignmentOperation::Xclip(_) | AlignmentOperation::Yclip(_) => {}
        }
    }
    Alignment {
        ops,
        window_start: ystart,
        window_end: yend,
        cost: score.unsigned_abs() as usize,
    }
}

/// Case-insensitive base comparison; `N` matches nothing
#[must_use]
pub fn bases_match(a: u8, b: u8) -> bool {
    let (a, b) = (a.to_ascii_uppercase(), b.to_ascii_uppercase());
    a == b && a != b'N'
}
