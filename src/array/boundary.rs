//! Repeat/spacer boundary correction.
//!
//! Repeat-finders often stop a repeat a few bases early, so every spacer
//! starts (or ends) with the same short fragment of the repeat. Conserved
//! columns at the spacer starts are moved into the preceding repeats
//! (leading shift) and conserved columns at the spacer ends into the
//! following repeats (trailing shift). The shift is applied uniformly to
//! every repeat/spacer pair or not at all.
//!
//! A single conserved column is common by chance, so a fragment must span at
//! least `min_fragment_len` columns. It must also continue the outermost
//! repeat on the contig: the bases read through past the last repeat (or
//! before the first) have to agree with the fragment.

use crate::config::BoundaryParams;
use crate::core::{Array, ArrayError, Contig, Repeat, Spacer, Span};

/// Bases moved from the spacers into the repeats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoundaryShift {
    /// Taken from the start of every spacer
    pub leading: usize,
    /// Taken from the end of every spacer
    pub trailing: usize,
}

impl BoundaryShift {
    #[must_use]
    pub fn is_none(&self) -> bool {
        self.leading == 0 && self.trailing == 0
    }
}

fn base_index(base: u8) -> Option<usize> {
    match base.to_ascii_uppercase() {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

/// Whether at least `threshold` spacers share one base in this column
fn column_conserved(column: impl Iterator<Item = u8>, threshold: usize) -> bool {
    let mut counts = [0usize; 4];
    for base in column {
        if let Some(i) = base_index(base) {
            counts[i] += 1;
        }
    }
    counts.iter().any(|&n| n >= threshold)
}

/// Number of spacers that must agree on a base for a column to be a repeat fragment
#[must_use]
pub fn agreement_threshold(spacers: usize, params: &BoundaryParams) -> usize {
    if spacers <= params.small_array_spacers {
        spacers
    } else {
        ((params.overrep_fraction * spacers as f64).ceil() as usize).clamp(1, spacers)
    }
}

/// Find repeat fragments recurring at the spacer starts and ends.
///
/// At most `probe` columns are examined at either end, and the combined
/// shift always leaves at least one base of the shortest spacer. Runs
/// shorter than `min_fragment_len` are ignored.
#[must_use]
pub fn detect_shift(spacers: &[&[u8]], probe: usize, params: &BoundaryParams) -> BoundaryShift {
    let Some(min_len) = spacers.iter().map(|s| s.len()).min() else {
        return BoundaryShift::default();
    };
    let limit = probe.min(min_len.saturating_sub(1));
    let threshold = agreement_threshold(spacers.len(), params);

    let significant = |run: usize| if run >= params.min_fragment_len.max(1) { run } else { 0 };

    let leading = (0..limit)
        .take_while(|&c| column_conserved(spacers.iter().map(|s| s[c]), threshold))
        .count();
    let leading = significant(leading);
    let trailing = (0..limit)
        .take_while(|&c| column_conserved(spacers.iter().map(|s| s[s.len() - 1 - c]), threshold))
        .count();
    let trailing = significant(trailing.min(min_len.saturating_sub(1 + leading)));

    BoundaryShift { leading, trailing }
}

/// Majority base of each column in `columns`, `N` where no base is seen
fn fragment(spacers: &[&[u8]], columns: impl Iterator<Item = usize>, from_end: bool) -> Vec<u8> {
    columns
        .map(|c| {
            let mut counts = [0usize; 4];
            for s in spacers {
                let base = if from_end { s[s.len() - 1 - c] } else { s[c] };
                if let Some(i) = base_index(base) {
                    counts[i] += 1;
                }
            }
            let mut best = (b'N', 0);
            for (base, &n) in b"ACGT".iter().zip(&counts) {
                if n > best.1 {
                    best = (*base, n);
                }
            }
            best.0
        })
        .collect()
}

/// Whether at least `min_identity` of `fragment` matches `contig_bases`
fn agrees(fragment: &[u8], contig_bases: &[u8], min_identity: f64) -> bool {
    let same = fragment
        .iter()
        .zip(contig_bases)
        .filter(|(a, b)| a.eq_ignore_ascii_case(b))
        .count();
    same as f64 >= min_identity * fragment.len() as f64
}

/// Whether the fragments of `shift` continue the outermost repeats on the contig.
///
/// A leading fragment should follow the last repeat and a trailing fragment
/// precede the first. Where the contig ends there is nothing to compare and
/// that side passes.
#[must_use]
pub fn read_through_agrees(
    array: &Array,
    contig: &Contig,
    shift: BoundaryShift,
    params: &BoundaryParams,
) -> bool {
    let spacers: Vec<&[u8]> = array.spacers.iter().map(|s| s.sequence.as_bytes()).collect();
    let (Some(first), Some(last)) = (array.repeats.first(), array.repeats.last()) else {
        return true;
    };

    if shift.leading > 0 && last.span.end + shift.leading <= contig.len() {
        let expected = fragment(&spacers, 0..shift.leading, false);
        let found = contig.slice(Span::with_len(last.span.end, shift.leading));
        if !agrees(&expected, found, params.overrep_fraction) {
            return false;
        }
    }
    if shift.trailing > 0 && first.span.start >= shift.trailing {
        let expected = fragment(&spacers, (0..shift.trailing).rev(), true);
        let found = contig.slice(Span::new(first.span.start - shift.trailing, first.span.start));
        if !agrees(&expected, found, params.overrep_fraction) {
            return false;
        }
    }
    true
}

/// Mean positional identity over all pairs of repeats
#[must_use]
pub fn mean_pairwise_identity(repeats: &[&str]) -> f64 {
    let mut total = 0.0;
    let mut pairs = 0usize;
    for (i, a) in repeats.iter().enumerate() {
        for b in &repeats[i + 1..] {
            let longest = a.len().max(b.len());
            if longest == 0 {
                continue;
            }
            let same = a
                .bytes()
                .zip(b.bytes())
                .filter(|(x, y)| x.eq_ignore_ascii_case(y))
                .count();
            total += same as f64 / longest as f64;
            pairs += 1;
        }
    }
    if pairs == 0 {
        1.0
    } else {
        total / pairs as f64
    }
}

/// Move the boundaries of every repeat/spacer pair by `shift`.
///
/// The last repeat has no spacer after it, so its leading extension is read
/// from the contig; likewise the first repeat's trailing extension. Either
/// is skipped where the contig ends.
///
/// # Errors
///
/// Returns `ArrayError` if the shifted elements break the array invariants.
pub fn apply_shift(array: &Array, contig: &Contig, shift: BoundaryShift) -> Result<Array, ArrayError> {
    let repeats = array
        .repeats
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let followed = i < array.spacers.len();
            let end = if followed || r.span.end + shift.leading <= contig.len() {
                r.span.end + shift.leading
            } else {
                r.span.end
            };
            let start = if i > 0 || r.span.start >= shift.trailing {
                r.span.start - shift.trailing
            } else {
                r.span.start
            };
            let span = Span::new(start, end);
            Repeat {
                span,
                sequence: contig.slice_str(span),
            }
        })
        .collect();

    let spacers = array
        .spacers
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let end = if i + 1 < array.repeats.len() {
                s.span.end - shift.trailing
            } else {
                s.span.end
            };
            let span = Span::new(s.span.start + shift.leading, end);
            Spacer {
                index: s.index,
                span,
                sequence: contig.slice_str(span),
            }
        })
        .collect();

    Array::new(array.id, array.contig.clone(), repeats, spacers)
}

/// Correct the repeat/spacer boundaries of an array.
///
/// A detected shift is kept only if its fragments continue the outermost
/// repeats on the contig and the corrected repeats are at least as similar to
/// each other as the original ones; otherwise the array is returned unchanged
/// with an empty shift.
///
/// # Errors
///
/// Returns `ArrayError` if a shifted array cannot be built.
pub fn correct_boundaries(
    array: &Array,
    contig: &Contig,
    params: &BoundaryParams,
    min_repeat_len: usize,
) -> Result<(Array, BoundaryShift), ArrayError> {
    let spacers: Vec<&[u8]> = array.spacers.iter().map(|s| s.sequence.as_bytes()).collect();
    let shift = detect_shift(&spacers, params.probe_length(min_repeat_len), params);
    if shift.is_none() {
        return Ok((array.clone(), shift));
    }
    if !read_through_agrees(array, contig, shift, params) {
        tracing::debug!(array = %array.id, ?shift, "Fragment does not continue the outer repeat; keeping original");
        return Ok((array.clone(), BoundaryShift::default()));
    }

    let corrected = apply_shift(array, contig, shift)?;
    let before: Vec<&str> = array.repeats.iter().map(|r| r.sequence.as_str()).collect();
    let after: Vec<&str> = corrected.repeats.iter().map(|r| r.sequence.as_str()).collect();
    if mean_pairwise_identity(&after) < mean_pairwise_identity(&before) {
        tracing::debug!(array = %array.id, ?shift, "Boundary shift lowers repeat similarity; keeping original");
        return Ok((array.clone(), BoundaryShift::default()));
    }

    tracing::debug!(array = %array.id, leading = shift.leading, trailing = shift.trailing, "Corrected array boundaries");
    Ok((corrected, shift))
}
