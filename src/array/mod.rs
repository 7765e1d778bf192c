//! Array refinement.
//!
//! Raw candidates from the repeat-finder go through a fixed sequence of
//! checks; the first failing check rejects the array:
//!
//! | Step | Rejection |
//! |------|-----------|
//! | overlap resolution (more spacers wins, ties to the earlier) | `Overlapping` |
//! | minimum spacer count | `TooFewSpacers` |
//! | overlap with a masked run | `Masked` |
//! | boundary correction, then share of short spacers | `ShortAfterCorrection` |
//! | spacer-length spread and alphabet | `SpacerLengthSpread`, `InvalidAlphabet` |
//!
//! Arrays passing every step get a consensus repeat. A missing consensus is
//! not a rejection; it only disables repeat-dependent annotation later.
//! Rejected arrays are not errors and keep their footprint, so hits inside
//! them are still recognised as the array itself.

pub mod boundary;
pub mod consensus;
pub mod validity;

pub use boundary::{correct_boundaries, BoundaryShift};
pub use consensus::{build_consensus, drift_notation};
pub use validity::check_validity;

use crate::config::SearchConfig;
use crate::core::{Array, ArrayError, ArrayId, ConsensusStatus, Repeat, Spacer, Span};
use crate::external::{MultipleAligner, RawArray};
use crate::masking::MaskedContig;

/// Why an array was dropped from further processing
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    TooFewSpacers { found: usize, required: usize },
    Masked,
    Overlapping { with: ArrayId },
    SpacerLengthSpread { percent: f64 },
    InvalidAlphabet { symbol: char },
    ShortAfterCorrection { short: usize, total: usize },
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFewSpacers { found, required } => {
                write!(f, "{found} spacers, at least {required} required")
            }
            Self::Masked => write!(f, "overlaps a masked region"),
            Self::Overlapping { with } => write!(f, "overlaps array {with}"),
            Self::SpacerLengthSpread { percent } => {
                write!(f, "spacer lengths deviate up to {percent:.1}% from the mean")
            }
            Self::InvalidAlphabet { symbol } => write!(f, "spacer contains '{symbol}'"),
            Self::ShortAfterCorrection { short, total } => {
                write!(f, "{short} of {total} spacers too short after boundary correction")
            }
        }
    }
}

/// An array that passed every check
#[derive(Debug, Clone, PartialEq)]
pub struct RefinedArray {
    pub array: Array,
    pub shift: BoundaryShift,
    pub consensus: ConsensusStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayOutcome {
    Valid(RefinedArray),
    Rejected { array: Array, reason: Rejection },
}

impl ArrayOutcome {
    #[must_use]
    pub fn array(&self) -> &Array {
        match self {
            Self::Valid(refined) => &refined.array,
            Self::Rejected { array, .. } => array,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

/// Turn a raw repeat-finder candidate into an [`Array`] with sequences read
/// from the unmasked contig
///
/// # Errors
///
/// Returns `ArrayError` if a span lies outside the contig or the elements
/// do not form a valid array.
pub fn assemble(raw: &RawArray, id: ArrayId, masked: &MaskedContig<'_>) -> Result<Array, ArrayError> {
    let contig = masked.contig;
    let unmask = |span: Span| {
        masked
            .masked
            .unmask_span(span)
            .filter(|s| s.end <= contig.len())
            .ok_or_else(|| ArrayError::OutOfBounds {
                contig: contig.name.clone(),
                span,
            })
    };

    let repeats = raw
        .repeats
        .iter()
        .map(|&span| {
            let span = unmask(span)?;
            Ok(Repeat {
                span,
                sequence: contig.slice_str(span),
            })
        })
        .collect::<Result<Vec<_>, ArrayError>>()?;
    let spacers = raw
        .spacers
        .iter()
        .enumerate()
        .map(|(i, &span)| {
            let span = unmask(span)?;
            Ok(Spacer {
                index: i + 1,
                span,
                sequence: contig.slice_str(span),
            })
        })
        .collect::<Result<Vec<_>, ArrayError>>()?;

    Array::new(id, contig.name.clone(), repeats, spacers)
}

/// Resolve overlapping candidates: the one with more spacers wins, ties go
/// to the earlier candidate. Both lists keep the input order.
#[must_use]
pub fn resolve_overlaps(arrays: Vec<Array>) -> (Vec<Array>, Vec<(Array, Rejection)>) {
    let mut order: Vec<usize> = (0..arrays.len()).collect();
    order.sort_by(|&a, &b| {
        arrays[b]
            .spacers
            .len()
            .cmp(&arrays[a].spacers.len())
            .then(a.cmp(&b))
    });

    let mut beaten_by: Vec<Option<ArrayId>> = vec![None; arrays.len()];
    let mut kept: Vec<usize> = Vec::new();
    for i in order {
        let span = arrays[i].span();
        let winner = kept
            .iter()
            .find(|&&k| arrays[k].contig == arrays[i].contig && arrays[k].span().overlaps(&span));
        match winner {
            Some(&k) => beaten_by[i] = Some(arrays[k].id),
            None => kept.push(i),
        }
    }

    let mut valid = Vec::new();
    let mut rejected = Vec::new();
    for (array, beaten) in arrays.into_iter().zip(beaten_by) {
        match beaten {
            Some(with) => rejected.push((array, Rejection::Overlapping { with })),
            None => valid.push(array),
        }
    }
    (valid, rejected)
}

/// Run the refinement checks on one array and build its consensus
///
/// # Errors
///
/// Returns `ArrayError` if boundary correction produces an invalid array.
pub fn refine(
    array: Array,
    masked: &MaskedContig<'_>,
    aligner: &dyn MultipleAligner,
    config: &SearchConfig,
) -> Result<ArrayOutcome, ArrayError> {
    let boundary = &config.boundary;
    let reject = |array: Array, reason: Rejection| -> Result<ArrayOutcome, ArrayError> {
        tracing::debug!(array = %array.id, contig = %array.contig, %reason, "Rejected array");
        Ok(ArrayOutcome::Rejected { array, reason })
    };

    if array.spacers.len() < boundary.min_spacers {
        let reason = Rejection::TooFewSpacers {
            found: array.spacers.len(),
            required: boundary.min_spacers,
        };
        return reject(array, reason);
    }
    if masked.masked.overlaps_mask(&array.span()) {
        return reject(array, Rejection::Masked);
    }

    let (array, shift) = correct_boundaries(
        &array,
        masked.contig,
        boundary,
        config.repeat_finder.min_repeat_len,
    )?;

    let total = array.spacers.len();
    let short = array
        .spacers
        .iter()
        .filter(|s| s.sequence.len() < boundary.min_corrected_spacer_len)
        .count();
    if short > 0 && short as f64 >= boundary.max_short_fraction * total as f64 {
        return reject(array, Rejection::ShortAfterCorrection { short, total });
    }

    if let Err(reason) = check_validity(&array, &config.validity) {
        return reject(array, reason);
    }

    let consensus = build_consensus(&array, aligner, &config.validity.alphabet);
    Ok(ArrayOutcome::Valid(RefinedArray {
        array,
        shift,
        consensus,
    }))
}
