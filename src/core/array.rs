use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::Span;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ArrayError {
    #[error("Array has no repeats")]
    Empty,

    #[error("Array has {repeats} repeats but {spacers} spacers")]
    CountMismatch { repeats: usize, spacers: usize },

    #[error("Array elements overlap or are out of order near position {0}")]
    Unordered(usize),

    #[error("Element at {span} has sequence of length {len}")]
    LengthMismatch { span: Span, len: usize },

    #[error("Element at {span} lies outside contig {contig}")]
    OutOfBounds { contig: String, span: Span },
}

/// Ordinal of an array within its genome (1-based, in detection order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArrayId(pub usize);

impl std::fmt::Display for ArrayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Non-owning reference from a hit back to the spacer that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpacerRef {
    pub array: ArrayId,
    /// 1-based spacer number within the array
    pub spacer: usize,
}

impl SpacerRef {
    /// Parse a query name of the form `A<array>_S<spacer>`
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let (array, spacer) = name.split_once('_')?;
        let array = array.strip_prefix('A')?.parse().ok()?;
        let spacer = spacer.strip_prefix('S')?.parse().ok()?;
        Some(Self {
            array: ArrayId(array),
            spacer,
        })
    }
}

impl std::fmt::Display for SpacerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "A{}_S{}", self.array.0, self.spacer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repeat {
    pub span: Span,
    pub sequence: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spacer {
    /// 1-based position of the spacer within its array
    pub index: usize,
    pub span: Span,
    pub sequence: String,
}

/// A CRISPR array: alternating repeats and spacers on one contig.
///
/// Elements are ordered `R1 S1 R2 S2 ... Rn [Sn]`; spans are strictly
/// increasing and never overlap. Either there is one more repeat than
/// spacers, or the array ends on a spacer (terminally partial).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Array {
    pub id: ArrayId,
    pub contig: String,
    pub repeats: Vec<Repeat>,
    pub spacers: Vec<Spacer>,
}

impl Array {
    /// Build an array, checking ordering and count invariants
    ///
    /// # Errors
    ///
    /// Returns an `ArrayError` if the repeats/spacers do not interleave in
    /// strictly increasing, non-overlapping order.
    pub fn new(
        id: ArrayId,
        contig: impl Into<String>,
        repeats: Vec<Repeat>,
        spacers: Vec<Spacer>,
    ) -> Result<Self, ArrayError> {
        let array = Self {
            id,
            contig: contig.into(),
            repeats,
            spacers,
        };
        array.check_invariants()?;
        Ok(array)
    }

    /// Verify the ordering and count invariants
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn check_invariants(&self) -> Result<(), ArrayError> {
        if self.repeats.is_empty() {
            return Err(ArrayError::Empty);
        }
        let (r, s) = (self.repeats.len(), self.spacers.len());
        if r != s + 1 && r != s {
            return Err(ArrayError::CountMismatch {
                repeats: r,
                spacers: s,
            });
        }

        let mut last_end = 0usize;
        for (i, span) in self.element_spans().into_iter().enumerate() {
            if span.is_empty() || (i > 0 && span.start < last_end) {
                return Err(ArrayError::Unordered(span.start));
            }
            last_end = span.end;
        }

        for repeat in &self.repeats {
            if repeat.span.len() != repeat.sequence.len() {
                return Err(ArrayError::LengthMismatch {
                    span: repeat.span,
                    len: repeat.sequence.len(),
                });
            }
        }
        for spacer in &self.spacers {
            if spacer.span.len() != spacer.sequence.len() {
                return Err(ArrayError::LengthMismatch {
                    span: spacer.span,
                    len: spacer.sequence.len(),
                });
            }
        }
        Ok(())
    }

    /// Spans of all elements in genomic order (R1, S1, R2, ...)
    #[must_use]
    pub fn element_spans(&self) -> Vec<Span> {
        let mut spans = Vec::with_capacity(self.repeats.len() + self.spacers.len());
        for (i, repeat) in self.repeats.iter().enumerate() {
            spans.push(repeat.span);
            if let Some(spacer) = self.spacers.get(i) {
                spans.push(spacer.span);
            }
        }
        spans
    }

    /// Span from the first repeat to the last element
    #[must_use]
    pub fn span(&self) -> Span {
        let start = self.repeats.first().map_or(0, |r| r.span.start);
        let end = match (self.repeats.last(), self.spacers.last()) {
            (Some(r), Some(s)) => r.span.end.max(s.span.end),
            (Some(r), None) => r.span.end,
            _ => start,
        };
        Span::new(start, end)
    }

    /// Spacer by 1-based index
    #[must_use]
    pub fn spacer(&self, index: usize) -> Option<&Spacer> {
        index.checked_sub(1).and_then(|i| self.spacers.get(i))
    }

    /// Repeats immediately before and after a spacer (1-based index)
    #[must_use]
    pub fn flanking_repeats(&self, index: usize) -> (Option<&Repeat>, Option<&Repeat>) {
        match index.checked_sub(1) {
            Some(i) if i < self.spacers.len() => (self.repeats.get(i), self.repeats.get(i + 1)),
            _ => (None, None),
        }
    }

    #[must_use]
    pub fn spacer_lengths(&self) -> Vec<usize> {
        self.spacers.iter().map(|s| s.sequence.len()).collect()
    }

    /// Mark the spacers of this array as references for the search tool
    #[must_use]
    pub fn spacer_refs(&self) -> Vec<(SpacerRef, &Spacer)> {
        self.spacers
            .iter()
            .map(|s| {
                (
                    SpacerRef {
                        array: self.id,
                        spacer: s.index,
                    },
                    s,
                )
            })
            .collect()
    }
}

/// Consensus repeat of one array, derived from a multiple alignment of its repeats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusRepeat {
    /// Consensus sequence with gap columns removed
    pub sequence: String,

    /// Consensus row of the alignment, `-` where a gap won the column
    pub aligned: String,

    /// Fraction of aligned repeats agreeing with the consensus, per base of `sequence`
    pub conservation: Vec<f64>,

    /// Aligned row for each repeat of the array (`None` when left out of the alignment)
    pub rows: Vec<Option<String>>,

    /// Edit distance of each repeat to the consensus (`None` when left out)
    pub deviations: Vec<Option<usize>>,
}

/// Outcome of consensus building; unavailability is not an error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConsensusStatus {
    Available(ConsensusRepeat),
    Unavailable { reason: String },
}

impl ConsensusStatus {
    #[must_use]
    pub fn consensus(&self) -> Option<&ConsensusRepeat> {
        match self {
            Self::Available(c) => Some(c),
            Self::Unavailable { .. } => None,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Build an array on `contig` from sequences laid out back to back at `start`
    pub fn array_from_parts(id: usize, start: usize, repeats: &[&str], spacers: &[&str]) -> Array {
        let mut pos = start;
        let mut rs = Vec::new();
        let mut ss = Vec::new();
        for (i, r) in repeats.iter().enumerate() {
            rs.push(Repeat {
                span: Span::with_len(pos, r.len()),
                sequence: (*r).to_string(),
            });
            pos += r.len();
            if let Some(s) = spacers.get(i) {
                ss.push(Spacer {
                    index: i + 1,
                    span: Span::with_len(pos, s.len()),
                    sequence: (*s).to_string(),
                });
                pos += s.len();
            }
        }
        Array::new(ArrayId(id), "contig1", rs, ss).unwrap()
    }
}
