use serde::{Deserialize, Serialize};

use crate::core::types::{is_unambiguous_base, Span};

/// One stretch of the coordinate table: `len` masked positions starting at
/// `masked_start` map one-to-one onto raw positions starting at `raw_start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Segment {
    masked_start: usize,
    raw_start: usize,
    len: usize,
}

/// Position-for-position map from masked coordinates back to raw coordinates
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
struct CoordinateMap {
    segments: Vec<Segment>,
}

impl CoordinateMap {
    fn push(&mut self, masked_start: usize, raw_start: usize, len: usize) {
        if len == 0 {
            return;
        }
        if let Some(last) = self.segments.last_mut() {
            let contiguous = last.masked_start + last.len == masked_start
                && last.raw_start + last.len == raw_start;
            if contiguous {
                last.len += len;
                return;
            }
        }
        self.segments.push(Segment {
            masked_start,
            raw_start,
            len,
        });
    }

    /// Raw position of a masked position, `None` if outside the sequence
    fn to_raw(&self, masked_pos: usize) -> Option<usize> {
        let idx = self
            .segments
            .partition_point(|s| s.masked_start + s.len <= masked_pos);
        let seg = self.segments.get(idx)?;
        (masked_pos >= seg.masked_start).then(|| seg.raw_start + (masked_pos - seg.masked_start))
    }
}

/// A contig sequence with long degenerate runs replaced by filler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedSequence {
    /// Sequence handed to the repeat-finder; same length as the raw sequence
    pub masked: Vec<u8>,
    /// Raw spans that were replaced by filler
    pub runs: Vec<Span>,
    map: CoordinateMap,
}

impl MaskedSequence {
    /// Map a span reported on the masked sequence back to raw coordinates
    #[must_use]
    pub fn unmask_span(&self, span: Span) -> Option<Span> {
        if span.is_empty() {
            return self.map.to_raw(span.start).map(|s| Span::new(s, s));
        }
        let start = self.map.to_raw(span.start)?;
        let last = self.map.to_raw(span.end - 1)?;
        Some(Span::new(start, last + 1))
    }

    /// Original bases for a span reported on the masked sequence
    #[must_use]
    pub fn unmask<'a>(&self, raw: &'a [u8], span: Span) -> Option<&'a [u8]> {
        let raw_span = self.unmask_span(span)?;
        raw.get(raw_span.start..raw_span.end)
    }

    /// True if `span` (raw coordinates) touches any masked run
    #[must_use]
    pub fn overlaps_mask(&self, span: &Span) -> bool {
        self.runs.iter().any(|r| r.overlaps(span))
    }

    #[must_use]
    pub fn masked_bases(&self) -> usize {
        self.runs.iter().map(Span::len).sum()
    }
}

/// Replace every run of ambiguous symbols of at least `min_run` bases.
///
/// The filler has the same length as the run, so masking never shifts
/// coordinates. It is a deterministic pseudo-random A/C/G/T stream seeded by
/// the run position, which keeps the repeat-finder from pairing up masked
/// regions as high-identity repeats.
#[must_use]
pub fn mask_degenerate_runs(raw: &[u8], min_run: usize) -> MaskedSequence {
    let mut masked = raw.to_vec();
    let mut runs = Vec::new();
    let mut map = CoordinateMap::default();

    let mut i = 0;
    while i < raw.len() {
        if is_unambiguous_base(raw[i]) {
            i += 1;
            continue;
        }
        let start = i;
        while i < raw.len() && !is_unambiguous_base(raw[i]) {
            i += 1;
        }
        if i - start >= min_run.max(1) {
            fill(&mut masked[start..i], start as u64);
            runs.push(Span::new(start, i));
        }
    }

    map.push(0, 0, raw.len());

    MaskedSequence { masked, runs, map }
}

fn fill(region: &mut [u8], seed: u64) {
    const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];
    // xorshift64*; the seed must be non-zero
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
    for base in region.iter_mut() {
        state ^= state >> 12;
        state ^= state << 25;
        state ^= state >> 27;
        let value = state.wrapping_mul(0x2545_F491_4F6C_DD1D);
        *base = BASES[(value >> 62) as usize];
    }
}
