use serde::{Deserialize, Serialize};

/// A 0-based, half-open interval on a contig
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Create a span, swapping the bounds if they were given in reverse
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Span of `len` bases starting at `start`
    #[must_use]
    pub fn with_len(start: usize, len: usize) -> Self {
        Self {
            start,
            end: start + len,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[must_use]
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Extend the span by `pad` on both sides, saturating at zero
    #[must_use]
    pub fn padded(&self, pad: usize) -> Self {
        Self {
            start: self.start.saturating_sub(pad),
            end: self.end.saturating_add(pad),
        }
    }

    /// Clamp the span to `[0, limit)`
    #[must_use]
    pub fn clamped(&self, limit: usize) -> Self {
        Self {
            start: self.start.min(limit),
            end: self.end.min(limit),
        }
    }

    /// Shortest distance between two spans (0 if they overlap or touch)
    #[must_use]
    pub fn distance(&self, other: &Span) -> usize {
        if self.overlaps(other) {
            0
        } else if self.end <= other.start {
            other.start - self.end
        } else {
            self.start - other.end
        }
    }
}

impl std::fmt::Display for Span {
    // Displayed 1-based inclusive, as reported to users
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start + 1, self.end)
    }
}

/// DNA strand of a feature or hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    /// Parse a strand symbol (`+`, `-`, `1`, `-1`)
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "+" | "1" | "+1" => Some(Self::Forward),
            "-" | "-1" => Some(Self::Reverse),
            _ => None,
        }
    }

    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Self::Forward => Self::Reverse,
            Self::Reverse => Self::Forward,
        }
    }

    #[must_use]
    pub fn symbol(self) -> char {
        match self {
            Self::Forward => '+',
            Self::Reverse => '-',
        }
    }
}

impl std::fmt::Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Reverse complement of a nucleotide sequence, preserving case.
/// IUPAC ambiguity codes are complemented; anything else maps to `N`.
#[must_use]
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement(b)).collect()
}

/// Reverse complement of a textual sequence
#[must_use]
pub fn reverse_complement_str(seq: &str) -> String {
    String::from_utf8_lossy(&reverse_complement(seq.as_bytes())).into_owned()
}

#[must_use]
pub fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' | b'U' => b'A',
        b'G' => b'C',
        b'C' => b'G',
        b'a' => b't',
        b't' | b'u' => b'a',
        b'g' => b'c',
        b'c' => b'g',
        b'R' => b'Y',
        b'Y' => b'R',
        b'K' => b'M',
        b'M' => b'K',
        b'B' => b'V',
        b'V' => b'B',
        b'D' => b'H',
        b'H' => b'D',
        b'S' | b'W' | b'N' | b'-' => base,
        b'n' => b'n',
        _ => b'N',
    }
}

/// True for the four unambiguous nucleotides, in either case
#[must_use]
pub fn is_unambiguous_base(base: u8) -> bool {
    matches!(base.to_ascii_uppercase(), b'A' | b'C' | b'G' | b'T')
}
