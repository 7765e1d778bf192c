use serde::{Deserialize, Serialize};

use crate::core::types::Span;

/// A single contig/sequence of a genome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contig {
    /// Sequence name (first word of the FASTA definition line)
    pub name: String,

    /// Remainder of the FASTA definition line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Raw sequence, uppercased
    #[serde(skip)]
    pub sequence: Vec<u8>,
}

impl Contig {
    pub fn new(name: impl Into<String>, sequence: impl Into<Vec<u8>>) -> Self {
        let mut sequence = sequence.into();
        sequence.make_ascii_uppercase();
        Self {
            name: name.into(),
            description: None,
            sequence,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Subsequence for `span`, clamped to the contig bounds
    #[must_use]
    pub fn slice(&self, span: Span) -> &[u8] {
        let span = span.clamped(self.sequence.len());
        &self.sequence[span.start..span.end]
    }

    /// Subsequence for `span` as text
    #[must_use]
    pub fn slice_str(&self, span: Span) -> String {
        String::from_utf8_lossy(self.slice(span)).into_owned()
    }
}

/// A genome: the unit of work of the pipeline
#[derive(Debug, Clone)]
pub struct Genome {
    /// Genome name (file stem of the input FASTA)
    pub name: String,
    pub contigs: Vec<Contig>,
}

impl Genome {
    pub fn new(name: impl Into<String>, contigs: Vec<Contig>) -> Self {
        Self {
            name: name.into(),
            contigs,
        }
    }

    #[must_use]
    pub fn contig(&self, name: &str) -> Option<&Contig> {
        self.contigs.iter().find(|c| c.name == name)
    }

    /// Index of a contig by name, used to order hits by genomic position
    #[must_use]
    pub fn contig_index(&self, name: &str) -> Option<usize> {
        self.contigs.iter().position(|c| c.name == name)
    }

    /// Total number of bases across all contigs
    #[must_use]
    pub fn total_length(&self) -> usize {
        self.contigs.iter().map(Contig::len).sum()
    }
}
