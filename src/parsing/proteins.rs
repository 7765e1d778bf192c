//! Reader for Prodigal-style protein FASTA files.
//!
//! Definition lines carry the gene coordinates:
//!
//! ```text
//! >contig1_12 # 1001 # 2500 # -1 # ID=1_12;partial=00;start_type=ATG
//! ```
//!
//! The contig name is the protein identifier without its trailing `_<n>`.

use std::path::Path;

use crate::core::Strand;
use crate::external::Gene;
use crate::parsing::fasta::parse_fasta_text;
use crate::parsing::{parse_one_based, ParseError};

/// A predicted protein with its gene coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictedProtein {
    pub gene: Gene,
    pub sequence: Vec<u8>,
}

/// Read a protein FASTA file
///
/// # Errors
///
/// Returns `ParseError` if the file cannot be read or a definition line lacks coordinates.
pub fn read_proteins(path: &Path) -> Result<Vec<PredictedProtein>, ParseError> {
    let text = std::fs::read_to_string(path)?;
    parse_proteins(&text)
}

/// Parse protein FASTA text
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a definition line lacks coordinates.
pub fn parse_proteins(text: &str) -> Result<Vec<PredictedProtein>, ParseError> {
    let mut proteins = Vec::new();

    for (i, record) in parse_fasta_text(text)?.into_iter().enumerate() {
        let record_num = i + 1;
        let description = record.description.as_deref().unwrap_or_default();
        let fields: Vec<&str> = description
            .split('#')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .collect();
        if fields.len() < 3 {
            return Err(ParseError::InvalidFormat(format!(
                "Protein '{}' has no coordinates in its definition line",
                record.name
            )));
        }
        let span = parse_one_based(fields[0], fields[1], record_num)?;
        let strand = Strand::parse(fields[2]).ok_or_else(|| {
            ParseError::InvalidFormat(format!(
                "Invalid strand '{}' for protein '{}'",
                fields[2], record.name
            ))
        })?;
        let contig = record
            .name
            .rsplit_once('_')
            .map_or(record.name.as_str(), |(c, _)| c)
            .to_string();

        proteins.push(PredictedProtein {
            gene: Gene {
                id: record.name.clone(),
                contig,
                span,
                strand,
            },
            sequence: record.sequence,
        });
    }

    Ok(proteins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Span;

    #[test]
    fn test_parse_proteins() {
        let text = ">NZ_CP0001.1_12 # 1001 # 2500 # -1 # ID=1_12;partial=00\nMKKL*\n\
                    >NZ_CP0001.1_13 # 2601 # 2900 # 1 # ID=1_13;partial=00\nMAT\n";
        let proteins = parse_proteins(text).unwrap();
        assert_eq!(proteins.len(), 2);
        assert_eq!(proteins[0].gene.contig, "NZ_CP0001.1");
        assert_eq!(proteins[0].gene.span, Span::new(1000, 2500));
        assert_eq!(proteins[0].gene.strand, Strand::Reverse);
        assert_eq!(proteins[1].gene.strand, Strand::Forward);
        assert_eq!(proteins[1].sequence, b"MAT");
    }

    #[test]
    fn test_missing_coordinates() {
        assert!(parse_proteins(">p1\nMKK\n").is_err());
    }
}
