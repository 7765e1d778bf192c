//! Parser for BLAST tabular output (`-outfmt 6`).
//!
//! Columns: `qseqid sseqid pident length mismatch gapopen qstart qend sstart send evalue bitscore`.
//! Query names are spacer references (`A<array>_S<spacer>`); a subject
//! range with `sstart > send` is a minus-strand hit.

use crate::core::{SpacerRef, Strand};
use crate::external::SearchHit;
use crate::parsing::{parse_one_based, ParseError};

/// Parse tabular BLAST output
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for rows with too few columns,
/// unparseable numbers or query names that are not spacer references.
pub fn parse_tabular(text: &str) -> Result<Vec<SearchHit>, ParseError> {
    let mut hits = Vec::new();

    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line_num = i + 1;
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 12 {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has {} fields, expected 12",
                fields.len()
            )));
        }

        let query = SpacerRef::parse(fields[0]).ok_or_else(|| {
            ParseError::InvalidFormat(format!(
                "Unknown query '{}' on line {line_num}",
                fields[0]
            ))
        })?;

        let number = |idx: usize| -> Result<f64, ParseError> {
            fields[idx].trim().parse().map_err(|_| {
                ParseError::InvalidFormat(format!(
                    "Invalid value '{}' on line {line_num}",
                    fields[idx]
                ))
            })
        };
        let count = |idx: usize| -> Result<usize, ParseError> {
            fields[idx].trim().parse().map_err(|_| {
                ParseError::InvalidFormat(format!(
                    "Invalid count '{}' on line {line_num}",
                    fields[idx]
                ))
            })
        };

        let sstart = count(8)?;
        let send = count(9)?;
        let strand = if sstart > send {
            Strand::Reverse
        } else {
            Strand::Forward
        };

        hits.push(SearchHit {
            query,
            contig: fields[1].to_string(),
            span: parse_one_based(fields[8], fields[9], line_num)?,
            strand,
            query_span: parse_one_based(fields[6], fields[7], line_num)?,
            mismatches: count(4)?,
            gap_opens: count(5)?,
            evalue: number(10)?,
            bitscore: number(11)?,
        });
    }

    Ok(hits)
}
