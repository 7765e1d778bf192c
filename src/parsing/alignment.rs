//! Aligned FASTA as written by multiple aligners.

use crate::parsing::fasta::{parse_fasta_text, write_fasta};
use crate::parsing::ParseError;

/// Name given to the `index`-th input sequence
#[must_use]
pub fn row_name(index: usize) -> String {
    format!("seq{index}")
}

/// FASTA text for a set of sequences, named so rows can be matched back
#[must_use]
pub fn write_inputs(sequences: &[String]) -> Vec<u8> {
    let names: Vec<String> = (0..sequences.len()).map(row_name).collect();
    let records: Vec<(&str, &[u8])> = names
        .iter()
        .zip(sequences)
        .map(|(name, seq)| (name.as_str(), seq.as_bytes()))
        .collect();
    let mut text = Vec::new();
    // writing to memory cannot fail
    let _ = write_fasta(&mut text, &records);
    text
}

/// Parse aligned FASTA back into rows ordered like the inputs
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a row is missing or unknown, or
/// rows differ in length.
pub fn parse_aligned(text: &str, expected: usize) -> Result<Vec<String>, ParseError> {
    let mut rows: Vec<Option<String>> = vec![None; expected];

    for contig in parse_fasta_text(text)? {
        let index = contig
            .name
            .strip_prefix("seq")
            .and_then(|i| i.parse::<usize>().ok())
            .filter(|i| *i < expected)
            .ok_or_else(|| {
                ParseError::InvalidFormat(format!("Unexpected aligned row '{}'", contig.name))
            })?;
        rows[index] = Some(String::from_utf8_lossy(&contig.sequence).into_owned());
    }

    let rows = rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            row.ok_or_else(|| ParseError::InvalidFormat(format!("Missing aligned row {i}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(first) = rows.first() {
        if rows.iter().any(|r| r.len() != first.len()) {
            return Err(ParseError::InvalidFormat(
                "Aligned rows differ in length".to_string(),
            ));
        }
    }
    Ok(rows)
}
