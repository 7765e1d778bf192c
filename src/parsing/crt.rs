//! Parser for CRT repeat-finder reports.
//!
//! A report lists each candidate array as a block:
//!
//! ```text
//! CRISPR 1   Range: 1001 - 1250
//! POSITION	REPEAT				SPACER
//! --------	-----------------------------	--------------------------
//! 1001		GTTTTAGAGCTATGCTGTTTTGAATGGT	ACGTTAGCATCGATCGATGCAAGCTTAGC	[ 28, 29 ]
//! 1058		GTTTTAGAGCTATGCTGTTTTGAATGGT
//! --------	-----------------------------	--------------------------
//! Repeats: 2	Average Length: 28		Average Length: 29
//! ```
//!
//! Positions are 1-based and refer to the first base of the repeat; the
//! spacer starts right after it.

use crate::core::Span;
use crate::external::RawArray;
use crate::parsing::ParseError;

const NO_ARRAYS: &str = "No CRISPR elements were found.";

/// Parse a CRT report for one contig
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if an array block is truncated or a
/// row cannot be read.
pub fn parse_crt_report(text: &str, contig: &str) -> Result<Vec<RawArray>, ParseError> {
    if text.contains(NO_ARRAYS) {
        return Ok(Vec::new());
    }

    let lines: Vec<&str> = text.lines().collect();
    let mut arrays = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if !lines[i].starts_with("CRISPR") {
            i += 1;
            continue;
        }
        let header_line = i + 1;

        // Skip to the dashed line that opens the rows
        i += 1;
        while i < lines.len() && !lines[i].trim_start().starts_with("--") {
            i += 1;
        }
        i += 1;

        let mut repeats = Vec::new();
        let mut spacers = Vec::new();
        let mut closed = false;
        while i < lines.len() {
            let line = lines[i].trim();
            i += 1;
            if line.starts_with("--") {
                closed = true;
                break;
            }
            if line.is_empty() {
                continue;
            }
            let (repeat, spacer) = parse_row(line, i)?;
            repeats.push(repeat);
            spacers.extend(spacer);
        }

        if !closed || repeats.is_empty() {
            return Err(ParseError::InvalidFormat(format!(
                "Truncated CRISPR block starting on line {header_line}"
            )));
        }

        arrays.push(RawArray {
            contig: contig.to_string(),
            repeats,
            spacers,
        });
    }

    Ok(arrays)
}

/// One row: position, repeat and (except on the last row) spacer
fn parse_row(line: &str, line_num: usize) -> Result<(Span, Option<Span>), ParseError> {
    let mut fields = line.split_whitespace();
    let position: usize = fields
        .next()
        .and_then(|p| p.parse().ok())
        .filter(|p| *p > 0)
        .ok_or_else(|| ParseError::InvalidFormat(format!("Invalid position on line {line_num}")))?;
    let repeat = fields
        .next()
        .ok_or_else(|| ParseError::InvalidFormat(format!("Missing repeat on line {line_num}")))?;

    let repeat_span = Span::with_len(position - 1, repeat.len());
    let spacer_span = fields
        .next()
        .filter(|s| !s.starts_with('['))
        .map(|s| Span::with_len(repeat_span.end, s.len()));

    Ok((repeat_span, spacer_span))
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "ORGANISM:  contig1 test genome
Bases: 5000


CRISPR 1   Range: 101 - 184
POSITION\tREPEAT\t\t\t\tSPACER
--------\t----------------------\t----------------------
101\t\tGTTTCAGTGGCC\tACGTACGTACGTAAAT\t[ 12, 16 ]
129\t\tGTTTCAGTGGCC\tTTGCATGCAAGTCCAG\t[ 12, 16 ]
157\t\tGTTTCAGTGGCC\t
--------\t----------------------\t----------------------
Repeats: 3\tAverage Length: 12\t\tAverage Length: 16

CRISPR 2   Range: 1001 - 1040
POSITION\tREPEAT\t\t\t\tSPACER
--------\t----------------------\t----------------------
1001\t\tAAAACCCC\tGGGGTTTTGGGG\t[ 8, 12 ]
1021\t\tAAAACCCC\t
--------\t----------------------\t----------------------
";

    #[test]
    fn test_parse_report() {
        let arrays = parse_crt_report(REPORT, "contig1").unwrap();
        assert_eq!(arrays.len(), 2);

        let first = &arrays[0];
        assert_eq!(first.contig, "contig1");
        assert_eq!(
            first.repeats,
            vec![Span::new(100, 112), Span::new(128, 140), Span::new(156, 168)]
        );
        assert_eq!(first.spacers, vec![Span::new(112, 128), Span::new(140, 156)]);

        assert_eq!(arrays[1].repeats.len(), 2);
        assert_eq!(arrays[1].spacers, vec![Span::new(1008, 1020)]);
    }

    #[test]
    fn test_no_arrays() {
        let text = "ORGANISM:  contig1\n\nNo CRISPR elements were found.\n";
        assert!(parse_crt_report(text, "contig1").unwrap().is_empty());
    }

    #[test]
    fn test_truncated_block() {
        let text = "CRISPR 1   Range: 1 - 20\nPOSITION\tREPEAT\n--------\n1\t\tAAAA\tCCCC\t[ 4, 4 ]\n";
        assert!(matches!(
            parse_crt_report(text, "c"),
            Err(ParseError::InvalidFormat(_))
        ));
    }
}
