//! Tab-separated annotation tables.
//!
//! | Table | Columns |
//! |-------|---------|
//! | Cas gene hits | contig, start, end, strand, family, score, [id] |
//! | Prophage islands | contig, start, end, [island id] |
//! | Repeat families | family, subtypes (comma separated) |
//!
//! Coordinates are 1-based inclusive. Blank lines and `#` comments are
//! skipped, and a first row naming its columns is treated as a header.
//! An island row with `-` coordinates records a contig that was analysed
//! and found to carry no islands.

use std::path::Path;

use crate::core::{CasGeneHit, Span, Strand};
use crate::parsing::{parse_one_based, ParseError};

const HEADER_NAMES: [&str; 4] = ["contig", "family", "chrom", "name"];

/// Data rows of a TSV text with their 1-based line numbers
fn rows(text: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    let mut first_data_line = true;
    text.lines().enumerate().filter_map(move |(i, line)| {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }
        let fields: Vec<&str> = trimmed.split('\t').map(str::trim).collect();
        if first_data_line {
            first_data_line = false;
            let first = fields.first().map(|s| s.to_lowercase()).unwrap_or_default();
            if HEADER_NAMES.contains(&first.as_str()) {
                return None;
            }
        }
        Some((i + 1, fields))
    })
}

fn require(fields: &[&str], n: usize, line_num: usize) -> Result<(), ParseError> {
    if fields.len() < n {
        return Err(ParseError::InvalidFormat(format!(
            "Line {line_num} has fewer than {n} fields"
        )));
    }
    Ok(())
}

/// Parse a Cas gene hit table
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for short rows or invalid values.
pub fn parse_cas_hits(text: &str) -> Result<Vec<CasGeneHit>, ParseError> {
    let mut hits = Vec::new();
    for (line_num, fields) in rows(text) {
        require(&fields, 6, line_num)?;
        let strand = Strand::parse(fields[3]).ok_or_else(|| {
            ParseError::InvalidFormat(format!("Invalid strand '{}' on line {line_num}", fields[3]))
        })?;
        let score = fields[5].parse().map_err(|_| {
            ParseError::InvalidFormat(format!("Invalid score '{}' on line {line_num}", fields[5]))
        })?;
        hits.push(CasGeneHit {
            family: fields[4].to_string(),
            contig: fields[0].to_string(),
            span: parse_one_based(fields[1], fields[2], line_num)?,
            strand,
            score,
            id: fields.get(6).filter(|s| !s.is_empty()).map(|s| (*s).to_string()),
        });
    }
    Ok(hits)
}

/// One row of a prophage island table; `span` is `None` for analysed contigs without islands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IslandRow {
    pub contig: String,
    pub span: Option<Span>,
    pub id: Option<String>,
}

/// Parse a prophage island table
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for short rows or invalid coordinates.
pub fn parse_islands(text: &str) -> Result<Vec<IslandRow>, ParseError> {
    let mut islands = Vec::new();
    for (line_num, fields) in rows(text) {
        require(&fields, 3, line_num)?;
        let span = if fields[1] == "-" && fields[2] == "-" {
            None
        } else {
            Some(parse_one_based(fields[1], fields[2], line_num)?)
        };
        islands.push(IslandRow {
            contig: fields[0].to_string(),
            span,
            id: fields.get(3).filter(|s| !s.is_empty()).map(|s| (*s).to_string()),
        });
    }
    Ok(islands)
}

/// Parse a repeat family table into `(family, subtypes)` pairs
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for rows without a subtype column.
pub fn parse_repeat_families(text: &str) -> Result<Vec<(String, Vec<String>)>, ParseError> {
    let mut families = Vec::new();
    for (line_num, fields) in rows(text) {
        require(&fields, 2, line_num)?;
        let subtypes = fields[1]
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        families.push((fields[0].to_string(), subtypes));
    }
    Ok(families)
}

/// Read a table file and parse it with `parse`
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or the parser's error.
pub fn read_table<T>(
    path: &Path,
    parse: impl Fn(&str) -> Result<T, ParseError>,
) -> Result<T, ParseError> {
    let text = std::fs::read_to_string(path)?;
    parse(&text)
}
