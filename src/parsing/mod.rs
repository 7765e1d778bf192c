//! Readers for genomes, tool output and annotation tables.
//!
//! This module provides parsers for:
//!
//! - **FASTA genomes**: plain or gzip-compressed, read with noodles
//! - **Repeat-finder reports**: CRT text output
//! - **Similarity search hits**: BLAST tabular output (`-outfmt 6`)
//! - **Profile search hits**: HMMER `--tblout` tables
//! - **Aligned FASTA**: multiple-alignment rows
//! - **Predicted proteins**: Prodigal-style protein FASTA headers
//! - **TSV tables**: Cas gene hits, prophage islands, repeat families
//!
//! ## Coordinates
//!
//! Tools and tables use 1-based inclusive coordinates; every parser returns
//! 0-based half-open [`Span`](crate::core::Span)s:
//!
//! | Source | Reported | Parsed |
//! |--------|----------|--------|
//! | CRT position `101`, repeat of 30 bp | `101` | `100..130` |
//! | BLAST `sstart 500 send 471` | minus strand | `470..500`, reverse |
//! | TSV `start 1001 end 2000` | `1001-2000` | `1000..2000` |

pub mod alignment;
pub mod blast;
pub mod crt;
pub mod fasta;
pub mod hmmer;
pub mod proteins;
pub mod tables;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("noodles error: {0}")]
    Noodles(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse a 1-based inclusive coordinate pair into a 0-based half-open span
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if either value is not a positive integer.
pub(crate) fn parse_one_based(
    start: &str,
    end: &str,
    line_num: usize,
) -> Result<crate::core::Span, ParseError> {
    let parse = |s: &str| -> Result<usize, ParseError> {
        s.trim()
            .parse::<usize>()
            .ok()
            .filter(|v| *v > 0)
            .ok_or_else(|| {
                ParseError::InvalidFormat(format!("Invalid coordinate on line {line_num}: '{s}'"))
            })
    };
    let (a, b) = (parse(start)?, parse(end)?);
    Ok(crate::core::Span::new(a.min(b) - 1, a.max(b)))
}
