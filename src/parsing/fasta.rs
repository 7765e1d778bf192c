//! Genome reader for FASTA files using noodles.
//!
//! Supports both uncompressed and gzip/bgzip compressed files.
//!
//! Supported extensions:
//! - `.fa`, `.fasta`, `.fna`, `.fas` (uncompressed)
//! - the same with `.gz` or `.bgz` appended (compressed)

use std::ffi::OsStr;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use noodles::fasta;

use crate::core::contig::{Contig, Genome};
use crate::parsing::ParseError;

const FASTA_EXTENSIONS: [&str; 4] = ["fa", "fasta", "fna", "fas"];

/// Check if the path has a FASTA extension
#[must_use]
pub fn is_fasta_file(path: &Path) -> bool {
    let lower = path.to_string_lossy().to_lowercase();
    let stripped = lower
        .strip_suffix(".gz")
        .or_else(|| lower.strip_suffix(".bgz"))
        .unwrap_or(&lower);
    matches!(
        Path::new(stripped).extension().and_then(OsStr::to_str),
        Some(ext) if FASTA_EXTENSIONS.contains(&ext)
    )
}

/// Check if the path is a gzipped file
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

/// Genome name for a FASTA path: the file name without FASTA/compression extensions
#[must_use]
pub fn genome_name(path: &Path) -> String {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    for suffix in [".gz", ".bgz"] {
        if let Some(s) = name.strip_suffix(suffix) {
            name = s.to_string();
        }
    }
    if let Some((stem, ext)) = name.rsplit_once('.') {
        if FASTA_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
            name = stem.to_string();
        }
    }
    name
}

/// Expand the given paths into FASTA files; directories contribute their FASTA entries
///
/// # Errors
///
/// Returns `ParseError::Io` if a directory cannot be listed, or
/// `ParseError::InvalidFormat` if no FASTA file was found.
pub fn collect_genome_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, ParseError> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(input)?
                .filter_map(Result::ok)
                .map(|e| e.path())
                .filter(|p| p.is_file() && is_fasta_file(p))
                .collect();
            entries.sort();
            paths.extend(entries);
        } else {
            paths.push(input.clone());
        }
    }
    if paths.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No FASTA files found in the given inputs".to_string(),
        ));
    }
    Ok(paths)
}

/// Read a genome from a FASTA file.
///
/// Every record becomes a contig; sequences are uppercased.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, `ParseError::Noodles` if
/// parsing fails, or `ParseError::InvalidFormat` if no sequences are found.
pub fn read_genome(path: &Path) -> Result<Genome, ParseError> {
    let file = std::fs::File::open(path)?;
    let contigs = if is_gzipped(path) {
        let reader = BufReader::new(GzDecoder::new(file));
        read_contigs(&mut fasta::io::Reader::new(reader))?
    } else {
        let reader = BufReader::new(file);
        read_contigs(&mut fasta::io::Reader::new(reader))?
    };
    Ok(Genome::new(genome_name(path), contigs))
}

/// Read contigs from FASTA text
///
/// # Errors
///
/// Returns `ParseError::Noodles` if parsing fails or `ParseError::InvalidFormat`
/// if no sequences are found.
pub fn parse_fasta_text(text: &str) -> Result<Vec<Contig>, ParseError> {
    read_contigs(&mut fasta::io::Reader::new(text.as_bytes()))
}

/// Read from a noodles FASTA reader
fn read_contigs<R: BufRead>(reader: &mut fasta::io::Reader<R>) -> Result<Vec<Contig>, ParseError> {
    let mut contigs = Vec::new();

    for result in reader.records() {
        let record = result
            .map_err(|e| ParseError::Noodles(format!("Failed to parse FASTA record: {e}")))?;

        let name = String::from_utf8_lossy(record.name()).to_string();
        let mut contig = Contig::new(name, record.sequence().as_ref().to_vec());
        contig.description = record
            .description()
            .map(|d| String::from_utf8_lossy(d).trim().to_string())
            .filter(|d| !d.is_empty());
        contigs.push(contig);
    }

    if contigs.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No sequences found in FASTA file".to_string(),
        ));
    }

    Ok(contigs)
}

/// Write named sequences as FASTA, 80 bases per line
///
/// # Errors
///
/// Returns an IO error if writing fails.
pub fn write_fasta<W: Write>(inner: W, records: &[(&str, &[u8])]) -> std::io::Result<()> {
    let mut writer = fasta::io::Writer::new(inner);
    for &(name, sequence) in records {
        let definition = fasta::record::Definition::new(name.as_bytes().to_vec(), None);
        let record = fasta::Record::new(definition, fasta::record::Sequence::from(sequence.to_vec()));
        writer.write_record(&record)?;
    }
    writer.get_mut().flush()
}

/// Write named sequences to a new FASTA file at `path`
///
/// # Errors
///
/// Returns an IO error if the file cannot be created or written.
pub fn write_fasta_file(path: &Path, records: &[(&str, &[u8])]) -> std::io::Result<()> {
    let file = std::fs::File::create(path)?;
    write_fasta(BufWriter::new(file), records)
}
