use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::core::StsRecord;
use crate::output::OutputError;

/// Write records as JSON lines
///
/// # Errors
///
/// Returns `OutputError` if the file cannot be written.
pub fn write_records(path: &Path, records: &[StsRecord]) -> Result<(), OutputError> {
    let file = File::create(path).map_err(OutputError::io(path))?;
    let mut writer = BufWriter::new(file);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n").map_err(OutputError::io(path))?;
    }
    writer.flush().map_err(OutputError::io(path))?;
    Ok(())
}

/// Read records written by [`write_records`]; blank lines are skipped
///
/// # Errors
///
/// Returns `OutputError` if the file cannot be read or a line is not a record.
pub fn read_records(path: &Path) -> Result<Vec<StsRecord>, OutputError> {
    let file = File::open(path).map_err(OutputError::io(path))?;
    let mut records = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(OutputError::io(path))?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|source| OutputError::Record {
            path: path.to_path_buf(),
            line: i + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::tsv::tests::sample_record;
    use tempfile::TempDir;

    #[test]
    fn test_records_survive_a_write_and_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.jsonl");
        let records = vec![sample_record(Some(true)), sample_record(None)];
        write_records(&path, &records).unwrap();
        let back = read_records(&path).unwrap();
        assert_eq!(back, records);
    }

    #[test]
    fn test_bad_line_reports_position() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.jsonl");
        std::fs::write(&path, "\n{\"genome\": 3}\n").unwrap();
        let err = read_records(&path).unwrap_err();
        assert!(matches!(err, OutputError::Record { line: 2, .. }));
    }
}
