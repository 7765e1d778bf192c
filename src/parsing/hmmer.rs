//! Parser for HMMER `--tblout` tables.
//!
//! Both `hmmscan` (protein) and `nhmmscan` (nucleotide) tables are
//! whitespace-separated with `#` comment lines. Only the columns needed
//! downstream are kept.

use crate::core::Strand;
use crate::parsing::ParseError;

/// One row of an `hmmscan --tblout` table
#[derive(Debug, Clone, PartialEq)]
pub struct ProteinHit {
    /// Profile name (gene family)
    pub family: String,
    /// Query protein identifier
    pub protein: String,
    pub evalue: f64,
    pub score: f64,
}

/// One row of an `nhmmscan --tblout` table
#[derive(Debug, Clone, PartialEq)]
pub struct NucleotideHit {
    pub family: String,
    pub query: String,
    pub strand: Strand,
    pub evalue: f64,
    pub score: f64,
}

fn field<T: std::str::FromStr>(fields: &[&str], idx: usize, line_num: usize) -> Result<T, ParseError> {
    fields
        .get(idx)
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| {
            ParseError::InvalidFormat(format!("Missing or invalid column {} on line {line_num}", idx + 1))
        })
}

/// Parse an `hmmscan --tblout` table
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for rows with missing or invalid columns.
pub fn parse_protein_tblout(text: &str) -> Result<Vec<ProteinHit>, ParseError> {
    let mut hits = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        // target accession query accession evalue score ...
        hits.push(ProteinHit {
            family: field(&fields, 0, i + 1)?,
            protein: field(&fields, 2, i + 1)?,
            evalue: field(&fields, 4, i + 1)?,
            score: field(&fields, 5, i + 1)?,
        });
    }
    Ok(hits)
}

/// Parse an `nhmmscan --tblout` table
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for rows with missing or invalid columns.
pub fn parse_nucleotide_tblout(text: &str) -> Result<Vec<NucleotideHit>, ParseError> {
    let mut hits = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        // target accession query accession hmmfrom hmmto alifrom alito envfrom envto sqlen strand evalue score ...
        let strand_field: String = field(&fields, 11, i + 1)?;
        let strand = Strand::parse(&strand_field).ok_or_else(|| {
            ParseError::InvalidFormat(format!("Invalid strand '{strand_field}' on line {}", i + 1))
        })?;
        hits.push(NucleotideHit {
            family: field(&fields, 0, i + 1)?,
            query: field(&fields, 2, i + 1)?,
            strand,
            evalue: field(&fields, 12, i + 1)?,
            score: field(&fields, 13, i + 1)?,
        });
    }
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protein_tblout() {
        let text = "\
#                                                               --- full sequence ----
# target name        accession  query name           accession    E-value  score  bias
#------------------- ---------- -------------------- ---------- --------- ------ -----
Cas9                 -          contig1_12           -            1.2e-250  830.1  12.0   1.4e-250  829.9  12.0   1.0   1   0   0   1   1   1   1 -
Cas1                 -          contig1_13           -             3.1e-80  270.2   0.1   3.5e-80  270.0   0.1   1.0   1   0   0   1   1   1   1 -
";
        let hits = parse_protein_tblout(text).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].family, "Cas9");
        assert_eq!(hits[0].protein, "contig1_12");
        assert!((hits[1].score - 270.2).abs() < 1e-9);
    }

    #[test]
    fn test_nucleotide_tblout() {
        let text = "\
# target name  accession  query name  accession  hmmfrom hmm to alifrom  ali to envfrom  env to  sq len strand   E-value  score  bias  description of target
#------------- ---------- ---------- ---------- ------- ------- ------- ------- ------- ------- ------- ------ --------- ------ ----- ---------------------
Type_I-E_R     -          consensus  -                1      29      29       1      29       1      29    -     2.3e-09   38.1   0.0  -
Type_II-A      -          consensus  -                1      36       1      36       1      36      36    +     1.0e-03   12.0   0.0  -
";
        let hits = parse_nucleotide_tblout(text).unwrap();
        assert_eq!(hits[0].family, "Type_I-E_R");
        assert_eq!(hits[0].strand, Strand::Reverse);
        assert_eq!(hits[1].strand, Strand::Forward);
        assert!((hits[0].evalue - 2.3e-9).abs() < 1e-15);
    }

    #[test]
    fn test_invalid_row() {
        assert!(parse_protein_tblout("Cas9 - q -\n").is_err());
    }
}
