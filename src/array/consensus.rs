use bio::alignment::distance;

use crate::core::{Array, ConsensusRepeat, ConsensusStatus};
use crate::external::MultipleAligner;

/// Repeats this short or shorter are left out of the alignment
pub const MIN_ALIGNABLE_REPEAT: usize = 10;

/// Build the consensus repeat of an array from a multiple alignment of its repeats.
///
/// Repeats of at most [`MIN_ALIGNABLE_REPEAT`] bases, or using symbols
/// outside `alphabet`, are not aligned. The consensus is the per-column
/// majority (gaps included); ties go to the symbol seen first. Any failure
/// of the aligner leaves the consensus unavailable rather than failing the
/// array.
#[must_use]
pub fn build_consensus(array: &Array, aligner: &dyn MultipleAligner, alphabet: &str) -> ConsensusStatus {
    let included: Vec<usize> = array
        .repeats
        .iter()
        .enumerate()
        .filter(|(_, r)| {
            r.sequence.len() > MIN_ALIGNABLE_REPEAT
                && r.sequence.chars().all(|c| alphabet.contains(c.to_ascii_uppercase()))
        })
        .map(|(i, _)| i)
        .collect();

    if included.len() < 2 {
        return ConsensusStatus::Unavailable {
            reason: format!("{} alignable repeats", included.len()),
        };
    }

    let sequences: Vec<String> = included
        .iter()
        .map(|&i| array.repeats[i].sequence.clone())
        .collect();
    let rows = match aligner.align(&sequences) {
        Ok(rows) => rows,
        Err(e) => {
            tracing::debug!(array = %array.id, error = %e, "Repeat alignment failed");
            return ConsensusStatus::Unavailable {
                reason: e.to_string(),
            };
        }
    };
    if rows.len() != sequences.len() {
        return ConsensusStatus::Unavailable {
            reason: format!("aligner returned {} rows for {} repeats", rows.len(), sequences.len()),
        };
    }
    let width = rows[0].len();
    if rows.iter().any(|r| r.len() != width) {
        return ConsensusStatus::Unavailable {
            reason: "aligned rows differ in length".to_string(),
        };
    }

    let rows: Vec<Vec<u8>> = rows.into_iter().map(|r| r.to_ascii_uppercase().into_bytes()).collect();
    let mut aligned = String::with_capacity(width);
    let mut conservation = Vec::new();
    for col in 0..width {
        let winner = majority(rows.iter().map(|r| r[col]));
        if winner != b'-' {
            let agree = rows.iter().filter(|r| r[col] == winner).count();
            conservation.push(agree as f64 / rows.len() as f64);
        }
        aligned.push(char::from(winner));
    }
    let sequence: String = aligned.chars().filter(|&c| c != '-').collect();
    if sequence.is_empty() {
        return ConsensusStatus::Unavailable {
            reason: "empty consensus".to_string(),
        };
    }

    let mut all_rows = vec![None; array.repeats.len()];
    let mut deviations = vec![None; array.repeats.len()];
    for (&i, row) in included.iter().zip(rows) {
        deviations[i] = Some(levenshtein(array.repeats[i].sequence.as_bytes(), sequence.as_bytes()));
        all_rows[i] = Some(String::from_utf8_lossy(&row).into_owned());
    }

    ConsensusStatus::Available(ConsensusRepeat {
        sequence,
        aligned,
        conservation,
        rows: all_rows,
        deviations,
    })
}

/// Most frequent symbol; ties go to the earliest seen
fn majority(column: impl Iterator<Item = u8>) -> u8 {
    let mut counts: Vec<(u8, usize)> = Vec::new();
    for symbol in column {
        match counts.iter_mut().find(|(s, _)| *s == symbol) {
            Some((_, n)) => *n += 1,
            None => counts.push((symbol, 1)),
        }
    }
    let mut best = (b'-', 0);
    for &(symbol, n) in &counts {
        if n > best.1 {
            best = (symbol, n);
        }
    }
    best.0
}

/// Unit-cost edit distance, case-insensitive
#[must_use]
pub fn levenshtein(a: &[u8], b: &[u8]) -> usize {
    let (a, b) = (a.to_ascii_uppercase(), b.to_ascii_uppercase());
    distance::levenshtein(&a, &b) as usize
}

/// Describe an aligned repeat against the aligned consensus.
///
/// `.` identical, lowercase substituted base, uppercase base inserted
/// relative to the consensus, `-` consensus base missing from the repeat.
#[must_use]
pub fn drift_notation(consensus_aligned: &str, row: &str) -> String {
    consensus_aligned
        .bytes()
        .zip(row.bytes())
        .filter_map(|(c, r)| {
            let (c, r) = (c.to_ascii_uppercase(), r.to_ascii_uppercase());
            match (c, r) {
                (b'-', b'-') => None,
                _ if c == r => Some('.'),
                (b'-', _) => Some(char::from(r)),
                (_, b'-') => Some('-'),
                _ => Some(char::from(r.to_ascii_lowercase())),
            }
        })
        .collect()
}
