use crate::array::Rejection;
use crate::config::ValidityParams;
use crate::core::Array;

/// Largest deviation of a spacer length from the mean, in percent of the mean
#[must_use]
pub fn spacer_length_spread(lengths: &[usize]) -> f64 {
    if lengths.is_empty() {
        return 0.0;
    }
    let mean = lengths.iter().sum::<usize>() as f64 / lengths.len() as f64;
    if mean == 0.0 {
        return 0.0;
    }
    let max_dev = lengths
        .iter()
        .map(|&l| (l as f64 - mean).abs())
        .fold(0.0, f64::max);
    max_dev / mean * 100.0
}

/// Heuristic false-positive filter on spacer lengths and symbols.
///
/// Naturally variable arrays (common in Class 1 systems) can be rejected too;
/// `percent_reject` trades those against false positives. Lowering it never
/// accepts an array that a higher value rejected.
///
/// # Errors
///
/// Returns the [`Rejection`] describing why the array is not kept.
pub fn check_validity(array: &Array, params: &ValidityParams) -> Result<(), Rejection> {
    let spread = spacer_length_spread(&array.spacer_lengths());
    if spread > params.percent_reject {
        return Err(Rejection::SpacerLengthSpread { percent: spread });
    }

    let alphabet = params.alphabet.to_ascii_uppercase();
    let bad = array
        .spacers
        .iter()
        .flat_map(|s| s.sequence.chars())
        .find(|c| !alphabet.contains(c.to_ascii_uppercase()));
    if let Some(symbol) = bad {
        return Err(Rejection::InvalidAlphabet { symbol });
    }
    Ok(())
}
