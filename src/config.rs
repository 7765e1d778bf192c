//! Run configuration.
//!
//! A [`SearchConfig`] is built once per run (defaults, then an optional JSON
//! file, then command-line overrides) and handed by reference to every
//! pipeline stage. Nothing in the library reads configuration from global
//! state, so genomes can be processed in parallel with the same value.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Masking of long degenerate stretches before repeat finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskingParams {
    /// Runs of ambiguous symbols at least this long are masked
    pub min_degenerate_run: usize,
}

impl Default for MaskingParams {
    fn default() -> Self {
        Self {
            min_degenerate_run: 500,
        }
    }
}

/// Parameters forwarded to the repeat-finder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepeatFinderParams {
    /// Minimum number of repeats for a candidate array
    pub min_repeats: usize,
    pub min_repeat_len: usize,
    pub max_repeat_len: usize,
    pub min_spacer_len: usize,
    pub max_spacer_len: usize,
}

impl Default for RepeatFinderParams {
    fn default() -> Self {
        Self {
            min_repeats: 4,
            min_repeat_len: 18,
            max_repeat_len: 45,
            min_spacer_len: 18,
            max_spacer_len: 45,
        }
    }
}

/// Repeat/spacer boundary correction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryParams {
    /// Arrays with fewer spacers are rejected before correction
    pub min_spacers: usize,
    /// Longest repeat fragment looked for at spacer ends (`None`: half the minimum repeat length)
    pub probe_length: Option<usize>,
    /// Fraction of spacers that must share a base for a column to count as repeat
    pub overrep_fraction: f64,
    /// Shortest run of conserved columns taken for a repeat fragment
    pub min_fragment_len: usize,
    /// Arrays with at most this many spacers need unanimous columns
    pub small_array_spacers: usize,
    /// Corrected spacers shorter than this count as suspicious
    pub min_corrected_spacer_len: usize,
    /// Reject the array if at least this fraction of corrected spacers is suspicious
    pub max_short_fraction: f64,
}

impl Default for BoundaryParams {
    fn default() -> Self {
        Self {
            min_spacers: 3,
            probe_length: None,
            overrep_fraction: 0.75,
            min_fragment_len: 2,
            small_array_spacers: 4,
            min_corrected_spacer_len: 18,
            max_short_fraction: 0.25,
        }
    }
}

impl BoundaryParams {
    #[must_use]
    pub fn probe_length(&self, min_repeat_len: usize) -> usize {
        self.probe_length.unwrap_or(min_repeat_len / 2).max(1)
    }
}

/// Spacer-length consistency filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidityParams {
    /// Maximum deviation of any spacer length from the mean, in percent of the mean
    pub percent_reject: f64,
    /// Symbols allowed in spacers
    pub alphabet: String,
}

impl Default for ValidityParams {
    fn default() -> Self {
        Self {
            percent_reject: 25.0,
            alphabet: "ACGTN".to_string(),
        }
    }
}

/// Filtering of similarity-search hits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchParams {
    /// Distance around each array within which hits are the array itself
    pub pad: usize,
    pub max_evalue: f64,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self {
            pad: 100,
            max_evalue: 1e-6,
        }
    }
}

/// Mutation and context annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationParams {
    /// Width of the flanking windows reported around each target
    pub flank_width: usize,
    /// Extra bases on each side of the target when re-aligning the guide
    pub realign_slack: usize,
    /// A flank matching the consensus repeat end with at most this many mismatches marks a repeat copy
    pub repeat_flank_max_mismatches: usize,
}

impl Default for AnnotationParams {
    fn default() -> Self {
        Self {
            flank_width: 9,
            realign_slack: 3,
            repeat_flank_max_mismatches: 1,
        }
    }
}

/// Locus classification and orientation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocusParams {
    /// Window around an array searched for Cas genes (0 = whole genome)
    pub cas_gene_distance: usize,
    /// E-value cutoff for repeat-model hits
    pub repeat_max_evalue: f64,
}

impl Default for LocusParams {
    fn default() -> Self {
        Self {
            cas_gene_distance: 20_000,
            repeat_max_evalue: 1e-6,
        }
    }
}

/// Configuration for a whole run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub masking: MaskingParams,
    pub repeat_finder: RepeatFinderParams,
    pub boundary: BoundaryParams,
    pub validity: ValidityParams,
    pub matching: MatchParams,
    pub annotation: AnnotationParams,
    pub locus: LocusParams,
    /// Number of genomes processed concurrently
    pub threads: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            masking: MaskingParams::default(),
            repeat_finder: RepeatFinderParams::default(),
            boundary: BoundaryParams::default(),
            validity: ValidityParams::default(),
            matching: MatchParams::default(),
            annotation: AnnotationParams::default(),
            locus: LocusParams::default(),
            threads: std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get),
        }
    }
}

impl SearchConfig {
    /// Load configuration from a JSON file; missing fields take their defaults
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed, or holds invalid values.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse configuration from JSON text
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the JSON is malformed or holds invalid values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that values are usable
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rf = &self.repeat_finder;
        if rf.min_repeat_len > rf.max_repeat_len {
            return Err(ConfigError::Invalid(format!(
                "min repeat length {} exceeds max repeat length {}",
                rf.min_repeat_len, rf.max_repeat_len
            )));
        }
        if rf.min_spacer_len > rf.max_spacer_len {
            return Err(ConfigError::Invalid(format!(
                "min spacer length {} exceeds max spacer length {}",
                rf.min_spacer_len, rf.max_spacer_len
            )));
        }
        if !(0.0..=100.0).contains(&self.validity.percent_reject) {
            return Err(ConfigError::Invalid(format!(
                "percent_reject must be within 0-100, got {}",
                self.validity.percent_reject
            )));
        }
        if !(0.0..=1.0).contains(&self.boundary.overrep_fraction)
            || self.boundary.overrep_fraction == 0.0
        {
            return Err(ConfigError::Invalid(format!(
                "overrep_fraction must be within (0, 1], got {}",
                self.boundary.overrep_fraction
            )));
        }
        if self.annotation.flank_width == 0 {
            return Err(ConfigError::Invalid("flank_width must be positive".into()));
        }
        if self.masking.min_degenerate_run == 0 {
            return Err(ConfigError::Invalid(
                "min_degenerate_run must be positive".into(),
            ));
        }
        if self.threads == 0 {
            return Err(ConfigError::Invalid("threads must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SearchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.matching.pad, 100);
        assert!((config.validity.percent_reject - 25.0).abs() < f64::EPSILON);
        assert_eq!(config.boundary.probe_length(18), 9);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = SearchConfig::from_json(r#"{"matching": {"pad": 250}, "threads": 2}"#).unwrap();
        assert_eq!(config.matching.pad, 250);
        assert!((config.matching.max_evalue - 1e-6).abs() < 1e-12);
        assert_eq!(config.locus.cas_gene_distance, 20_000);
        assert_eq!(config.threads, 2);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = SearchConfig::from_json(r#"{"validity": {"percent_reject": 150}}"#);
        assert!(matches!(err, Err(ConfigError::Invalid(_))));

        let err = SearchConfig::from_json(
            r#"{"repeat_finder": {"min_repeat_len": 50, "max_repeat_len": 40}}"#,
        );
        assert!(matches!(err, Err(ConfigError::Invalid(_))));
    }
}
