//! Masking of long degenerate stretches before repeat finding.
//!
//! Scaffolded assemblies contain long runs of `N` that repeat-finders happily
//! report as high-identity repeats. Every run of ambiguous symbols at least
//! `min_degenerate_run` long is replaced by an equally long filler of
//! unambiguous bases, so masked and raw coordinates coincide. Arrays that
//! overlap a masked run are discarded later by the array refiner.

mod mask;

pub use mask::{mask_degenerate_runs, MaskedSequence};

use crate::config::MaskingParams;
use crate::core::{Contig, Genome};

/// Masked copy of one contig, paired with the contig it came from
#[derive(Debug, Clone)]
pub struct MaskedContig<'a> {
    pub contig: &'a Contig,
    pub masked: MaskedSequence,
}

/// Mask every contig of a genome
#[must_use]
pub fn mask_genome<'a>(genome: &'a Genome, params: &MaskingParams) -> Vec<MaskedContig<'a>> {
    genome
        .contigs
        .iter()
        .map(|contig| {
            let masked = mask_degenerate_runs(&contig.sequence, params.min_degenerate_run);
            if !masked.runs.is_empty() {
                tracing::debug!(
                    contig = %contig.name,
                    runs = masked.runs.len(),
                    bases = masked.masked_bases(),
                    "Masked degenerate runs"
                );
            }
            MaskedContig { contig, masked }
        })
        .collect()
}
