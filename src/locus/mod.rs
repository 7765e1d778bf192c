//! Locus classification and array orientation.
//!
//! For each array the Cas genes in a window around it (or the whole genome
//! when the window is 0) are classified into a CRISPR-Cas subtype, and the
//! array strand is resolved from two independent lines of evidence:
//!
//! | Evidence | Source | Strand call |
//! |----------|--------|-------------|
//! | Gene-based | Cas gene placement vs. the subtype's expected layout | `+` if they match |
//! | Repeat model | best repeat-family profile hit of the consensus | strand of the hit |
//!
//! Both steps run once per array and are shared by every hit of that
//! array. The same entry point serves the locus rerun path.

pub mod classifier;
pub mod definitions;
pub mod orientation;

pub use classifier::classify_locus;
pub use definitions::canonical_family;
pub use orientation::{gene_strand, repeat_strand, resolve_orientation};

use crate::config::LocusParams;
use crate::core::{Array, ConsensusStatus, LocusCall, OrientationCall};
use crate::external::{CasGeneSearch, CasQuery, RepeatModelSearch, ToolError};

/// Locus call and orientation for one array
#[derive(Debug, Clone, PartialEq)]
pub struct LocusAnalysis {
    pub locus: LocusCall,
    pub orientation: OrientationCall,
}

/// The collaborators consulted by [`analyze_locus`]
#[derive(Clone, Copy)]
pub struct LocusSources<'a> {
    pub cas_genes: Option<&'a dyn CasGeneSearch>,
    pub repeat_model: &'a dyn RepeatModelSearch,
}

/// Classify the locus of an array and resolve its orientation
///
/// # Errors
///
/// Returns `ToolError` if the Cas gene or repeat-model search fails.
pub fn analyze_locus(
    genome: &str,
    genome_contigs: &[String],
    array: &Array,
    consensus: &ConsensusStatus,
    sources: LocusSources<'_>,
    params: &LocusParams,
) -> Result<LocusAnalysis, ToolError> {
    let span = array.span();
    let window = (params.cas_gene_distance > 0).then(|| span.padded(params.cas_gene_distance));

    let genes = match sources.cas_genes {
        Some(search) => search.find_cas_genes(&CasQuery {
            genome,
            contig: &array.contig,
            window,
            genome_contigs,
        })?,
        None => Vec::new(),
    };

    let repeat_hit = match consensus.consensus() {
        Some(c) => sources.repeat_model.classify(&c.sequence, params.repeat_max_evalue)?,
        None => None,
    };

    let locus = classify_locus(genes, repeat_hit.as_ref());
    let gene = gene_strand(&array.contig, &span, &locus.genes, &locus.subtype);
    let repeat = repeat_strand(repeat_hit.as_ref());
    let orientation = resolve_orientation(gene, repeat);

    tracing::debug!(
        array = %array.id,
        subtype = %locus.subtype,
        orientation = %orientation.describe(),
        "Analysed locus"
    );

    Ok(LocusAnalysis { locus, orientation })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::array::fixtures::array_from_parts;
    use crate::core::{
        CasGeneHit, ConsensusRepeat, Orientation, OrientationEvidence, Span, Strand, Subtype,
    };
    use crate::external::{CasHitTable, NoRepeatModel, RepeatModelHit};

    struct FixedRepeatModel(Strand);

    impl RepeatModelSearch for FixedRepeatModel {
        fn classify(&self, _: &str, _: f64) -> Result<Option<RepeatModelHit>, ToolError> {
            Ok(Some(RepeatModelHit {
                family: "F3".to_string(),
                strand: self.0,
                evalue: 1e-10,
                subtypes: vec!["I-E".to_string()],
            }))
        }
    }

    fn consensus() -> ConsensusStatus {
        ConsensusStatus::Available(ConsensusRepeat {
            sequence: "GTTTCAGTGGCC".to_string(),
            aligned: "GTTTCAGTGGCC".to_string(),
            conservation: vec![1.0; 12],
            rows: Vec::new(),
            deviations: Vec::new(),
        })
    }

    fn cas_table() -> CasHitTable {
        let gene = |family: &str, start: usize| CasGeneHit {
            family: family.to_string(),
            contig: "contig1".to_string(),
            span: Span::with_len(start, 900),
            strand: Strand::Forward,
            score: 100.0,
            id: None,
        };
        CasHitTable::new(vec![gene("Cas3", 1_000), gene("Cse1", 2_000), gene("Cas1", 3_000)])
    }

    #[test]
    fn test_gene_and_repeat_evidence_conflict() {
        let array = array_from_parts(1, 10_000, &["GTTTCAGTGGCC"; 3], &["ACGTACGT", "TTGGCCAA"]);
        let table = cas_table();
        let model = FixedRepeatModel(Strand::Reverse);
        let sources = LocusSources {
            cas_genes: Some(&table),
            repeat_model: &model,
        };
        let analysis = analyze_locus("g", &[], &array, &consensus(), sources, &LocusParams::default())
            .unwrap();

        assert_eq!(analysis.locus.subtype, Subtype::Resolved("I-E".to_string()));
        assert_eq!(analysis.orientation.orientation, Orientation::Unknown);
        assert_eq!(
            analysis.orientation.evidence,
            OrientationEvidence::Conflict {
                gene: Some(Strand::Forward),
                repeat: Some(Strand::Reverse)
            }
        );
        assert_eq!(analysis.locus.repeat_family.as_deref(), Some("F3"));
    }

    #[test]
    fn test_genes_outside_window_are_ignored() {
        let array = array_from_parts(1, 50_000, &["GTTTCAGTGGCC"; 3], &["ACGTACGT", "TTGGCCAA"]);
        let table = cas_table();
        let sources = LocusSources {
            cas_genes: Some(&table),
            repeat_model: &NoRepeatModel,
        };
        let analysis = analyze_locus("g", &[], &array, &consensus(), sources, &LocusParams::default())
            .unwrap();
        assert_eq!(analysis.locus.subtype, Subtype::Unresolved);
        assert_eq!(analysis.orientation.orientation, Orientation::Unknown);

        let whole = LocusParams {
            cas_gene_distance: 0,
            ..LocusParams::default()
        };
        let analysis = analyze_locus("g", &[], &array, &consensus(), sources, &whole).unwrap();
        assert_eq!(analysis.locus.subtype, Subtype::Resolved("I-E".to_string()));
        assert_eq!(analysis.orientation.orientation, Orientation::Forward);
        assert_eq!(analysis.orientation.evidence, OrientationEvidence::GeneBased);
    }
}
