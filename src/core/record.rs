use serde::{Deserialize, Serialize};

use crate::core::array::{Array, ConsensusStatus, SpacerRef};
use crate::core::types::{reverse_complement_str, Span, Strand};

/// A spacer match outside every array of its genome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetHit {
    pub contig: String,
    /// Genomic span of the aligned part of the match
    pub span: Span,
    pub strand: Strand,
    pub spacer: SpacerRef,
    /// Part of the spacer covered by the alignment (0-based, spacer coordinates)
    pub query_span: Span,
    pub mismatches: usize,
    pub gap_opens: usize,
    pub evalue: f64,
    pub bitscore: f64,
}

/// Edit type of one alignment column, guide relative to target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditType {
    Match,
    Mismatch,
    /// Base present in the target but not in the guide
    Insertion,
    /// Guide base with no counterpart in the target
    Deletion,
    /// Guide base whose target position lies past a contig edge
    OffContig,
}

/// One column of the guide/target alignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    /// 0-based guide position; for insertions, the guide position the base precedes
    pub guide_pos: usize,
    pub kind: EditType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guide_base: Option<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_base: Option<char>,
}

/// Comparison of one flanking repeat copy against the consensus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "notation", rename_all = "snake_case")]
pub enum RepeatComparison {
    Identical,
    Drift(String),
    /// No repeat on this side of the spacer, or it was left out of the alignment
    Absent,
}

/// Drift of the repeats flanking the self-targeting spacer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RepeatDrift {
    Assessed {
        upstream: RepeatComparison,
        downstream: RepeatComparison,
    },
    Skipped {
        reason: String,
    },
}

impl RepeatDrift {
    /// Human readable summary of the repeat drift
    #[must_use]
    pub fn summary(&self) -> String {
        let (up, down) = match self {
            Self::Skipped { .. } => return "Skipped".to_string(),
            Self::Assessed {
                upstream,
                downstream,
            } => (upstream, downstream),
        };
        match (up, down) {
            (RepeatComparison::Drift(u), RepeatComparison::Drift(d)) => {
                format!("Both repeats mutated: Upstream: {u}, Downstream: {d}")
            }
            (RepeatComparison::Drift(u), _) => format!("Upstream repeat mutated: {u}"),
            (_, RepeatComparison::Drift(d)) => format!("Downstream repeat mutated: {d}"),
            _ => "None".to_string(),
        }
    }
}

/// Fixed-width windows around the target, in crRNA orientation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlankPair {
    pub upstream: String,
    pub downstream: String,
}

impl FlankPair {
    /// Flanks as seen from the opposite strand
    #[must_use]
    pub fn flipped(&self) -> Self {
        Self {
            upstream: reverse_complement_str(&self.downstream),
            downstream: reverse_complement_str(&self.upstream),
        }
    }
}

/// Guide vs. target comparison plus repeat drift and flanks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationRecord {
    /// Genomic span of the target region aligned to the guide
    pub target_span: Span,
    /// Target sequence read on the guide's strand
    pub target_sequence: String,
    /// Every alignment column, in guide order (repeat-finder orientation)
    pub edits: Vec<Edit>,
    pub mismatches: usize,
    pub insertions: usize,
    pub deletions: usize,
    pub repeat_drift: RepeatDrift,
    pub flanks: FlankPair,
}

impl MutationRecord {
    /// Columns that differ from a perfect match
    pub fn differences(&self) -> impl Iterator<Item = &Edit> {
        self.edits.iter().filter(|e| e.kind != EditType::Match)
    }

    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.differences().next().is_none()
    }

    /// Compact notation: `.` match, lowercase substitution, uppercase insertion,
    /// `-` deletion, `x` off-contig
    #[must_use]
    pub fn notation(&self) -> String {
        if self.is_perfect() {
            return "Perfect match".to_string();
        }
        self.edits
            .iter()
            .map(|e| match e.kind {
                EditType::Match => '.',
                EditType::Mismatch => e.target_base.unwrap_or('n').to_ascii_lowercase(),
                EditType::Insertion => e.target_base.unwrap_or('N').to_ascii_uppercase(),
                EditType::Deletion => '-',
                EditType::OffContig => 'x',
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Array transcribed in the repeat-finder's orientation
    Forward,
    /// Array transcribed from the opposite strand
    Reverse,
    Unknown,
}

impl Orientation {
    /// Strand used for directional fields; unknown keeps the repeat-finder orientation
    #[must_use]
    pub fn effective_strand(self) -> Strand {
        match self {
            Self::Reverse => Strand::Reverse,
            Self::Forward | Self::Unknown => Strand::Forward,
        }
    }
}

impl From<Strand> for Orientation {
    fn from(strand: Strand) -> Self {
        match strand {
            Strand::Forward => Self::Forward,
            Strand::Reverse => Self::Reverse,
        }
    }
}

/// Which evidence settled the orientation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrientationEvidence {
    GeneBased,
    RepeatModel,
    /// Both lines of evidence present and in agreement
    Concordant,
    /// Evidence disagreed or was absent; each side's call is kept for reporting
    Conflict {
        gene: Option<Strand>,
        repeat: Option<Strand>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrientationCall {
    pub orientation: Orientation,
    pub evidence: OrientationEvidence,
}

impl OrientationCall {
    #[must_use]
    pub fn describe(&self) -> String {
        match (&self.orientation, &self.evidence) {
            (Orientation::Unknown, OrientationEvidence::Conflict { gene: None, repeat: None }) => {
                "Orientation unknown (no evidence)".to_string()
            }
            (Orientation::Unknown, _) => "Orientation unknown (conflicting evidence)".to_string(),
            (o, e) => {
                let dir = if *o == Orientation::Forward {
                    "Forward"
                } else {
                    "Reverse"
                };
                let by = match e {
                    OrientationEvidence::GeneBased => "Cas genes",
                    OrientationEvidence::RepeatModel => "repeat model",
                    OrientationEvidence::Concordant => "Cas genes and repeat model",
                    OrientationEvidence::Conflict { .. } => "conflicting evidence",
                };
                format!("{dir} (determined with {by})")
            }
        }
    }
}

/// A Cas gene found near an array by profile or domain search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CasGeneHit {
    /// Canonical gene family (e.g. `Cas9`, `Cas8e`)
    pub family: String,
    pub contig: String,
    pub span: Span,
    pub strand: Strand,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// CRISPR-Cas subtype assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", content = "subtypes", rename_all = "snake_case")]
pub enum Subtype {
    Resolved(String),
    /// Cas9 locus lacking the genes that separate II-C from II-A/II-B
    AmbiguousTypeII,
    /// Signature genes of several distinct systems in the window
    Multiple(Vec<String>),
    Unresolved,
}

impl std::fmt::Display for Subtype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resolved(s) => write!(f, "Type {s}"),
            Self::AmbiguousTypeII => write!(f, "Ambiguous Type II (II-C or incomplete II-A/II-B)"),
            Self::Multiple(types) => write!(f, "Multiple: {}", types.join(", ")),
            Self::Unresolved => write!(f, "Unresolved"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "genes", rename_all = "snake_case")]
pub enum Completeness {
    Complete,
    Missing(Vec<String>),
    /// Cas genes found but no single subtype to check against
    Undetermined,
    /// No Cas genes found
    NotApplicable,
}

impl std::fmt::Display for Completeness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Complete => write!(f, "Complete"),
            Self::Missing(genes) => write!(f, "Proteins missing: {}", genes.join(", ")),
            Self::Undetermined => write!(f, "Undetermined"),
            Self::NotApplicable => write!(f, "N/A"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocusCall {
    pub subtype: Subtype,
    pub completeness: Completeness,
    /// Cas genes supporting the call, in genomic order
    pub genes: Vec<CasGeneHit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_family: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repeat_subtypes: Vec<String>,
}

impl LocusCall {
    /// Comma separated list of the Cas gene families found
    #[must_use]
    pub fn gene_list(&self) -> String {
        if self.genes.is_empty() {
            return "None".to_string();
        }
        let mut names: Vec<&str> = Vec::new();
        for gene in &self.genes {
            if !names.contains(&gene.family.as_str()) {
                names.push(&gene.family);
            }
        }
        names.join(", ")
    }
}

/// Where the target falls relative to annotated genes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetContext {
    Within {
        gene: String,
    },
    /// Intergenic; `None` means the contig edge on that side
    Between {
        upstream: Option<String>,
        downstream: Option<String>,
    },
    NoFeatures,
    NotAnnotated,
}

impl std::fmt::Display for TargetContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Within { gene } => write!(f, "{gene}"),
            Self::Between {
                upstream,
                downstream,
            } => write!(
                f,
                "Between {} & {}",
                upstream.as_deref().unwrap_or("upstream contig edge"),
                downstream.as_deref().unwrap_or("downstream contig edge")
            ),
            Self::NoFeatures => write!(f, "No features in DNA"),
            Self::NotAnnotated => write!(f, "Not annotated"),
        }
    }
}

/// A self-targeting spacer with everything learned about it.
///
/// Records are created once every stage succeeded for their hit and are only
/// modified afterwards by the locus rerun path or a prophage lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StsRecord {
    pub genome: String,
    pub hit: TargetHit,
    pub array: Array,
    pub consensus: ConsensusStatus,
    pub orientation: OrientationCall,
    pub mutation: MutationRecord,
    pub locus: LocusCall,
    pub target_context: TargetContext,
    /// Set by the prophage service; `None` until looked up
    #[serde(default)]
    pub prophage: Option<bool>,
}

impl StsRecord {
    /// Sequence of the self-targeting spacer as called by the repeat-finder
    #[must_use]
    pub fn spacer_sequence(&self) -> &str {
        self.array
            .spacer(self.hit.spacer.spacer)
            .map_or("", |s| s.sequence.as_str())
    }

    /// Spacer sequence in crRNA orientation
    #[must_use]
    pub fn oriented_spacer(&self) -> String {
        match self.orientation.orientation.effective_strand() {
            Strand::Forward => self.spacer_sequence().to_string(),
            Strand::Reverse => reverse_complement_str(self.spacer_sequence()),
        }
    }

    /// Key ordering records by genome, array and genomic position of the hit
    #[must_use]
    pub fn sort_key(&self) -> (String, usize, String, usize, usize) {
        (
            self.genome.clone(),
            self.array.id.0,
            self.hit.contig.clone(),
            self.hit.span.start,
            self.hit.spacer.spacer,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(pos: usize, kind: EditType, target: Option<char>) -> Edit {
        Edit {
            guide_pos: pos,
            kind,
            guide_base: Some('A'),
            target_base: target,
        }
    }

    fn record_with(edits: Vec<Edit>) -> MutationRecord {
        MutationRecord {
            target_span: Span::new(0, 4),
            target_sequence: "AAAA".into(),
            edits,
            mismatches: 0,
            insertions: 0,
            deletions: 0,
            repeat_drift: RepeatDrift::Skipped {
                reason: "test".into(),
            },
            flanks: FlankPair {
                upstream: "AAC".into(),
                downstream: "GGT".into(),
            },
        }
    }

    #[test]
    fn test_notation() {
        let perfect = record_with(vec![
            edit(0, EditType::Match, Some('A')),
            edit(1, EditType::Match, Some('A')),
        ]);
        assert_eq!(perfect.notation(), "Perfect match");

        let mixed = record_with(vec![
            edit(0, EditType::Match, Some('A')),
            edit(1, EditType::Mismatch, Some('G')),
            edit(2, EditType::Insertion, Some('t')),
            edit(2, EditType::Deletion, None),
            edit(3, EditType::OffContig, None),
        ]);
        assert_eq!(mixed.notation(), ".gT-x");
        assert_eq!(mixed.differences().count(), 4);
    }

    #[test]
    fn test_flank_flip() {
        let flanks = FlankPair {
            upstream: "AAC".into(),
            downstream: "GGT".into(),
        };
        let flipped = flanks.flipped();
        assert_eq!(flipped.upstream, "ACC");
        assert_eq!(flipped.downstream, "GTT");
        assert_eq!(flipped.flipped(), flanks);
    }

    #[test]
    fn test_repeat_drift_summary() {
        let drift = RepeatDrift::Assessed {
            upstream: RepeatComparison::Identical,
            downstream: RepeatComparison::Drift("..a.".into()),
        };
        assert_eq!(drift.summary(), "Downstream repeat mutated: ..a.");

        let both = RepeatDrift::Assessed {
            upstream: RepeatComparison::Drift("t...".into()),
            downstream: RepeatComparison::Drift("..a.".into()),
        };
        assert_eq!(
            both.summary(),
            "Both repeats mutated: Upstream: t..., Downstream: ..a."
        );
    }

    #[test]
    fn test_orientation_description() {
        let call = OrientationCall {
            orientation: Orientation::Unknown,
            evidence: OrientationEvidence::Conflict {
                gene: Some(Strand::Forward),
                repeat: Some(Strand::Reverse),
            },
        };
        assert_eq!(call.describe(), "Orientation unknown (conflicting evidence)");
        assert_eq!(call.orientation.effective_strand(), Strand::Forward);
    }
}
