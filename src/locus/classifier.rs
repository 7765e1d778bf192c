use crate::core::{CasGeneHit, Completeness, LocusCall, Subtype};
use crate::external::RepeatModelHit;
use crate::locus::definitions::{required_genes, SUBTYPE_SIGNATURES, TYPE_SIGNATURES};

/// One system suggested by the genes in the window
#[derive(Debug, Clone, PartialEq, Eq)]
enum Candidate {
    Subtype(&'static str),
    /// Type-level marker only
    Type(&'static str),
    AmbiguousTypeII,
}

impl Candidate {
    fn label(&self) -> &'static str {
        match self {
            Self::Subtype(s) | Self::Type(s) => *s,
            Self::AmbiguousTypeII => "II",
        }
    }
}

fn candidates(families: &[&str]) -> Vec<Candidate> {
    let has = |gene: &str| families.contains(&gene);
    let mut found: Vec<Candidate> = SUBTYPE_SIGNATURES
        .iter()
        .filter(|(_, markers)| markers.iter().any(|m| has(m)))
        .map(|(subtype, _)| Candidate::Subtype(*subtype))
        .collect();

    for (ty, marker) in TYPE_SIGNATURES {
        if !has(marker) {
            continue;
        }
        if *ty == "II" {
            found.push(if has("Csn2") {
                Candidate::Subtype("II-A")
            } else if has("Cas4") {
                Candidate::Subtype("II-B")
            } else {
                Candidate::AmbiguousTypeII
            });
            continue;
        }
        let prefix = format!("{ty}-");
        let has_subtype = found
            .iter()
            .any(|c| matches!(c, Candidate::Subtype(s) if s.starts_with(&prefix)));
        if !has_subtype {
            found.push(Candidate::Type(*ty));
        }
    }
    found
}

fn completeness(subtype: &str, families: &[&str]) -> Completeness {
    match required_genes(subtype) {
        Some(required) => {
            let missing: Vec<String> = required
                .iter()
                .filter(|g| !families.contains(*g))
                .map(|g| (*g).to_string())
                .collect();
            if missing.is_empty() {
                Completeness::Complete
            } else {
                Completeness::Missing(missing)
            }
        }
        None => Completeness::Undetermined,
    }
}

/// Assign a CRISPR-Cas subtype from the Cas genes found around an array.
///
/// Signature genes decide the subtype. A Cas9 locus without `Csn2` or
/// `Cas4` cannot be told apart from an incomplete II-A/II-B locus and is
/// reported as [`Subtype::AmbiguousTypeII`]; its completeness is checked
/// against the II-C gene set. Markers of several systems give
/// [`Subtype::Multiple`].
#[must_use]
pub fn classify_locus(mut genes: Vec<CasGeneHit>, repeat: Option<&RepeatModelHit>) -> LocusCall {
    genes.sort_by(|a, b| (&a.contig, a.span).cmp(&(&b.contig, b.span)));

    let mut families: Vec<&str> = Vec::new();
    for gene in &genes {
        if !families.contains(&gene.family.as_str()) {
            families.push(&gene.family);
        }
    }

    let found = candidates(&families);
    let (subtype, completeness) = match found.as_slice() {
        [] if families.is_empty() => (Subtype::Unresolved, Completeness::NotApplicable),
        [] => (Subtype::Unresolved, Completeness::Undetermined),
        [Candidate::AmbiguousTypeII] => (Subtype::AmbiguousTypeII, completeness("II-C", &families)),
        [single] => {
            let label = single.label();
            (Subtype::Resolved(label.to_string()), completeness(label, &families))
        }
        several => (
            Subtype::Multiple(several.iter().map(|c| c.label().to_string()).collect()),
            Completeness::Undetermined,
        ),
    };

    tracing::debug!(subtype = %subtype, genes = families.len(), "Classified locus");

    LocusCall {
        subtype,
        completeness,
        genes,
        repeat_family: repeat.map(|r| r.family.clone()),
        repeat_subtypes: repeat.map(|r| r.subtypes.clone()).unwrap_or_default(),
    }
}
