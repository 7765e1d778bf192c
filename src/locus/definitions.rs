//! Cas gene families, synonyms and per-subtype marker tables.

/// Canonical gene family names recognised in profile and table hits.
/// Longer names come first so `Cas10d` is tried before `Cas10`.
pub const CAS_FAMILIES: &[&str] = &[
    "Cas10d", "Cas12a", "Cas12b", "Cas13a", "Cas13b", "Cas8a", "Cas8b", "Cas8c", "Cas8e", "Cas8f",
    "Cas6f", "Cas10", "Cas1", "Cas2", "Cas3", "Cas4", "Cas5", "Cas6", "Cas7", "Cas9", "Cse2", "Csa5",
    "Csn2", "Csm2", "Csm3", "Csm4", "Csm5", "Csm6", "Cmr1", "Cmr3", "Cmr4", "Cmr5", "Cmr6", "Csf1",
    "Csf2", "Csf3",
];

/// Legacy or subtype-specific names and the family they denote
pub const SYNONYMS: &[(&str, &str)] = &[
    ("Csn1", "Cas9"),
    ("Csx12", "Cas9"),
    ("Cse1", "Cas8e"),
    ("CasA", "Cas8e"),
    ("CasB", "Cse2"),
    ("Csy1", "Cas8f"),
    ("Csy2", "Cas5"),
    ("Csy3", "Cas7"),
    ("Csy4", "Cas6f"),
    ("Csh1", "Cas8b"),
    ("Csd1", "Cas8c"),
    ("Csc3", "Cas10d"),
    ("Csm1", "Cas10"),
    ("Cmr2", "Cas10"),
    ("Cpf1", "Cas12a"),
    ("C2c1", "Cas12b"),
    ("C2c2", "Cas13a"),
    ("C2c6", "Cas13b"),
];

/// Canonical family for a profile or product name.
///
/// The name is split on non-alphanumeric characters and each token is
/// compared whole, so `Cas1` never matches inside `Cas10` or `Cas12a`.
/// Names that match nothing are returned unchanged.
#[must_use]
pub fn canonical_family(name: &str) -> String {
    for token in name.split(|c: char| !c.is_ascii_alphanumeric()) {
        if token.is_empty() {
            continue;
        }
        if let Some(family) = CAS_FAMILIES.iter().find(|f| f.eq_ignore_ascii_case(token)) {
            return (*family).to_string();
        }
        if let Some((_, family)) = SYNONYMS.iter().find(|(s, _)| s.eq_ignore_ascii_case(token)) {
            return (*family).to_string();
        }
    }
    name.to_string()
}

/// Where the Cas genes of a subtype sit relative to the leader end of its arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasPlacement {
    /// Cas operon precedes the array in its transcription direction
    Upstream,
    /// Cas operon follows the array
    Downstream,
}

/// Marker genes that assign a subtype (any one suffices)
pub const SUBTYPE_SIGNATURES: &[(&str, &[&str])] = &[
    ("I-A", &["Cas8a", "Csa5"]),
    ("I-B", &["Cas8b"]),
    ("I-C", &["Cas8c"]),
    ("I-D", &["Cas10d"]),
    ("I-E", &["Cas8e", "Cse2"]),
    ("I-F", &["Cas8f", "Cas6f"]),
    ("III-A", &["Csm2", "Csm3", "Csm4", "Csm5", "Csm6"]),
    ("III-B", &["Cmr1", "Cmr3", "Cmr4", "Cmr5", "Cmr6"]),
    ("IV", &["Csf1", "Csf2", "Csf3"]),
    ("V-A", &["Cas12a"]),
    ("V-B", &["Cas12b"]),
    ("VI-A", &["Cas13a"]),
    ("VI-B", &["Cas13b"]),
];

/// Genes that mark a type without naming its subtype
pub const TYPE_SIGNATURES: &[(&str, &str)] = &[("I", "Cas3"), ("III", "Cas10"), ("II", "Cas9")];

/// Genes a complete locus of each subtype carries
pub const REQUIRED_GENES: &[(&str, &[&str])] = &[
    ("I-A", &["Cas1", "Cas2", "Cas3", "Cas4", "Cas5", "Cas6", "Cas7", "Cas8a"]),
    ("I-B", &["Cas1", "Cas2", "Cas3", "Cas4", "Cas5", "Cas6", "Cas7", "Cas8b"]),
    ("I-C", &["Cas1", "Cas2", "Cas3", "Cas4", "Cas5", "Cas7", "Cas8c"]),
    ("I-D", &["Cas1", "Cas2", "Cas3", "Cas4", "Cas5", "Cas6", "Cas7", "Cas10d"]),
    ("I-E", &["Cas1", "Cas2", "Cas3", "Cas5", "Cas6", "Cas7", "Cas8e", "Cse2"]),
    ("I-F", &["Cas1", "Cas3", "Cas5", "Cas6f", "Cas7", "Cas8f"]),
    ("II-A", &["Cas1", "Cas2", "Cas9", "Csn2"]),
    ("II-B", &["Cas1", "Cas2", "Cas4", "Cas9"]),
    ("II-C", &["Cas1", "Cas2", "Cas9"]),
    ("III-A", &["Cas6", "Cas10", "Csm2", "Csm3", "Csm4", "Csm5"]),
    ("III-B", &["Cas6", "Cas10", "Cmr1", "Cmr3", "Cmr4", "Cmr5", "Cmr6"]),
    ("IV", &["Csf1", "Csf2", "Csf3"]),
    ("V-A", &["Cas1", "Cas2", "Cas4", "Cas12a"]),
    ("V-B", &["Cas1", "Cas2", "Cas4", "Cas12b"]),
    ("VI-A", &["Cas1", "Cas2", "Cas13a"]),
    ("VI-B", &["Cas13b"]),
];

#[must_use]
pub fn required_genes(subtype: &str) -> Option<&'static [&'static str]> {
    REQUIRED_GENES
        .iter()
        .find(|(s, _)| *s == subtype)
        .map(|(_, genes)| *genes)
}

/// Expected Cas operon placement for a subtype or bare type
#[must_use]
pub fn expected_placement(subtype: &str) -> Option<CasPlacement> {
    match subtype {
        "II-C" => Some(CasPlacement::Downstream),
        "II-A" | "II-B" | "II" | "V-A" | "V-B" => Some(CasPlacement::Upstream),
        s if s == "I" || s.starts_with("I-") => Some(CasPlacement::Upstream),
        _ => None,
    }
}
