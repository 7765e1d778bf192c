use std::collections::HashMap;
use std::path::Path;

use super::{CasGeneSearch, CasQuery, ProphageService, RepeatModelHit, RepeatModelSearch, ToolError};
use crate::core::{CasGeneHit, Span};
use crate::locus::definitions::canonical_family;
use crate::parsing::tables::{parse_cas_hits, parse_islands, parse_repeat_families, read_table};
use crate::parsing::ParseError;

/// Precomputed Cas gene hits read from a table
#[derive(Debug, Clone, Default)]
pub struct CasHitTable {
    hits: Vec<CasGeneHit>,
}

impl CasHitTable {
    #[must_use]
    pub fn new(mut hits: Vec<CasGeneHit>) -> Self {
        for hit in &mut hits {
            hit.family = canonical_family(&hit.family);
        }
        hits.sort_by(|a, b| (&a.contig, a.span).cmp(&(&b.contig, b.span)));
        Self { hits }
    }

    /// Load a Cas hit table from a TSV file
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ParseError> {
        read_table(path, parse_cas_hits).map(Self::new)
    }
}

impl CasGeneSearch for CasHitTable {
    fn find_cas_genes(&self, query: &CasQuery<'_>) -> Result<Vec<CasGeneHit>, ToolError> {
        Ok(self
            .hits
            .iter()
            .filter(|h| query.admits(&h.contig, &h.span))
            .cloned()
            .collect())
    }
}

/// Prophage islands read from a table
#[derive(Debug, Clone, Default)]
pub struct IslandTable {
    islands: HashMap<String, Vec<Span>>,
}

impl IslandTable {
    /// Load an island table from a TSV file
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ParseError> {
        let rows = read_table(path, parse_islands)?;
        let mut islands: HashMap<String, Vec<Span>> = HashMap::new();
        for row in rows {
            let entry = islands.entry(row.contig).or_default();
            if let Some(span) = row.span {
                entry.push(span);
            }
        }
        Ok(Self { islands })
    }

    /// Record the islands of one contig (empty for an analysed contig without islands)
    pub fn insert(&mut self, contig: impl Into<String>, spans: Vec<Span>) {
        self.islands.insert(contig.into(), spans);
    }
}

impl ProphageService for IslandTable {
    fn in_island(&self, contig: &str, span: Span) -> Result<Option<bool>, ToolError> {
        Ok(self
            .islands
            .get(contig)
            .map(|islands| islands.iter().any(|i| i.overlaps(&span))))
    }
}

/// Subtypes known to carry each repeat family
#[derive(Debug, Clone, Default)]
pub struct RepeatFamilyTable {
    families: HashMap<String, Vec<String>>,
}

impl RepeatFamilyTable {
    /// Load a repeat family table from a TSV file
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ParseError> {
        let families = read_table(path, parse_repeat_families)?;
        Ok(Self {
            families: families.into_iter().collect(),
        })
    }

    #[must_use]
    pub fn subtypes(&self, family: &str) -> &[String] {
        self.families.get(family).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Repeat model used when no repeat profiles are configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRepeatModel;

impl RepeatModelSearch for NoRepeatModel {
    fn classify(&self, _consensus: &str, _max_evalue: f64) -> Result<Option<RepeatModelHit>, ToolError> {
        Ok(None)
    }
}
