use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Command;

use super::{
    run_tool, CasGeneSearch, CasQuery, Gene, GeneAnnotation, RepeatFamilyTable, RepeatModelHit,
    RepeatModelSearch, ToolError,
};
use crate::core::CasGeneHit;
use crate::locus::definitions::canonical_family;
use crate::parsing::hmmer::{parse_nucleotide_tblout, parse_protein_tblout};
use crate::parsing::fasta::write_fasta_file;
use crate::parsing::proteins::{read_proteins, PredictedProtein};

const PROTEIN_EXTENSIONS: [&str; 3] = ["faa", "fa", "fasta"];

/// Directory of predicted protein FASTA files, one per genome (`<genome>.faa`)
#[derive(Debug, Clone)]
pub struct ProteinDirectory {
    pub dir: PathBuf,
}

impl ProteinDirectory {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, genome: &str) -> Option<PathBuf> {
        PROTEIN_EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{genome}.{ext}")))
            .find(|p| p.is_file())
    }

    /// Proteins predicted for a genome, `None` if it has no protein file
    ///
    /// # Errors
    ///
    /// Returns `ToolError::Output` if the protein file cannot be parsed.
    pub fn proteins(&self, genome: &str) -> Result<Option<Vec<PredictedProtein>>, ToolError> {
        let Some(path) = self.path_for(genome) else {
            return Ok(None);
        };
        read_proteins(&path)
            .map(Some)
            .map_err(|e| ToolError::output("protein annotation", e))
    }
}

impl GeneAnnotation for ProteinDirectory {
    fn genes(&self, genome: &str) -> Result<Option<Vec<Gene>>, ToolError> {
        Ok(self
            .proteins(genome)?
            .map(|proteins| proteins.into_iter().map(|p| p.gene).collect()))
    }
}

/// `hmmscan` of the predicted proteins near an array against Cas gene profiles
#[derive(Debug, Clone)]
pub struct HmmscanCasSearch {
    pub binary: PathBuf,
    pub profiles: PathBuf,
    pub proteins: ProteinDirectory,
    pub max_evalue: f64,
}

impl HmmscanCasSearch {
    #[must_use]
    pub fn new(binary: PathBuf, profiles: PathBuf, proteins: ProteinDirectory) -> Self {
        Self {
            binary,
            profiles,
            proteins,
            max_evalue: 1e-6,
        }
    }
}

impl CasGeneSearch for HmmscanCasSearch {
    fn find_cas_genes(&self, query: &CasQuery<'_>) -> Result<Vec<CasGeneHit>, ToolError> {
        let Some(proteins) = self.proteins.proteins(query.genome)? else {
            tracing::debug!(genome = query.genome, "No predicted proteins; skipping Cas gene search");
            return Ok(Vec::new());
        };
        let nearby: Vec<&PredictedProtein> = proteins
            .iter()
            .filter(|p| query.admits(&p.gene.contig, &p.gene.span))
            .collect();
        if nearby.is_empty() {
            return Ok(Vec::new());
        }

        let dir = tempfile::tempdir()?;
        let input = dir.path().join("proteins.faa");
        let table = dir.path().join("hits.tbl");
        let records: Vec<(&str, &[u8])> = nearby
            .iter()
            .map(|p| (p.gene.id.as_str(), p.sequence.as_slice()))
            .collect();
        write_fasta_file(&input, &records)?;

        let mut cmd = Command::new(&self.binary);
        cmd.args(["-E", &self.max_evalue.to_string(), "--noali", "--tblout"])
            .arg(&table)
            .arg(&self.profiles)
            .arg(&input);
        run_tool("hmmscan", &mut cmd, None)?;

        let text = std::fs::read_to_string(&table)?;
        let rows = parse_protein_tblout(&text).map_err(|e| ToolError::output("hmmscan", e))?;

        // Best-scoring profile per protein
        let mut best: HashMap<&str, (&str, f64)> = HashMap::new();
        for row in &rows {
            let entry = best.entry(row.protein.as_str()).or_insert((row.family.as_str(), row.score));
            if row.score > entry.1 {
                *entry = (row.family.as_str(), row.score);
            }
        }

        let mut hits: Vec<CasGeneHit> = nearby
            .iter()
            .filter_map(|p| {
                let (family, score) = best.get(p.gene.id.as_str())?;
                Some(CasGeneHit {
                    family: canonical_family(family),
                    contig: p.gene.contig.clone(),
                    span: p.gene.span,
                    strand: p.gene.strand,
                    score: *score,
                    id: Some(p.gene.id.clone()),
                })
            })
            .collect();
        hits.sort_by(|a, b| (&a.contig, a.span).cmp(&(&b.contig, b.span)));
        Ok(hits)
    }
}

/// `nhmmscan` of a consensus repeat against repeat-family profiles
#[derive(Debug, Clone)]
pub struct NhmmscanRepeatModel {
    pub binary: PathBuf,
    pub profiles: PathBuf,
    pub families: RepeatFamilyTable,
}

impl NhmmscanRepeatModel {
    #[must_use]
    pub fn new(binary: PathBuf, profiles: PathBuf, families: RepeatFamilyTable) -> Self {
        Self {
            binary,
            profiles,
            families,
        }
    }
}

impl RepeatModelSearch for NhmmscanRepeatModel {
    fn classify(&self, consensus: &str, max_evalue: f64) -> Result<Option<RepeatModelHit>, ToolError> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("consensus.fa");
        let table = dir.path().join("hits.tbl");
        write_fasta_file(&input, &[("consensus_repeat", consensus.as_bytes())])?;

        let mut cmd = Command::new(&self.binary);
        cmd.args(["-E", &max_evalue.to_string(), "--noali", "--tblout"])
            .arg(&table)
            .arg(&self.profiles)
            .arg(&input);
        run_tool("nhmmscan", &mut cmd, None)?;

        let text = std::fs::read_to_string(&table)?;
        let rows = parse_nucleotide_tblout(&text).map_err(|e| ToolError::output("nhmmscan", e))?;

        let best = rows
            .into_iter()
            .filter(|r| r.evalue <= max_evalue)
            .min_by(|a, b| a.evalue.total_cmp(&b.evalue));

        Ok(best.map(|row| {
            // Models built from reversed curation data carry an `R` suffix
            let family = row
                .family
                .strip_suffix('R')
                .unwrap_or(&row.family)
                .to_string();
            RepeatModelHit {
                subtypes: self.families.subtypes(&family).to_vec(),
                family,
                strand: row.strand,
                evalue: row.evalue,
            }
        }))
    }
}
