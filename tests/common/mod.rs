//! Fixture genome and collaborator fakes shared by the integration tests
//!
//! External tools are replaced by in-process fakes: a repeat-finder that
//! reports a fixed array, a brute-force Hamming search standing in for the
//! similarity search, and an aligner that returns equal-length input as is.
#![allow(dead_code)]

use std::path::PathBuf;

use sts_search::config::SearchConfig;
use sts_search::core::types::reverse_complement_str;
use sts_search::external::{
    CasHitTable, Gene, GeneAnnotation, IslandTable, MultipleAligner, NoRepeatModel, RawArray,
    RepeatFinder, SearchHit, SimilaritySearch, ToolError, Toolkit,
};
use sts_search::parsing::fasta::write_fasta_file;
use sts_search::{CasGeneHit, Contig, Genome, Span, SpacerRef, Strand};
use tempfile::TempDir;

pub const CONTIG: &str = "chr1";
pub const CONTIG_LEN: usize = 12_000;
pub const ARRAY_START: usize = 2_000;
pub const REPEAT: &str = "GTGTTCCCCGCGCCAGCGGGGATAAACC";
pub const SPACERS: [&str; 4] = [
    "ATCGGTACCTTGAGCAAGTCCTAGGCATTCAG",
    "CGTAACGGTTCAGGATCCAAGTTGCACGATTC",
    "GACCTTAGCAGGTCATTCGAACGTGGACATTA",
    "TTGCAACGTAGCCTAGGAACTTCGGATCCAGT",
];
/// Copy of spacer 1 inside the padded array footprint
pub const NEAR_COPY: usize = 2_300;
/// Exact copy of spacer 2
pub const FORWARD_TARGET: usize = 6_000;
/// Reverse-strand copy of spacer 3 with a substitution at guide position 6
pub const REVERSE_TARGET: usize = 9_000;

pub fn random_bases(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            b"ACGT"[((state >> 33) % 4) as usize]
        })
        .collect()
}

pub fn place(sequence: &mut [u8], at: usize, text: &str) {
    sequence[at..at + text.len()].copy_from_slice(text.as_bytes());
}

pub fn mutated_spacer_3() -> String {
    let mut bases: Vec<char> = SPACERS[2].chars().collect();
    bases[5] = if bases[5] == 'A' { 'C' } else { 'A' };
    bases.into_iter().collect()
}

/// Array layout: (repeat spans, spacer spans)
pub fn array_layout() -> (Vec<Span>, Vec<Span>) {
    let mut pos = ARRAY_START;
    let mut repeats = Vec::new();
    let mut spacers = Vec::new();
    for i in 0..=SPACERS.len() {
        repeats.push(Span::with_len(pos, REPEAT.len()));
        pos += REPEAT.len();
        if let Some(spacer) = SPACERS.get(i) {
            spacers.push(Span::with_len(pos, spacer.len()));
            pos += spacer.len();
        }
    }
    (repeats, spacers)
}

pub fn genome_sequence(seed: u64) -> Vec<u8> {
    let mut sequence = random_bases(CONTIG_LEN, seed);
    let (repeats, spacers) = array_layout();
    for span in &repeats {
        place(&mut sequence, span.start, REPEAT);
    }
    for (span, spacer) in spacers.iter().zip(SPACERS) {
        place(&mut sequence, span.start, spacer);
    }
    place(&mut sequence, NEAR_COPY, SPACERS[0]);
    place(&mut sequence, FORWARD_TARGET, SPACERS[1]);
    place(&mut sequence, REVERSE_TARGET, &reverse_complement_str(&mutated_spacer_3()));
    sequence
}

pub fn genome(name: &str) -> Genome {
    Genome::new(name, vec![Contig::new(CONTIG, genome_sequence(7))])
}

/// Reports the planted array on `chr1`, fails on `broken`
pub struct FixedArrayFinder;

impl RepeatFinder for FixedArrayFinder {
    fn find_arrays(&self, contig: &str, _masked: &[u8]) -> Result<Vec<RawArray>, ToolError> {
        match contig {
            CONTIG => {
                let (repeats, spacers) = array_layout();
                Ok(vec![RawArray {
                    contig: contig.to_string(),
                    repeats,
                    spacers,
                }])
            }
            "broken" => Err(ToolError::NonZeroExit {
                tool: "CRT".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "simulated failure".to_string(),
            }),
            _ => Ok(Vec::new()),
        }
    }
}

/// Every window within two substitutions of a spacer, on both strands
pub struct HammingSearch;

impl SimilaritySearch for HammingSearch {
    fn search(&self, queries: &[(SpacerRef, String)], genome: &Genome) -> Result<Vec<SearchHit>, ToolError> {
        let mut hits = Vec::new();
        for (query, sequence) in queries {
            let reverse = reverse_complement_str(sequence);
            for contig in &genome.contigs {
                for (strand, probe) in [(Strand::Forward, sequence), (Strand::Reverse, &reverse)] {
                    let probe = probe.as_bytes();
                    for (start, window) in contig.sequence.windows(probe.len()).enumerate() {
                        let mismatches = window.iter().zip(probe).filter(|(a, b)| a != b).count();
                        if mismatches <= 2 {
                            hits.push(SearchHit {
                                query: *query,
                                contig: contig.name.clone(),
                                span: Span::with_len(start, probe.len()),
                                strand,
                                query_span: Span::new(0, probe.len()),
                                mismatches,
                                gap_opens: 0,
                                evalue: 1e-10,
                                bitscore: 60.0,
                            });
                        }
                    }
                }
            }
        }
        Ok(hits)
    }
}

pub struct PassThroughAligner;

impl MultipleAligner for PassThroughAligner {
    fn align(&self, sequences: &[String]) -> Result<Vec<String>, ToolError> {
        Ok(sequences.to_vec())
    }
}

pub struct OneGene;

impl GeneAnnotation for OneGene {
    fn genes(&self, _genome: &str) -> Result<Option<Vec<Gene>>, ToolError> {
        Ok(Some(vec![Gene {
            id: "chr1_7".to_string(),
            contig: CONTIG.to_string(),
            span: Span::new(5_900, 6_300),
            strand: Strand::Forward,
        }]))
    }
}

/// Type I-E genes upstream of the array
pub fn cas_table() -> CasHitTable {
    let gene = |family: &str, start: usize| CasGeneHit {
        family: family.to_string(),
        contig: CONTIG.to_string(),
        span: Span::with_len(start, 300),
        strand: Strand::Forward,
        score: 150.0,
        id: None,
    };
    CasHitTable::new(vec![
        gene("Cse1", 200),
        gene("Cse2", 600),
        gene("Cas7", 1_000),
        gene("Cas1", 1_400),
    ])
}

pub fn toolkit() -> Toolkit {
    let mut islands = IslandTable::default();
    islands.insert(CONTIG, vec![Span::new(8_500, 9_500)]);
    Toolkit {
        repeat_finder: Box::new(FixedArrayFinder),
        search: Box::new(HammingSearch),
        aligner: Box::new(PassThroughAligner),
        cas_genes: Some(Box::new(cas_table())),
        repeat_model: Box::new(NoRepeatModel),
        prophage: Some(Box::new(islands)),
        annotation: Some(Box::new(OneGene)),
    }
}

pub fn config() -> SearchConfig {
    SearchConfig {
        threads: 2,
        ..SearchConfig::default()
    }
}


pub fn write_fasta(dir: &TempDir, file: &str, contigs: &[(&str, Vec<u8>)]) -> PathBuf {
    let path = dir.path().join(file);
    let records: Vec<(&str, &[u8])> = contigs.iter().map(|(name, seq)| (*name, seq.as_slice())).collect();
    write_fasta_file(&path, &records).unwrap();
    path
}
