use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::array::{assemble, refine, resolve_overlaps, ArrayOutcome, RefinedArray};
use crate::config::SearchConfig;
use crate::core::{ArrayId, Genome, StsRecord};
use crate::external::Toolkit;
use crate::locus::{analyze_locus, LocusAnalysis, LocusSources};
use crate::masking::mask_genome;
use crate::pipeline::{lookup_prophage, PipelineError};
use crate::targeting::{annotate_hit, match_targets, target_context, Footprint, HitAnnotation};

/// Counts reported per genome
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenomeStats {
    pub contigs: usize,
    /// Candidate arrays reported by the repeat-finder
    pub arrays: usize,
    pub valid_arrays: usize,
    /// Hits surviving the array-footprint filter
    pub targets: usize,
    /// Targets discarded as unannotated repeat copies
    pub repeat_copies: usize,
    pub records: usize,
}

/// Everything produced for one genome
#[derive(Debug, Clone)]
pub struct GenomeReport {
    pub genome: String,
    pub arrays: Vec<ArrayOutcome>,
    pub records: Vec<StsRecord>,
    pub stats: GenomeStats,
}

/// Find and refine the arrays of a genome, in detection order
fn detect_arrays(
    genome: &Genome,
    toolkit: &Toolkit,
    config: &SearchConfig,
) -> Result<Vec<ArrayOutcome>, PipelineError> {
    let masked = mask_genome(genome, &config.masking);
    let by_contig: HashMap<&str, usize> = masked
        .iter()
        .enumerate()
        .map(|(i, m)| (m.contig.name.as_str(), i))
        .collect();

    let mut candidates = Vec::new();
    for contig in &masked {
        for raw in toolkit
            .repeat_finder
            .find_arrays(&contig.contig.name, &contig.masked.masked)?
        {
            let id = ArrayId(candidates.len() + 1);
            candidates.push(assemble(&raw, id, contig)?);
        }
    }

    let (kept, overlapping) = resolve_overlaps(candidates);
    let mut outcomes: Vec<ArrayOutcome> = overlapping
        .into_iter()
        .map(|(array, reason)| {
            tracing::debug!(array = %array.id, %reason, "Rejected array");
            ArrayOutcome::Rejected { array, reason }
        })
        .collect();
    for array in kept {
        // assembled arrays always sit on a masked contig
        let Some(&i) = by_contig.get(array.contig.as_str()) else {
            continue;
        };
        outcomes.push(refine(array, &masked[i], toolkit.aligner.as_ref(), config)?);
    }
    outcomes.sort_by_key(|o| o.array().id);
    Ok(outcomes)
}

/// Run the full pipeline on one genome.
///
/// # Errors
///
/// Returns `PipelineError` if an external tool fails or its output describes
/// arrays that do not fit the genome. Missing evidence is never an error.
pub fn process_genome(
    genome: &Genome,
    toolkit: &Toolkit,
    config: &SearchConfig,
) -> Result<GenomeReport, PipelineError> {
    let span = tracing::info_span!("genome", name = %genome.name);
    let _enter = span.enter();

    let arrays = detect_arrays(genome, toolkit, config)?;
    let footprints: Vec<Footprint> = arrays.iter().map(|o| Footprint::from(o.array())).collect();
    let by_id: HashMap<ArrayId, &RefinedArray> = arrays
        .iter()
        .filter_map(|o| match o {
            ArrayOutcome::Valid(r) => Some((r.array.id, r)),
            ArrayOutcome::Rejected { .. } => None,
        })
        .collect();

    let mut stats = GenomeStats {
        contigs: genome.contigs.len(),
        arrays: arrays.len(),
        valid_arrays: by_id.len(),
        ..GenomeStats::default()
    };
    tracing::info!(arrays = stats.arrays, valid = stats.valid_arrays, "Detected CRISPR arrays");

    if by_id.is_empty() {
        return Ok(GenomeReport {
            genome: genome.name.clone(),
            arrays,
            records: Vec::new(),
            stats,
        });
    }

    let mut valid: Vec<&RefinedArray> = by_id.values().copied().collect();
    valid.sort_by_key(|r| r.array.id);
    let queries: Vec<_> = valid
        .iter()
        .flat_map(|r| r.array.spacer_refs())
        .map(|(spacer_ref, spacer)| (spacer_ref, spacer.sequence.clone()))
        .collect();
    let hits = toolkit.search.search(&queries, genome)?;

    let valid_arrays: Vec<&_> = valid.iter().map(|r| &r.array).collect();
    let targets = match_targets(hits, &valid_arrays, &footprints, genome, &config.matching);
    stats.targets = targets.len();

    let genes = match &toolkit.annotation {
        Some(annotation) => annotation.genes(&genome.name)?,
        None => None,
    };
    let genome_contigs: Vec<String> = genome.contigs.iter().map(|c| c.name.clone()).collect();
    let sources = LocusSources {
        cas_genes: toolkit.cas_genes.as_deref(),
        repeat_model: toolkit.repeat_model.as_ref(),
    };

    let mut loci: HashMap<ArrayId, LocusAnalysis> = HashMap::new();
    let mut records = Vec::new();
    for hit in targets {
        let (Some(refined), Some(contig)) = (by_id.get(&hit.spacer.array), genome.contig(&hit.contig))
        else {
            continue;
        };
        let Some(spacer) = refined.array.spacer(hit.spacer.spacer) else {
            continue;
        };

        let analysis = match loci.get(&refined.array.id) {
            Some(analysis) => analysis.clone(),
            None => {
                let analysis = analyze_locus(
                    &genome.name,
                    &genome_contigs,
                    &refined.array,
                    &refined.consensus,
                    sources,
                    &config.locus,
                )?;
                loci.insert(refined.array.id, analysis.clone());
                analysis
            }
        };

        let mutation = match annotate_hit(
            &hit,
            &refined.array,
            spacer,
            &refined.consensus,
            contig,
            analysis.orientation.orientation.effective_strand(),
            &config.annotation,
        ) {
            HitAnnotation::Annotated(mutation) => mutation,
            HitAnnotation::RepeatCopy => {
                stats.repeat_copies += 1;
                continue;
            }
        };

        let context = target_context(genes.as_deref(), &hit.contig, &mutation.target_span);
        let mut record = StsRecord {
            genome: genome.name.clone(),
            hit,
            array: refined.array.clone(),
            consensus: refined.consensus.clone(),
            orientation: analysis.orientation,
            mutation,
            locus: analysis.locus,
            target_context: context,
            prophage: None,
        };
        if let Some(service) = &toolkit.prophage {
            record.prophage = lookup_prophage(service.as_ref(), &record);
        }
        records.push(record);
    }

    stats.records = records.len();
    tracing::info!(
        targets = stats.targets,
        records = stats.records,
        repeat_copies = stats.repeat_copies,
        "Annotated self-targeting spacers"
    );

    Ok(GenomeReport {
        genome: genome.name.clone(),
        arrays,
        records,
        stats,
    })
}
