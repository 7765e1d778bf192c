use crate::core::{Span, TargetContext};
use crate::external::Gene;

/// Place a target relative to the annotated genes of its contig.
///
/// `genes` is `None` when the genome has no annotation. Neighbours are
/// named in genomic order (lower coordinate first).
#[must_use]
pub fn target_context(genes: Option<&[Gene]>, contig: &str, target: &Span) -> TargetContext {
    let Some(genes) = genes else {
        return TargetContext::NotAnnotated;
    };
    let on_contig: Vec<&Gene> = genes.iter().filter(|g| g.contig == contig).collect();
    if on_contig.is_empty() {
        return TargetContext::NoFeatures;
    }
    if let Some(gene) = on_contig.iter().find(|g| g.span.overlaps(target)) {
        return TargetContext::Within {
            gene: gene.id.clone(),
        };
    }
    let upstream = on_contig
        .iter()
        .filter(|g| g.span.end <= target.start)
        .max_by_key(|g| g.span.end)
        .map(|g| g.id.clone());
    let downstream = on_contig
        .iter()
        .filter(|g| g.span.start >= target.end)
        .min_by_key(|g| g.span.start)
        .map(|g| g.id.clone());
    TargetContext::Between {
        upstream,
        downstream,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Strand;

    fn gene(id: &str, contig: &str, start: usize, end: usize) -> Gene {
        Gene {
            id: id.to_string(),
            contig: contig.to_string(),
            span: Span::new(start, end),
            strand: Strand::Forward,
        }
    }

    #[test]
    fn test_context() {
        let genes = vec![
            gene("c1_1", "c1", 100, 400),
            gene("c1_2", "c1", 600, 900),
            gene("c2_1", "c2", 0, 300),
        ];
        assert_eq!(
            target_context(Some(&genes), "c1", &Span::new(650, 680)),
            TargetContext::Within {
                gene: "c1_2".to_string()
            }
        );
        assert_eq!(
            target_context(Some(&genes), "c1", &Span::new(450, 480)),
            TargetContext::Between {
                upstream: Some("c1_1".to_string()),
                downstream: Some("c1_2".to_string())
            }
        );
        let edge = target_context(Some(&genes), "c1", &Span::new(950, 980));
        assert_eq!(edge.to_string(), "Between c1_2 & downstream contig edge");
        assert_eq!(
            target_context(Some(&genes), "c3", &Span::new(1, 2)),
            TargetContext::NoFeatures
        );
        assert_eq!(
            target_context(None, "c1", &Span::new(1, 2)),
            TargetContext::NotAnnotated
        );
    }
}
