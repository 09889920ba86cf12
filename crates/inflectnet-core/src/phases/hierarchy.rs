//! Hierarchy coefficients: how well lower-resolution communities survive,
//! refined rather than scrambled, at higher resolutions.

use std::collections::{BTreeMap, HashMap};

use crate::config::PairSelection;
use crate::error::{AnalysisError, Result};
use crate::phases::communities::{LexemePartition, ResolutionLevel};

/// Coefficient for one (lower, higher) resolution pair.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyCoefficient {
    pub lower: f64,
    pub higher: f64,
    /// Mean over higher communities of the fraction of member pairs that were
    /// already together at the lower resolution.
    pub coefficient: f64,
    /// Higher communities with at least two lexemes.
    pub group_count: usize,
    pub lower_communities: usize,
    pub higher_communities: usize,
}

/// All coefficients of a sweep plus the pairs that had nothing to compare.
#[derive(Debug, Clone, Default)]
pub struct HierarchyAnalysis {
    pub coefficients: Vec<HierarchyCoefficient>,
    pub skipped: Vec<(f64, f64)>,
}

impl HierarchyAnalysis {
    pub fn get(&self, lower: f64, higher: f64) -> Option<&HierarchyCoefficient> {
        self.coefficients
            .iter()
            .find(|c| c.lower == lower && c.higher == higher)
    }
}

/// Coefficient of `higher` against `lower`.
///
/// Lexemes are grouped by their `higher` community; each group of `n >= 2`
/// scores the share of its `n(n-1)/2` pairs that were already co-members in
/// `lower`. The coefficient is the unweighted mean of group scores, so 1.0
/// means `higher` only splits `lower` communities and never joins across
/// them. A lexeme missing from `lower` pairs with nobody.
pub fn hierarchy_coefficient(
    lower: &LexemePartition,
    higher: &LexemePartition,
    lower_res: f64,
    higher_res: f64,
) -> Result<HierarchyCoefficient> {
    let mut groups: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
    for (lexeme, label) in higher.iter() {
        groups.entry(label).or_default().push(lexeme);
    }

    let mut scores = Vec::new();
    for members in groups.values() {
        let n = members.len();
        if n < 2 {
            continue;
        }
        // Pairs sharing a lower community = Σ C(count, 2) per lower label.
        let mut lower_counts: HashMap<usize, usize> = HashMap::new();
        for lexeme in members {
            if let Some(label) = lower.label(lexeme) {
                *lower_counts.entry(label).or_insert(0) += 1;
            }
        }
        let kept: usize = lower_counts.values().map(|&c| c * (c - 1) / 2).sum();
        let total = n * (n - 1) / 2;
        scores.push(kept as f64 / total as f64);
    }

    if scores.is_empty() {
        return Err(AnalysisError::NoComparablePairs {
            lower: lower_res,
            higher: higher_res,
        });
    }

    Ok(HierarchyCoefficient {
        lower: lower_res,
        higher: higher_res,
        coefficient: scores.iter().sum::<f64>() / scores.len() as f64,
        group_count: scores.len(),
        lower_communities: lower.community_count(),
        higher_communities: higher.community_count(),
    })
}

/// Coefficients across a resolution sweep.
///
/// Levels are sorted by resolution; `PairSelection::All` compares every pair
/// with lower < higher, `PairSelection::Adjacent` only neighbours. Pairs with
/// no comparable group are recorded in `skipped`.
pub fn analyze_hierarchy(levels: &[ResolutionLevel], pairs: PairSelection) -> HierarchyAnalysis {
    let mut sorted: Vec<&ResolutionLevel> = levels.iter().collect();
    sorted.sort_by(|a, b| a.resolution.total_cmp(&b.resolution));
    sorted.dedup_by(|a, b| a.resolution == b.resolution);

    let mut index_pairs = Vec::new();
    for i in 0..sorted.len() {
        match pairs {
            PairSelection::All => index_pairs.extend((i + 1..sorted.len()).map(|j| (i, j))),
            PairSelection::Adjacent if i + 1 < sorted.len() => index_pairs.push((i, i + 1)),
            PairSelection::Adjacent => {}
        }
    }

    let mut analysis = HierarchyAnalysis::default();
    for (i, j) in index_pairs {
        let (lower, higher) = (sorted[i], sorted[j]);
        match hierarchy_coefficient(
            &lower.partition,
            &higher.partition,
            lower.resolution,
            higher.resolution,
        ) {
            Ok(c) => analysis.coefficients.push(c),
            Err(e) => {
                log::warn!("Skipping hierarchy pair: {e}");
                analysis.skipped.push((lower.resolution, higher.resolution));
            }
        }
    }

    log::info!(
        "Computed {} hierarchy coefficients, skipped {} pairs",
        analysis.coefficients.len(),
        analysis.skipped.len()
    );
    analysis
}
