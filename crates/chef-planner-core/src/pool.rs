use serde::Serialize;
use tracing::debug;

use crate::compat::{CompatibilityIndex, NEUTRAL_MATCH};
use crate::rules::admits_candidate;
use crate::types::{Ingredient, IngredientCatalog, Segment, Template};

/// Weight of direct anchor compatibility relative to segment tag alignment.
pub const ANCHOR_MATCH_WEIGHT: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub name: String,
    pub anchor_match: f64,
    pub segment_score: u32,
    pub total_score: f64,
}

/// Scores every catalog ingredient other than the anchor against the anchor
/// and the segment's preferred tags, dropping those the template forbids.
/// Highest `total_score` first; ties keep catalog order.
pub fn build_candidate_pool(
    template: &Template,
    anchor: &Ingredient,
    segment: &Segment,
    catalog: &IngredientCatalog,
    index: &CompatibilityIndex,
) -> Vec<Candidate> {
    let preferred = segment.preferred_tags();

    let mut pool: Vec<Candidate> = catalog
        .iter()
        .filter(|i| i.name != anchor.name)
        .filter(|i| admits_candidate(template, i))
        .map(|i| {
            let anchor_match = f64::from(
                index
                    .edge(&anchor.name, &i.name)
                    .unwrap_or(NEUTRAL_MATCH),
            );
            let segment_score = i
                .tags
                .iter()
                .filter(|t| preferred.contains(t.as_str()))
                .count();
            let segment_score = u32::try_from(segment_score).unwrap_or(u32::MAX);
            Candidate {
                name: i.name.clone(),
                anchor_match,
                segment_score,
                total_score: anchor_match.mul_add(ANCHOR_MATCH_WEIGHT, f64::from(segment_score)),
            }
        })
        .collect();

    pool.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));

    debug!(
        template = %template.name,
        anchor = %anchor.name,
        candidates = pool.len(),
        "candidate pool built"
    );
    pool
}
