use serde::{Deserialize, Serialize};

use crate::rating::round1;
use crate::rules::collect_tags;
use crate::types::{IngredientCatalog, Segment};
use crate::variant::RecipeVariant;

const NEUTRAL_FIT: f64 = 50.0;
const FAVOURITE_WEIGHT: f64 = 3.0;
const SECONDARY_WEIGHT: f64 = 2.0;
const EXPECTATION_WEIGHT: f64 = 2.0;

/// Segment fit percentages, each in 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitBreakdown {
    pub price_fit: f64,
    pub tag_fit: f64,
    pub eval_fit: f64,
    pub total_fit: f64,
}

pub fn segment_fit(
    stars: f64,
    segment: &Segment,
    section: &str,
    suggested_price: f64,
    variant: &RecipeVariant,
    catalog: &IngredientCatalog,
) -> FitBreakdown {
    let weights = segment.weights.normalized();
    let price = price_fit(suggested_price, segment.section(section).cost_expectation);
    let tags = tag_fit(segment, variant, catalog);
    let eval = stars / 5.0 * 100.0;
    let total = weights.evaluation.mul_add(eval, weights.price.mul_add(price, tags * weights.tag));

    FitBreakdown {
        price_fit: round1(price),
        tag_fit: round1(tags),
        eval_fit: round1(eval),
        total_fit: round1(total),
    }
}

/// Full marks within 5 % of the expectation, a linear slide to 70 at 15 %,
/// then one point per percent down to a floor of 20.
pub fn price_fit(price: f64, expectation: f64) -> f64 {
    if expectation <= 0.0 {
        return NEUTRAL_FIT;
    }
    let deviation = (price - expectation).abs() / expectation;
    if deviation <= 0.05 {
        100.0
    } else if deviation <= 0.15 {
        100.0 - (deviation - 0.05) / 0.10 * 30.0
    } else {
        (-(deviation - 0.15)).mul_add(100.0, 70.0).max(20.0)
    }
}

/// Weighted coverage of the segment's tag preferences by the recipe's tags.
/// Only preference groups the segment actually defines count towards the
/// maximum; with none at all the fit is neutral.
pub fn tag_fit(segment: &Segment, variant: &RecipeVariant, catalog: &IngredientCatalog) -> f64 {
    if !segment.has_preferences() {
        return NEUTRAL_FIT;
    }
    let recipe_tags = collect_tags(variant.ingredients(), catalog);
    let mut score = 0.0;
    let mut max = 0.0;

    for (group, weight) in [
        (&segment.favourite_tags, FAVOURITE_WEIGHT),
        (&segment.secondary_favourite_tags, SECONDARY_WEIGHT),
    ] {
        if group.is_empty() {
            continue;
        }
        let covered = group.intersection(&recipe_tags).count();
        score += coverage(covered, group.len()) * weight;
        max += weight;
    }

    if !segment.expectations.is_empty() {
        let expected: f64 = segment
            .expectations
            .iter()
            .filter(|(tag, _)| recipe_tags.contains(tag.as_str()))
            .map(|(_, w)| w.min(1.0))
            .sum();
        score += expected.min(EXPECTATION_WEIGHT);
        max += EXPECTATION_WEIGHT;
    }

    if max > 0.0 {
        score / max * 100.0
    } else {
        NEUTRAL_FIT
    }
}

#[allow(clippy::cast_precision_loss)]
fn coverage(covered: usize, total: usize) -> f64 {
    covered as f64 / total as f64
}
