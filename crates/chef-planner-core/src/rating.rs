use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{IngredientCatalog, Style, TemplateCategory, Tier};
use crate::variant::RecipeVariant;

/// Fixed per-recipe base score.
pub const BASE_EVALUATION: f64 = 10.0;
pub const PERK_CAP: f64 = 30.0;
pub const QUALITY_CAP: f64 = 20.0;
const STAR_DIVISOR: f64 = 20.0;
const TRIANGLE_CAP: usize = 3;

const VEGGIE_TAGS: &[&str] = &["Vegetables", "Herbs", "Legumes", "Salad", "Tomato"];
const AROMA_TAGS: &[&str] = &["Herbs", "Spices", "Garlic", "Onion", "Citrus", "Wine"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Perk {
    BalancedRecipe,
    SayCheese,
    VeggiesPower,
    ComplexAroma,
}

impl Perk {
    pub const fn label(self) -> &'static str {
        match self {
            Self::BalancedRecipe => "BalancedRecipe",
            Self::SayCheese => "SayCheese",
            Self::VeggiesPower => "VeggiesPower",
            Self::ComplexAroma => "ComplexAroma",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingBreakdown {
    pub evaluation_base: f64,
    pub perk_bonus: f64,
    pub quality_bonus: f64,
    pub compatibility_bonus: f64,
    pub complexity_tuning: f64,
    pub total_score: f64,
    pub stars: f64,
    pub active_perks: Vec<Perk>,
}

/// Ideal ingredient count range used by complexity tuning. Unknown
/// categories get a generic 6–8.
pub const fn ideal_range(category: Option<TemplateCategory>) -> (usize, usize) {
    match category {
        Some(TemplateCategory::PastaRice) => (8, 10),
        Some(TemplateCategory::Vegetarian) => (5, 7),
        Some(TemplateCategory::Burger) => (5, 6),
        Some(
            TemplateCategory::Meat | TemplateCategory::Fish | TemplateCategory::Dessert,
        )
        | None => (6, 8),
    }
}

/// Scores a priced variant. Ingredients missing from `tiers` count as NORMAL.
pub fn rate(
    variant: &RecipeVariant,
    tiers: &BTreeMap<String, Tier>,
    category: Option<TemplateCategory>,
    catalog: &IngredientCatalog,
    gourmet_segment: bool,
) -> RatingBreakdown {
    let (perk_bonus, active_perks) = perks(variant, catalog);
    let quality_bonus = quality_bonus(tiers);
    let compatibility_bonus =
        compatibility_bonus(variant.compatibility_avg(), variant.triangles());
    let complexity_tuning = complexity_tuning(variant.len(), category, gourmet_segment);

    let total_score =
        BASE_EVALUATION + perk_bonus + quality_bonus + compatibility_bonus + complexity_tuning;
    let stars = (total_score / STAR_DIVISOR).clamp(1.0, 5.0);

    RatingBreakdown {
        evaluation_base: BASE_EVALUATION,
        perk_bonus: round1(perk_bonus),
        quality_bonus: round1(quality_bonus),
        compatibility_bonus: round1(compatibility_bonus),
        complexity_tuning: round1(complexity_tuning),
        total_score: round1(total_score),
        stars: round1(stars),
        active_perks,
    }
}

fn perks(variant: &RecipeVariant, catalog: &IngredientCatalog) -> (f64, Vec<Perk>) {
    let selected: Vec<_> = variant
        .ingredients()
        .iter()
        .filter_map(|n| catalog.get(n))
        .collect();
    let mut bonus = 0.0;
    let mut active = Vec::new();

    if is_balanced(&variant.flavor_profile().active_values()) {
        bonus += 6.0;
        active.push(Perk::BalancedRecipe);
    }

    if selected.iter().any(|i| i.has_tag("Cheese")) {
        bonus += match variant.style() {
            Style::Classico | Style::Umami => 4.0,
            Style::Fresco => 2.0,
        };
        active.push(Perk::SayCheese);
    }

    // Share is measured against the full recipe, unknown names included.
    let veggies = selected.iter().filter(|i| i.has_any_tag(VEGGIE_TAGS)).count();
    let share = if variant.is_empty() {
        0.0
    } else {
        ratio(veggies, variant.len())
    };
    if share >= 0.3 {
        bonus += 5.0;
        active.push(Perk::VeggiesPower);
    } else if share >= 0.2 {
        bonus += 3.0;
        active.push(Perk::VeggiesPower);
    }

    let aromatics = selected.iter().filter(|i| i.has_any_tag(AROMA_TAGS)).count();
    if aromatics >= 4 {
        bonus += 7.0;
        active.push(Perk::ComplexAroma);
    } else if aromatics >= 3 {
        bonus += 5.0;
        active.push(Perk::ComplexAroma);
    }

    (f64::min(bonus, PERK_CAP), active)
}

/// At least three active axes, none above 2.5x the median active value.
fn is_balanced(active: &[u32]) -> bool {
    if active.len() < 3 {
        return false;
    }
    let mut sorted = active.to_vec();
    sorted.sort_unstable();
    let Some(&median) = sorted.get(sorted.len() / 2) else {
        return false;
    };
    let max = sorted.last().copied().unwrap_or(0);
    f64::from(max) <= f64::from(median) * 2.5
}

fn quality_bonus(tiers: &BTreeMap<String, Tier>) -> f64 {
    let sum: f64 = tiers.values().map(|t| t.quality_bonus()).sum();
    sum.min(QUALITY_CAP)
}

fn compatibility_bonus(avg_match: f64, triangles: usize) -> f64 {
    let triangle_points = ratio(triangles.min(TRIANGLE_CAP), 1);
    ((avg_match - 1.0) / 2.0)
        .mul_add(15.0, triangle_points)
        .max(0.0)
}

fn complexity_tuning(count: usize, category: Option<TemplateCategory>, gourmet: bool) -> f64 {
    let (low, high) = ideal_range(category);
    let center = ratio(low + high, 2);
    let deviation = (ratio(count, 1) - center).abs();
    let base = if deviation <= 1.0 {
        2.0
    } else if deviation <= 2.0 {
        0.0
    } else if deviation <= 3.0 {
        -2.0
    } else {
        -5.0
    };
    if gourmet {
        base + 1.0
    } else {
        base
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    numerator as f64 / denominator as f64
}

pub(crate) fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
