use std::collections::{BTreeMap, BTreeSet};

use chef_planner_core::{
    collect_tags, FitBreakdown, IngredientCatalog, PricingResult, RatingBreakdown, RecipeVariant,
    Role, Style, Tier,
};
use serde::{Deserialize, Serialize};

/// Where an evaluated variant is being placed.
#[derive(Debug, Clone, Copy)]
pub struct Placement<'a> {
    pub template: &'a str,
    pub customer: &'a str,
    pub section: &'a str,
}

/// A dish on the menu: an evaluated variant frozen at the moment it was added.
/// Later changes to data or drafts do not reach it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub template: String,
    pub anchor: String,
    pub style: Style,
    pub ingredients: Vec<String>,
    pub roles: BTreeMap<String, Role>,
    pub tiers: BTreeMap<String, Tier>,
    pub cost: f64,
    pub price: f64,
    pub stars: f64,
    pub segment_fit: f64,
    #[serde(default)]
    pub fit_breakdown: Option<FitBreakdown>,
    pub customer: String,
    pub section: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl MenuItem {
    pub fn freeze(
        placement: &Placement<'_>,
        variant: &RecipeVariant,
        pricing: &PricingResult,
        rating: &RatingBreakdown,
        fit: &FitBreakdown,
        catalog: &IngredientCatalog,
    ) -> Self {
        Self {
            template: placement.template.to_string(),
            anchor: variant.hero().to_string(),
            style: variant.style(),
            ingredients: variant.ingredients().to_vec(),
            roles: variant.roles().clone(),
            tiers: pricing.tiers.clone(),
            cost: pricing.cost,
            price: pricing.suggested_price,
            stars: rating.stars,
            segment_fit: fit.total_fit,
            fit_breakdown: Some(*fit),
            customer: placement.customer.to_string(),
            section: placement.section.to_string(),
            notes: variant.notes().to_string(),
            tags: collect_tags(variant.ingredients(), catalog),
        }
    }

    /// Display name, e.g. "Grilled Fish with Salmon".
    pub fn name(&self) -> String {
        format!("{} with {}", self.template, self.anchor)
    }

    pub fn ingredient_count(&self) -> usize {
        self.ingredients.len()
    }

    pub fn style_title(&self) -> String {
        title_case(self.style.label())
    }
}

pub(crate) fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use chef_planner_core::{FlavorProfile, Ingredient, RecipeVariant};

    use super::*;

    fn variant() -> RecipeVariant {
        let roles = BTreeMap::from([
            ("Salmon".to_string(), Role::Hero),
            ("Lemon".to_string(), Role::Complement),
        ]);
        RecipeVariant::from_parts(
            vec!["Salmon".to_string(), "Lemon".to_string()],
            roles,
            FlavorProfile::default(),
            3.0,
            0,
            "Variant fresco",
            Style::Fresco,
        )
        .unwrap_or_else(|e| panic!("variant: {e}"))
    }

    #[test]
    fn freeze_copies_evaluation_results() {
        let catalog = IngredientCatalog::new([
            Ingredient::new("Salmon").with_tags(["Seafood", "Premium"]),
            Ingredient::new("Lemon").with_tags(["Citrus"]),
        ]);
        let pricing = PricingResult {
            tiers: BTreeMap::from([("Salmon".to_string(), Tier::Gourmet)]),
            cost: 9.5,
            suggested_price: 12.0,
        };
        let rating = RatingBreakdown {
            evaluation_base: 10.0,
            perk_bonus: 0.0,
            quality_bonus: 5.0,
            compatibility_bonus: 20.0,
            complexity_tuning: 0.0,
            total_score: 35.0,
            stars: 1.8,
            active_perks: Vec::new(),
        };
        let fit = FitBreakdown {
            price_fit: 100.0,
            tag_fit: 80.0,
            eval_fit: 36.0,
            total_fit: 72.0,
        };
        let placement = Placement {
            template: "Grilled Fish",
            customer: "Gourmet",
            section: "MainCourse",
        };

        let item = MenuItem::freeze(&placement, &variant(), &pricing, &rating, &fit, &catalog);
        assert_eq!(item.name(), "Grilled Fish with Salmon");
        assert_eq!(item.anchor, "Salmon");
        assert_eq!(item.ingredient_count(), 2);
        assert_eq!(item.style_title(), "Fresco");
        assert!((item.price - 12.0).abs() < 1e-9);
        assert!((item.segment_fit - 72.0).abs() < 1e-9);
        assert_eq!(
            item.tags.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["Citrus", "Premium", "Seafood"]
        );
        assert_eq!(item.tiers.get("Salmon"), Some(&Tier::Gourmet));
    }
}
