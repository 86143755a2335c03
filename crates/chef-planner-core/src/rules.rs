use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::PlannerError;
use crate::types::{DietRule, Ingredient, IngredientCatalog, Template};

pub const ANIMAL_TAGS: &[&str] = &["Meat", "Seafood"];
pub const CARB_TAGS: &[&str] = &["Pasta", "Rice", "Carbs"];

const SEARCH_LIMIT: usize = 20;

/// Outcome of checking an anchor ingredient against a template's diet rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum AnchorCheck {
    Compatible,
    /// Usable, but the caller should surface the message.
    Advisory(String),
    Violation(String),
}

impl AnchorCheck {
    pub const fn is_violation(&self) -> bool {
        matches!(self, Self::Violation(_))
    }

    /// Violations become errors; advisories are handed back.
    pub fn into_result(self, template: &str) -> Result<Option<String>, PlannerError> {
        match self {
            Self::Compatible => Ok(None),
            Self::Advisory(message) => Ok(Some(message)),
            Self::Violation(reason) => Err(PlannerError::TemplateViolation {
                template: template.to_string(),
                reason,
            }),
        }
    }
}

pub fn check_anchor(template: &Template, anchor: &Ingredient) -> AnchorCheck {
    let name = &template.name;
    match template.rule {
        DietRule::Fish if !anchor.has_tag("Seafood") => {
            AnchorCheck::Violation(format!("{name} requires an ingredient with 'Seafood' tag"))
        }
        DietRule::Meat if !anchor.has_tag("Meat") => {
            AnchorCheck::Violation(format!("{name} requires an ingredient with 'Meat' tag"))
        }
        DietRule::Vegetarian if anchor.has_any_tag(ANIMAL_TAGS) => AnchorCheck::Violation(
            format!("{name} (vegetarian) cannot use Meat or Seafood ingredients"),
        ),
        DietRule::Dessert if anchor.has_any_tag(ANIMAL_TAGS) => AnchorCheck::Violation(format!(
            "{name} (dessert) cannot use Meat or Seafood as main ingredient"
        )),
        DietRule::Carb if !anchor.has_any_tag(CARB_TAGS) => AnchorCheck::Advisory(format!(
            "{name} usually needs a pasta/rice base ingredient"
        )),
        _ => AnchorCheck::Compatible,
    }
}

/// Whether `candidate` may appear next to the anchor at all.
pub fn admits_candidate(template: &Template, candidate: &Ingredient) -> bool {
    match template.rule {
        DietRule::Vegetarian => !candidate.has_any_tag(ANIMAL_TAGS),
        _ => true,
    }
}

/// Union of the tags of the named ingredients. Unknown names are skipped.
pub fn collect_tags<S: AsRef<str>>(names: &[S], catalog: &IngredientCatalog) -> BTreeSet<String> {
    names
        .iter()
        .filter_map(|n| catalog.get(n.as_ref()))
        .flat_map(|i| i.tags.iter().cloned())
        .collect()
}

/// Ingredients carrying any of `required` and none of `forbidden`.
/// An empty list disables that side of the check.
pub fn filter_by_tags<'a>(
    catalog: &'a IngredientCatalog,
    required: &[&str],
    forbidden: &[&str],
) -> Vec<&'a Ingredient> {
    catalog
        .iter()
        .filter(|i| required.is_empty() || i.has_any_tag(required))
        .filter(|i| forbidden.is_empty() || !i.has_any_tag(forbidden))
        .collect()
}

/// Tag frequencies across the catalog, most frequent first.
pub fn tag_summary(catalog: &IngredientCatalog) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for tag in catalog.iter().flat_map(|i| i.tags.iter()) {
        if !tag.is_empty() {
            *counts.entry(tag.as_str()).or_default() += 1;
        }
    }
    let mut out: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(tag, n)| (tag.to_string(), n))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

/// Case-insensitive substring search over names, sorted, at most 20 hits.
pub fn search_ingredients(catalog: &IngredientCatalog, query: &str) -> Vec<String> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }
    let mut hits: Vec<String> = catalog
        .names()
        .filter(|n| n.to_lowercase().contains(&query))
        .map(str::to_string)
        .collect();
    hits.sort();
    hits.truncate(SEARCH_LIMIT);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TemplateCategory;

    fn fish() -> Template {
        Template::new("Grilled Fish", TemplateCategory::Fish, 0, DietRule::Fish)
    }

    #[test]
    fn fish_template_needs_seafood_anchor() {
        let salmon = Ingredient::new("Salmon").with_tags(["Seafood"]);
        let pasta = Ingredient::new("Pasta").with_tags(["Carbs"]);
        assert_eq!(check_anchor(&fish(), &salmon), AnchorCheck::Compatible);
        assert!(check_anchor(&fish(), &pasta).is_violation());
    }

    #[test]
    fn carb_template_only_advises() {
        let risotto = Template::new("Risotto", TemplateCategory::PastaRice, 15, DietRule::Carb);
        let mushroom = Ingredient::new("Porcini").with_tags(["Mushroom"]);
        let out = check_anchor(&risotto, &mushroom).into_result("Risotto");
        assert!(matches!(out, Ok(Some(ref msg)) if msg.contains("pasta/rice")));
    }

    #[test]
    fn dessert_checks_anchor_but_not_candidates() {
        let pie = Template::new("Pie", TemplateCategory::Dessert, 0, DietRule::Dessert);
        let bacon = Ingredient::new("Bacon").with_tags(["Meat"]);
        assert!(check_anchor(&pie, &bacon).is_violation());
        assert!(admits_candidate(&pie, &bacon));

        let salad = Template::new("Salad", TemplateCategory::Vegetarian, 0, DietRule::Vegetarian);
        assert!(!admits_candidate(&salad, &bacon));
    }

    #[test]
    fn tag_helpers() {
        let catalog = IngredientCatalog::new([
            Ingredient::new("Lemon").with_tags(["Citrus", "Acid"]),
            Ingredient::new("Lime").with_tags(["Citrus"]),
            Ingredient::new("Bacon").with_tags(["Meat", "Fat"]),
        ]);
        assert_eq!(tag_summary(&catalog).first(), Some(&("Citrus".to_string(), 2)));
        assert_eq!(
            collect_tags(&["Lemon", "Nope"], &catalog).len(),
            2,
            "unknown names are ignored"
        );
        assert_eq!(filter_by_tags(&catalog, &["Citrus"], &["Acid"]).len(), 1);
        assert_eq!(search_ingredients(&catalog, "LI"), vec!["Lime".to_string()]);
        assert!(search_ingredients(&catalog, "  ").is_empty());
    }
}
