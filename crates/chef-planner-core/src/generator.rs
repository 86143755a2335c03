use std::collections::BTreeMap;

use rand::Rng;
use tracing::{debug, warn};

use crate::compat::CompatibilityIndex;
use crate::error::PlannerError;
use crate::pool::{build_candidate_pool, Candidate};
use crate::rules::{check_anchor, CARB_TAGS};
use crate::types::{
    FlavorProfile, IngredientCatalog, Role, Segment, Style, Template, TemplateCategory,
};
use crate::variant::RecipeVariant;

const FAT_TAGS: &[&str] = &["Oil", "Butter", "Fat"];
const CHEESE_TAGS: &[&str] = &["Cheese"];
const SEASONING_TAGS: &[&str] = &["Herbs", "Spices", "Seasoning", "Condiment"];
const MAX_SEASONINGS: usize = 2;

/// Inclusive ingredient-count range (anchor included) for a template category.
pub const fn ingredient_range(category: TemplateCategory) -> (usize, usize) {
    match category {
        TemplateCategory::PastaRice => (6, 12),
        TemplateCategory::Meat | TemplateCategory::Fish => (5, 10),
        TemplateCategory::Vegetarian => (4, 8),
        TemplateCategory::Dessert => (5, 9),
        TemplateCategory::Burger => (4, 7),
    }
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Upper bound on styles per request.
    pub max_styles: usize,
    /// Target count never exceeds `min + count_spread`.
    pub count_spread: usize,
    /// Candidate window offset per variant index.
    pub style_offset: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_styles: Style::ALL.len(),
            count_spread: 4,
            style_offset: 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VariantRequest<'a> {
    pub segment: &'a Segment,
    pub section: &'a str,
    pub template: &'a Template,
    pub anchor: &'a str,
    pub styles: usize,
}

#[derive(Debug, Clone)]
pub struct Generation {
    pub variants: Vec<RecipeVariant>,
    /// Soft template warning (e.g. carb template with a non-carb anchor).
    pub advisory: Option<String>,
}

pub struct VariantGenerator<'a> {
    catalog: &'a IngredientCatalog,
    index: &'a CompatibilityIndex,
    config: GeneratorConfig,
}

impl<'a> VariantGenerator<'a> {
    pub fn new(catalog: &'a IngredientCatalog, index: &'a CompatibilityIndex) -> Self {
        Self::with_config(catalog, index, GeneratorConfig::default())
    }

    pub const fn with_config(
        catalog: &'a IngredientCatalog,
        index: &'a CompatibilityIndex,
        config: GeneratorConfig,
    ) -> Self {
        Self {
            catalog,
            index,
            config,
        }
    }

    /// Generates up to `request.styles` variants in the fixed style order
    /// classico, fresco, umami. Fails before sampling anything when the
    /// anchor is unknown or breaks the template's diet rule.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        request: &VariantRequest<'_>,
        rng: &mut R,
    ) -> Result<Generation, PlannerError> {
        let anchor = self
            .catalog
            .get(request.anchor)
            .ok_or_else(|| PlannerError::AnchorNotFound {
                anchor: request.anchor.to_string(),
            })?;

        let advisory =
            check_anchor(request.template, anchor).into_result(&request.template.name)?;
        if let Some(message) = &advisory {
            warn!(template = %request.template.name, anchor = %anchor.name, "{message}");
        }

        let pool = build_candidate_pool(
            request.template,
            anchor,
            request.segment,
            self.catalog,
            self.index,
        );

        let styles = request.styles.min(self.config.max_styles);
        let mut variants = Vec::with_capacity(styles);
        for (variant_index, style) in Style::ALL.into_iter().take(styles).enumerate() {
            variants.push(self.single_variant(
                request.template,
                &anchor.name,
                &pool,
                style,
                variant_index,
                rng,
            )?);
        }

        debug!(
            section = request.section,
            segment = %request.segment.name,
            variants = variants.len(),
            "variants generated"
        );
        Ok(Generation { variants, advisory })
    }

    fn single_variant<R: Rng + ?Sized>(
        &self,
        template: &Template,
        anchor: &str,
        pool: &[Candidate],
        style: Style,
        variant_index: usize,
        rng: &mut R,
    ) -> Result<RecipeVariant, PlannerError> {
        let (min, max) = ingredient_range(template.category);
        let upper = max.min(min + self.config.count_spread);
        let target_count = rng.gen_range(min..=upper);
        let needed = target_count.saturating_sub(1);

        let style_pool = self.style_pool(pool, style, needed);
        let start = variant_index * self.config.style_offset;
        let mut window: Vec<&Candidate> = style_pool.into_iter().skip(start).take(needed * 3).collect();
        if window.len() < needed {
            window = pool.iter().take(needed * 2).collect();
        }

        let mut selected = vec![anchor.to_string()];
        selected.extend(weighted_sample(&window, needed, rng));

        let mut flavor_profile = FlavorProfile::default();
        for ingredient in selected.iter().filter_map(|n| self.catalog.get(n)) {
            flavor_profile.accumulate(&ingredient.flavor);
        }

        let compatibility_avg = self.index.average_match(&selected);
        let triangles = self.index.count_triangles(&selected);
        let roles = assign_roles(template, anchor, selected.get(1..).unwrap_or_default(), self.catalog);
        let notes = format!(
            "Variant {style}: {} ingredients, average compatibility {compatibility_avg:.1}, {triangles} triangles",
            selected.len()
        );

        debug!(
            %style,
            target_count,
            selected = selected.len(),
            compatibility_avg,
            triangles,
            "variant assembled"
        );

        RecipeVariant::from_parts(
            selected,
            roles,
            flavor_profile,
            compatibility_avg,
            triangles,
            notes,
            style,
        )
    }

    /// Narrows the pool to the style's preferred tags, falling back to the
    /// whole pool when the narrowed one is too thin.
    fn style_pool<'p>(&self, pool: &'p [Candidate], style: Style, needed: usize) -> Vec<&'p Candidate> {
        let preferred = style.preferred_tags();
        if preferred.is_empty() {
            return pool.iter().collect();
        }
        let narrowed: Vec<&Candidate> = pool
            .iter()
            .filter(|c| {
                self.catalog
                    .get(&c.name)
                    .is_some_and(|i| i.has_any_tag(preferred))
            })
            .collect();
        if narrowed.len() < needed / 2 {
            pool.iter().collect()
        } else {
            narrowed
        }
    }
}

/// Draws up to `count` names without replacement, weighted by `total_score`.
fn weighted_sample<R: Rng + ?Sized>(window: &[&Candidate], count: usize, rng: &mut R) -> Vec<String> {
    let mut names: Vec<&str> = window.iter().map(|c| c.name.as_str()).collect();
    let mut weights: Vec<f64> = window.iter().map(|c| c.total_score).collect();
    let draws = count.min(names.len());
    let mut chosen = Vec::with_capacity(draws);

    for _ in 0..draws {
        let total: f64 = weights.iter().sum();
        let mut pick = 0;
        if total > 0.0 {
            let roll = rng.gen::<f64>() * total;
            let mut cumulative = 0.0;
            for (i, w) in weights.iter().enumerate() {
                cumulative += w;
                if roll <= cumulative {
                    pick = i;
                    break;
                }
            }
        }
        if pick >= names.len() {
            break;
        }
        chosen.push(names.remove(pick).to_string());
        weights.remove(pick);
    }
    chosen
}

/// Greedy first-match role assignment in selection order: hero, then one
/// base (carb templates only), one fat, one cheese, up to two seasonings;
/// everything else is a complement.
pub fn assign_roles(
    template: &Template,
    hero: &str,
    others: &[String],
    catalog: &IngredientCatalog,
) -> BTreeMap<String, Role> {
    let mut roles = BTreeMap::new();
    roles.insert(hero.to_string(), Role::Hero);

    let mut remaining: Vec<&String> = others.iter().collect();
    let mut claim = |tags: &[&str]| -> Option<String> {
        let pos = remaining
            .iter()
            .position(|n| catalog.get(n).is_some_and(|i| i.has_any_tag(tags)))?;
        Some(remaining.remove(pos).clone())
    };

    let mut claimed = Vec::new();
    if template.is_carb() {
        claimed.extend(claim(CARB_TAGS).map(|n| (n, Role::Base)));
    }
    claimed.extend(claim(FAT_TAGS).map(|n| (n, Role::Fat)));
    claimed.extend(claim(CHEESE_TAGS).map(|n| (n, Role::Cheese)));
    for _ in 0..MAX_SEASONINGS {
        match claim(SEASONING_TAGS) {
            Some(n) => claimed.push((n, Role::Seasoning)),
            None => break,
        }
    }

    roles.extend(claimed);
    for name in remaining {
        roles.insert(name.clone(), Role::Complement);
    }
    roles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compat::MatchEdge;
    use crate::types::{DietRule, Ingredient, Tier};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn catalog() -> IngredientCatalog {
        IngredientCatalog::new([
            Ingredient::new("Spaghetti")
                .with_tags(["Pasta", "Carbs"])
                .with_cost(Tier::Normal, 0.5, 1),
            Ingredient::new("Olive Oil").with_tags(["Oil", "Fat"]),
            Ingredient::new("Butter").with_tags(["Butter", "Fat"]),
            Ingredient::new("Parmesan").with_tags(["Cheese"]),
            Ingredient::new("Basil").with_tags(["Herbs"]),
            Ingredient::new("Oregano").with_tags(["Herbs"]),
            Ingredient::new("Chili").with_tags(["Spices"]),
            Ingredient::new("Tomato").with_tags(["Tomato", "Vegetables"]),
            Ingredient::new("Garlic").with_tags(["Garlic"]),
            Ingredient::new("Lemon").with_tags(["Citrus", "Acid"]),
            Ingredient::new("Mushroom").with_tags(["Mushroom"]),
            Ingredient::new("Pancetta").with_tags(["Meat"]),
            Ingredient::new("Zucchini").with_tags(["Vegetables"]),
            Ingredient::new("Rice").with_tags(["Rice", "Carbs"]),
        ])
    }

    fn pasta() -> Template {
        Template::new("Pasta", TemplateCategory::PastaRice, 0, DietRule::Carb)
    }

    fn strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn roles_follow_priority_order() {
        let others = strings(&["Rice", "Olive Oil", "Butter", "Parmesan", "Basil", "Oregano", "Chili", "Tomato"]);
        let roles = assign_roles(&pasta(), "Spaghetti", &others, &catalog());

        assert_eq!(roles.get("Spaghetti"), Some(&Role::Hero));
        assert_eq!(roles.get("Rice"), Some(&Role::Base));
        assert_eq!(roles.get("Olive Oil"), Some(&Role::Fat));
        assert_eq!(roles.get("Butter"), Some(&Role::Complement));
        assert_eq!(roles.get("Parmesan"), Some(&Role::Cheese));
        assert_eq!(roles.get("Basil"), Some(&Role::Seasoning));
        assert_eq!(roles.get("Oregano"), Some(&Role::Seasoning));
        assert_eq!(roles.get("Chili"), Some(&Role::Complement));
        assert_eq!(roles.len(), others.len() + 1);
    }

    #[test]
    fn base_role_only_for_carb_templates() {
        let burger = Template::new("Veggie Burger", TemplateCategory::Burger, 0, DietRule::Vegetarian);
        let roles = assign_roles(&burger, "Zucchini", &strings(&["Rice"]), &catalog());
        assert_eq!(roles.get("Rice"), Some(&Role::Complement));
    }

    #[test]
    fn generation_is_reproducible_with_seed() {
        let catalog = catalog();
        let index = CompatibilityIndex::build(&[
            MatchEdge::new("Spaghetti", "Tomato", 3),
            MatchEdge::new("Spaghetti", "Basil", 2),
            MatchEdge::new("Tomato", "Basil", 3),
        ]);
        let generator = VariantGenerator::new(&catalog, &index);
        let segment = Segment::new("Families");
        let template = pasta();
        let request = VariantRequest {
            segment: &segment,
            section: "MainCourse",
            template: &template,
            anchor: "Spaghetti",
            styles: 5,
        };

        let first = generator.generate(&request, &mut StdRng::seed_from_u64(7));
        let second = generator.generate(&request, &mut StdRng::seed_from_u64(7));
        let (Ok(first), Ok(second)) = (first, second) else {
            panic!("generation failed");
        };

        assert_eq!(first.variants, second.variants);
        assert_eq!(first.variants.len(), 3, "style count is capped at three");
        let styles: Vec<Style> = first.variants.iter().map(RecipeVariant::style).collect();
        assert_eq!(styles, vec![Style::Classico, Style::Fresco, Style::Umami]);
        assert!(first.advisory.is_none());

        for variant in &first.variants {
            assert_eq!(variant.hero(), "Spaghetti");
            assert_eq!(variant.role("Spaghetti"), Some(Role::Hero));
            assert!((6..=10).contains(&variant.len()));
            let mut unique = variant.ingredients().to_vec();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), variant.len(), "sampling is without replacement");
        }
    }

    #[test]
    fn unknown_anchor_fails() {
        let catalog = catalog();
        let index = CompatibilityIndex::default();
        let segment = Segment::new("Families");
        let template = pasta();
        let out = VariantGenerator::new(&catalog, &index).generate(
            &VariantRequest {
                segment: &segment,
                section: "MainCourse",
                template: &template,
                anchor: "Truffle",
                styles: 1,
            },
            &mut StdRng::seed_from_u64(1),
        );
        assert!(matches!(out, Err(PlannerError::AnchorNotFound { .. })));
    }

    #[test]
    fn small_pool_caps_selection() {
        let catalog = IngredientCatalog::new([
            Ingredient::new("Salmon").with_tags(["Seafood"]),
            Ingredient::new("Lemon").with_tags(["Citrus"]),
        ]);
        let index = CompatibilityIndex::default();
        let segment = Segment::new("Anyone");
        let template = Template::new("Grilled Fish", TemplateCategory::Fish, 0, DietRule::Fish);
        let out = VariantGenerator::new(&catalog, &index).generate(
            &VariantRequest {
                segment: &segment,
                section: "MainCourse",
                template: &template,
                anchor: "Salmon",
                styles: 2,
            },
            &mut StdRng::seed_from_u64(3),
        );
        let Ok(out) = out else {
            panic!("generation failed");
        };
        for variant in &out.variants {
            assert_eq!(variant.ingredients(), &strings(&["Salmon", "Lemon"])[..]);
            assert_eq!(variant.triangles(), 0);
        }
    }

    fn fixed_count() -> GeneratorConfig {
        GeneratorConfig {
            count_spread: 0,
            ..GeneratorConfig::default()
        }
    }

    fn fresco_variant(
        catalog: &IngredientCatalog,
        index: &CompatibilityIndex,
        template: &Template,
        anchor: &str,
    ) -> RecipeVariant {
        let segment = Segment::new("Anyone");
        let out = VariantGenerator::with_config(catalog, index, fixed_count()).generate(
            &VariantRequest {
                segment: &segment,
                section: "MainCourse",
                template,
                anchor,
                styles: 2,
            },
            &mut StdRng::seed_from_u64(5),
        );
        let Ok(mut out) = out else {
            panic!("generation failed");
        };
        let Some(fresco) = out.variants.pop() else {
            panic!("no fresco variant");
        };
        assert_eq!(fresco.style(), Style::Fresco);
        fresco
    }

    #[test]
    fn fresco_draws_from_its_tags_after_the_offset() {
        let catalog = IngredientCatalog::new([
            Ingredient::new("Beef").with_tags(["Meat"]),
            Ingredient::new("Cheddar").with_tags(["Cheese"]),
            Ingredient::new("Bacon").with_tags(["Meat"]),
            Ingredient::new("Lemon").with_tags(["Citrus"]),
            Ingredient::new("Lime").with_tags(["Citrus"]),
            Ingredient::new("Basil").with_tags(["Herbs"]),
            Ingredient::new("Mint").with_tags(["Herbs"]),
            Ingredient::new("Lettuce").with_tags(["Vegetables"]),
        ]);
        let index = CompatibilityIndex::build(&[
            MatchEdge::new("Beef", "Cheddar", 5),
            MatchEdge::new("Beef", "Bacon", 5),
            MatchEdge::new("Beef", "Lemon", 5),
            MatchEdge::new("Beef", "Lime", 4),
            MatchEdge::new("Beef", "Basil", 3),
            MatchEdge::new("Beef", "Mint", 2),
            MatchEdge::new("Beef", "Lettuce", 2),
        ]);
        let template = Template::new("Hamburger", TemplateCategory::Burger, 0, DietRule::Neutral);

        // Four ingredients: hero plus three picks. The fresco pool is
        // Lemon, Lime, Basil, Mint, Lettuce; the second style skips two.
        let fresco = fresco_variant(&catalog, &index, &template, "Beef");
        for name in fresco.ingredients().iter().skip(1) {
            let tagged = catalog
                .get(name)
                .is_some_and(|i| i.has_any_tag(Style::Fresco.preferred_tags()));
            assert!(tagged, "{name} is not a fresco ingredient");
        }
        let mut picked = fresco.ingredients().to_vec();
        picked.sort();
        assert_eq!(picked, strings(&["Basil", "Beef", "Lettuce", "Mint"]));
    }

    #[test]
    fn thin_style_pool_falls_back_to_everything() {
        let catalog = IngredientCatalog::new([
            Ingredient::new("Salmon").with_tags(["Seafood"]),
            Ingredient::new("Lemon").with_tags(["Citrus"]),
            Ingredient::new("Potato").with_tags(["Potato"]),
            Ingredient::new("Butter").with_tags(["Butter", "Fat"]),
            Ingredient::new("Cheddar").with_tags(["Cheese"]),
            Ingredient::new("Rice").with_tags(["Rice", "Carbs"]),
            Ingredient::new("Pepper").with_tags(["Spices"]),
        ]);
        let index = CompatibilityIndex::build(&[
            MatchEdge::new("Salmon", "Lemon", 5),
            MatchEdge::new("Salmon", "Potato", 4),
            MatchEdge::new("Salmon", "Butter", 3),
            MatchEdge::new("Salmon", "Cheddar", 2),
            MatchEdge::new("Salmon", "Rice", 2),
            MatchEdge::new("Salmon", "Pepper", 2),
        ]);
        let template = Template::new("Grilled Fish", TemplateCategory::Fish, 0, DietRule::Fish);

        // Five ingredients need four picks; one fresco candidate is fewer
        // than half of that, so the whole pool is used, minus the top two.
        let fresco = fresco_variant(&catalog, &index, &template, "Salmon");
        let mut picked = fresco.ingredients().to_vec();
        picked.sort();
        assert_eq!(picked, strings(&["Butter", "Cheddar", "Pepper", "Rice", "Salmon"]));
    }
}
