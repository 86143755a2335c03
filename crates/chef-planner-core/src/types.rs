use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Ingredient quality level. Ordered from cheapest to most expensive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    Normal,
    FirstChoice,
    Gourmet,
}

impl Tier {
    pub const ALL: [Self; 3] = [Self::Normal, Self::FirstChoice, Self::Gourmet];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::FirstChoice => "FIRST_CHOICE",
            Self::Gourmet => "GOURMET",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::FirstChoice => "First Choice",
            Self::Gourmet => "Gourmet",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "NORMAL" => Some(Self::Normal),
            "FIRST_CHOICE" | "FIRSTCHOICE" => Some(Self::FirstChoice),
            "GOURMET" => Some(Self::Gourmet),
            _ => None,
        }
    }

    /// Multiplier applied to the NORMAL unit cost when a tier has no cost entry.
    pub const fn cost_multiplier(self) -> f64 {
        match self {
            Self::Normal => 1.0,
            Self::FirstChoice => 1.5,
            Self::Gourmet => 2.5,
        }
    }

    /// Per-ingredient contribution to the rating quality bonus.
    pub const fn quality_bonus(self) -> f64 {
        match self {
            Self::Normal => 0.0,
            Self::FirstChoice => 0.7,
            Self::Gourmet => 1.4,
        }
    }

    pub const fn upgraded(self) -> Option<Self> {
        match self {
            Self::Normal => Some(Self::FirstChoice),
            Self::FirstChoice => Some(Self::Gourmet),
            Self::Gourmet => None,
        }
    }

    pub const fn downgraded(self) -> Option<Self> {
        match self {
            Self::Normal => None,
            Self::FirstChoice => Some(Self::Normal),
            Self::Gourmet => Some(Self::FirstChoice),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlavorAxis {
    Sour,
    Salt,
    Acid,
    Sweet,
    Fat,
    Umami,
}

impl FlavorAxis {
    pub const ALL: [Self; 6] = [
        Self::Sour,
        Self::Salt,
        Self::Acid,
        Self::Sweet,
        Self::Fat,
        Self::Umami,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Sour => "SOUR",
            Self::Salt => "SALT",
            Self::Acid => "ACID",
            Self::Sweet => "SWEET",
            Self::Fat => "FAT",
            Self::Umami => "UMAMI",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|axis| axis.label().eq_ignore_ascii_case(label.trim()))
    }
}

/// Intensity vector over the six fixed flavor axes. Missing axes are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorProfile {
    #[serde(rename = "SOUR", default)]
    pub sour: u32,
    #[serde(rename = "SALT", default)]
    pub salt: u32,
    #[serde(rename = "ACID", default)]
    pub acid: u32,
    #[serde(rename = "SWEET", default)]
    pub sweet: u32,
    #[serde(rename = "FAT", default)]
    pub fat: u32,
    #[serde(rename = "UMAMI", default)]
    pub umami: u32,
}

impl FlavorProfile {
    pub const fn get(&self, axis: FlavorAxis) -> u32 {
        match axis {
            FlavorAxis::Sour => self.sour,
            FlavorAxis::Salt => self.salt,
            FlavorAxis::Acid => self.acid,
            FlavorAxis::Sweet => self.sweet,
            FlavorAxis::Fat => self.fat,
            FlavorAxis::Umami => self.umami,
        }
    }

    pub fn set(&mut self, axis: FlavorAxis, value: u32) {
        let slot = match axis {
            FlavorAxis::Sour => &mut self.sour,
            FlavorAxis::Salt => &mut self.salt,
            FlavorAxis::Acid => &mut self.acid,
            FlavorAxis::Sweet => &mut self.sweet,
            FlavorAxis::Fat => &mut self.fat,
            FlavorAxis::Umami => &mut self.umami,
        };
        *slot = value;
    }

    pub fn with(mut self, axis: FlavorAxis, value: u32) -> Self {
        self.set(axis, value);
        self
    }

    /// Per-axis sum, saturating.
    pub fn accumulate(&mut self, other: &Self) {
        for axis in FlavorAxis::ALL {
            self.set(axis, self.get(axis).saturating_add(other.get(axis)));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (FlavorAxis, u32)> + '_ {
        FlavorAxis::ALL.into_iter().map(|axis| (axis, self.get(axis)))
    }

    pub fn active_axes(&self) -> Vec<FlavorAxis> {
        self.iter().filter(|(_, v)| *v > 0).map(|(axis, _)| axis).collect()
    }

    /// Values of the axes with a positive intensity, in axis order.
    pub fn active_values(&self) -> Vec<u32> {
        self.iter().map(|(_, v)| v).filter(|v| *v > 0).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityCost {
    pub unit_cost: f64,
    pub points_cost: u32,
}

impl QualityCost {
    pub const fn new(unit_cost: f64, points_cost: u32) -> Self {
        Self {
            unit_cost,
            points_cost,
        }
    }
}

const FALLBACK_UNIT_COST: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub flavor: FlavorProfile,
    #[serde(default)]
    pub quality_costs: BTreeMap<Tier, QualityCost>,
}

impl Ingredient {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: BTreeSet::new(),
            flavor: FlavorProfile::default(),
            quality_costs: BTreeMap::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_flavor(mut self, flavor: FlavorProfile) -> Self {
        self.flavor = flavor;
        self
    }

    pub fn with_cost(mut self, tier: Tier, unit_cost: f64, points_cost: u32) -> Self {
        self.quality_costs
            .insert(tier, QualityCost::new(unit_cost, points_cost));
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn has_any_tag(&self, tags: &[&str]) -> bool {
        tags.iter().any(|t| self.tags.contains(*t))
    }

    pub const fn flavor(&self, axis: FlavorAxis) -> u32 {
        self.flavor.get(axis)
    }

    /// Unit cost at `tier`. A missing tier entry is derived from the NORMAL
    /// cost and the tier multiplier; a missing NORMAL entry counts as 1.0.
    pub fn unit_cost(&self, tier: Tier) -> f64 {
        if let Some(cost) = self.quality_costs.get(&tier) {
            return cost.unit_cost;
        }
        let base = self
            .quality_costs
            .get(&Tier::Normal)
            .map_or(FALLBACK_UNIT_COST, |c| c.unit_cost);
        base * tier.cost_multiplier()
    }
}

/// Immutable, name-keyed ingredient catalog that preserves load order.
#[derive(Debug, Clone, Default)]
pub struct IngredientCatalog {
    ingredients: Vec<Ingredient>,
    by_name: HashMap<String, usize>,
}

impl IngredientCatalog {
    /// Builds the catalog. When a name repeats, the first occurrence wins.
    pub fn new(ingredients: impl IntoIterator<Item = Ingredient>) -> Self {
        let mut out = Self::default();
        for ingredient in ingredients {
            if out.by_name.contains_key(&ingredient.name) {
                continue;
            }
            out.by_name
                .insert(ingredient.name.clone(), out.ingredients.len());
            out.ingredients.push(ingredient);
        }
        out
    }

    pub fn get(&self, name: &str) -> Option<&Ingredient> {
        self.by_name
            .get(name)
            .and_then(|idx| self.ingredients.get(*idx))
    }

    /// Case-insensitive lookup, used for user-typed names.
    pub fn find_ignore_case(&self, name: &str) -> Option<&Ingredient> {
        if name.is_empty() {
            return None;
        }
        self.get(name).or_else(|| {
            self.ingredients
                .iter()
                .find(|i| i.name.eq_ignore_ascii_case(name))
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Ingredient> {
        self.ingredients.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.ingredients.iter().map(|i| i.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.ingredients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty()
    }
}

impl<'a> IntoIterator for &'a IngredientCatalog {
    type Item = &'a Ingredient;
    type IntoIter = std::slice::Iter<'a, Ingredient>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionInfo {
    pub probability: f64,
    pub cost_expectation: f64,
}

impl Default for SectionInfo {
    fn default() -> Self {
        Self {
            probability: 0.5,
            cost_expectation: 10.0,
        }
    }
}

/// Raw (not necessarily normalised) fit weights of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub tag: f64,
    pub price: f64,
    pub evaluation: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            tag: 0.33,
            price: 0.33,
            evaluation: 0.33,
        }
    }
}

impl ScoreWeights {
    /// Weights rescaled to sum to one; equal thirds when nothing is set.
    pub fn normalized(&self) -> Self {
        let total = self.tag + self.price + self.evaluation;
        if total > 0.0 {
            Self {
                tag: self.tag / total,
                price: self.price / total,
                evaluation: self.evaluation / total,
            }
        } else {
            Self {
                tag: 1.0 / 3.0,
                price: 1.0 / 3.0,
                evaluation: 1.0 / 3.0,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub name: String,
    #[serde(default)]
    pub favourite_tags: BTreeSet<String>,
    #[serde(default)]
    pub secondary_favourite_tags: BTreeSet<String>,
    #[serde(default)]
    pub weights: ScoreWeights,
    #[serde(default)]
    pub expectations: BTreeMap<String, f64>,
    #[serde(default)]
    pub sections: BTreeMap<String, SectionInfo>,
}

impl Segment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            favourite_tags: BTreeSet::new(),
            secondary_favourite_tags: BTreeSet::new(),
            weights: ScoreWeights::default(),
            expectations: BTreeMap::new(),
            sections: BTreeMap::new(),
        }
    }

    /// Section expectations: exact key, then lowercase key, else the neutral default.
    pub fn section(&self, name: &str) -> SectionInfo {
        self.sections
            .get(name)
            .or_else(|| self.sections.get(&name.to_lowercase()))
            .copied()
            .unwrap_or_default()
    }

    /// Union of favourite and secondary favourite tags.
    pub fn preferred_tags(&self) -> BTreeSet<&str> {
        self.favourite_tags
            .iter()
            .chain(self.secondary_favourite_tags.iter())
            .map(String::as_str)
            .collect()
    }

    pub fn has_preferences(&self) -> bool {
        !self.favourite_tags.is_empty()
            || !self.secondary_favourite_tags.is_empty()
            || !self.expectations.is_empty()
    }

    /// Gourmet-oriented: named so, or quality/tag driven with little price focus.
    pub fn is_gourmet(&self) -> bool {
        if self.name.is_empty() {
            return false;
        }
        if self.name.to_lowercase().contains("gourmet") {
            return true;
        }
        self.weights.evaluation >= 0.8 && self.weights.tag >= 0.7 && self.weights.price <= 0.3
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TemplateCategory {
    #[serde(rename = "Pasta & Rice")]
    PastaRice,
    Meat,
    Fish,
    Vegetarian,
    Dessert,
    Burger,
}

impl TemplateCategory {
    pub const ALL: [Self; 6] = [
        Self::PastaRice,
        Self::Meat,
        Self::Fish,
        Self::Vegetarian,
        Self::Dessert,
        Self::Burger,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::PastaRice => "Pasta & Rice",
            Self::Meat => "Meat",
            Self::Fish => "Fish",
            Self::Vegetarian => "Vegetarian",
            Self::Dessert => "Dessert",
            Self::Burger => "Burger",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(label.trim()))
    }
}

impl fmt::Display for TemplateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Hard (or advisory) constraint a template puts on its anchor ingredient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DietRule {
    /// Anchor must be tagged Seafood.
    Fish,
    /// Anchor must be tagged Meat.
    Meat,
    /// No Meat or Seafood, neither on the anchor nor in the candidate pool.
    Vegetarian,
    /// No Meat or Seafood on the anchor; complements are not filtered.
    Dessert,
    /// A Pasta/Rice/Carbs anchor is expected but not enforced.
    Carb,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub category: TemplateCategory,
    pub points: u32,
    pub rule: DietRule,
}

impl Template {
    pub fn new(
        name: impl Into<String>,
        category: TemplateCategory,
        points: u32,
        rule: DietRule,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            points,
            rule,
        }
    }

    pub fn is_carb(&self) -> bool {
        self.category == TemplateCategory::PastaRice
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Hero,
    Base,
    Fat,
    Cheese,
    Seasoning,
    Complement,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::Base => "base",
            Self::Fat => "fat",
            Self::Cheese => "cheese",
            Self::Seasoning => "seasoning",
            Self::Complement => "complement",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Hero => "Hero",
            Self::Base => "Base",
            Self::Fat => "Fats",
            Self::Cheese => "Cheese",
            Self::Seasoning => "Seasoning",
            Self::Complement => "Complement",
        }
    }

    /// Roles that are upgraded right after the hero.
    pub const fn is_premium(self) -> bool {
        matches!(self, Self::Fat | Self::Cheese | Self::Base)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    Classico,
    Fresco,
    Umami,
}

impl Style {
    /// Generation order; a request for `n` styles takes the first `n`.
    pub const ALL: [Self; 3] = [Self::Classico, Self::Fresco, Self::Umami];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Classico => "classico",
            Self::Fresco => "fresco",
            Self::Umami => "umami",
        }
    }

    /// Tags a style prefers when narrowing the candidate pool. Empty means no filter.
    pub const fn preferred_tags(self) -> &'static [&'static str] {
        match self {
            Self::Classico => &[],
            Self::Fresco => &["Acid", "Citrus", "Herbs", "Vegetables"],
            Self::Umami => &["Cheese", "Meat", "Mushroom", "Tomato", "Fat"],
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tier_cost_falls_back_to_normal_multiplier() {
        let ing = Ingredient::new("Basil").with_cost(Tier::Normal, 2.0, 1);
        assert!((ing.unit_cost(Tier::FirstChoice) - 3.0).abs() < 1e-9);
        assert!((ing.unit_cost(Tier::Gourmet) - 5.0).abs() < 1e-9);

        let bare = Ingredient::new("Salt");
        assert!((bare.unit_cost(Tier::Normal) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn catalog_keeps_first_duplicate() {
        let catalog = IngredientCatalog::new([
            Ingredient::new("Egg").with_tags(["Protein"]),
            Ingredient::new("Egg").with_tags(["Other"]),
        ]);
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("Egg").is_some_and(|i| i.has_tag("Protein")));
        assert!(catalog.find_ignore_case("egg").is_some());
    }

    #[test]
    fn section_lookup_defaults_when_missing() {
        let mut segment = Segment::new("Families");
        segment.sections.insert(
            "maincourse".to_string(),
            SectionInfo {
                probability: 1.0,
                cost_expectation: 14.0,
            },
        );
        assert!((segment.section("MainCourse").cost_expectation - 14.0).abs() < 1e-9);
        assert_eq!(segment.section("Dessert"), SectionInfo::default());
    }

    #[test]
    fn gourmet_heuristic_uses_name_or_weights() {
        assert!(Segment::new("Gourmet Lovers").is_gourmet());

        let mut critic = Segment::new("Critics");
        critic.weights = ScoreWeights {
            tag: 0.7,
            price: 0.2,
            evaluation: 0.9,
        };
        assert!(critic.is_gourmet());

        assert!(!Segment::new("Students").is_gourmet());
    }

    #[test]
    fn zero_weights_normalize_to_thirds() {
        let w = ScoreWeights {
            tag: 0.0,
            price: 0.0,
            evaluation: 0.0,
        }
        .normalized();
        assert!((w.tag - 1.0 / 3.0).abs() < 1e-9);
        assert!((w.tag + w.price + w.evaluation - 1.0).abs() < 1e-9);
    }
}
