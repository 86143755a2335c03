use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::PlannerError;
use crate::types::{FlavorProfile, Role, Style, Tier};

/// A generated recipe. The hero (anchor) is always `ingredients[0]`, every
/// ingredient has exactly one role, and tiers only ever name selected
/// ingredients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeVariant {
    ingredients: Vec<String>,
    roles: BTreeMap<String, Role>,
    tiers: BTreeMap<String, Tier>,
    flavor_profile: FlavorProfile,
    compatibility_avg: f64,
    triangles: usize,
    notes: String,
    style: Style,
}

impl RecipeVariant {
    /// Assembles a variant from already-computed parts, checking the
    /// hero/role invariants.
    pub fn from_parts(
        ingredients: Vec<String>,
        roles: BTreeMap<String, Role>,
        flavor_profile: FlavorProfile,
        compatibility_avg: f64,
        triangles: usize,
        notes: impl Into<String>,
        style: Style,
    ) -> Result<Self, PlannerError> {
        let Some(hero) = ingredients.first() else {
            return Err(PlannerError::InvalidVariant(
                "a variant needs at least the hero ingredient".to_string(),
            ));
        };
        if roles.get(hero) != Some(&Role::Hero) {
            return Err(PlannerError::InvalidVariant(format!(
                "first ingredient '{hero}' must have the hero role"
            )));
        }
        if let Some((name, _)) = roles
            .iter()
            .filter(|(name, _)| *name != hero)
            .find(|(_, role)| **role == Role::Hero)
        {
            return Err(PlannerError::InvalidVariant(format!(
                "'{name}' claims the hero role but is not first"
            )));
        }
        if roles.len() != ingredients.len()
            || ingredients.iter().any(|name| !roles.contains_key(name))
        {
            return Err(PlannerError::InvalidVariant(
                "roles must cover exactly the selected ingredients".to_string(),
            ));
        }

        Ok(Self {
            ingredients,
            roles,
            tiers: BTreeMap::new(),
            flavor_profile,
            compatibility_avg,
            triangles,
            notes: notes.into(),
            style,
        })
    }

    pub fn hero(&self) -> &str {
        self.ingredients.first().map_or("", String::as_str)
    }

    pub fn ingredients(&self) -> &[String] {
        &self.ingredients
    }

    pub fn len(&self) -> usize {
        self.ingredients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty()
    }

    pub fn roles(&self) -> &BTreeMap<String, Role> {
        &self.roles
    }

    pub fn role(&self, ingredient: &str) -> Option<Role> {
        self.roles.get(ingredient).copied()
    }

    pub fn tiers(&self) -> &BTreeMap<String, Tier> {
        &self.tiers
    }

    /// Tier of `ingredient`, NORMAL until priced.
    pub fn tier(&self, ingredient: &str) -> Tier {
        self.tiers.get(ingredient).copied().unwrap_or(Tier::Normal)
    }

    /// Replaces the tier map. Entries for ingredients outside the recipe are dropped.
    pub fn set_tiers(&mut self, tiers: BTreeMap<String, Tier>) {
        self.tiers = tiers
            .into_iter()
            .filter(|(name, _)| self.roles.contains_key(name))
            .collect();
    }

    pub const fn flavor_profile(&self) -> &FlavorProfile {
        &self.flavor_profile
    }

    pub const fn compatibility_avg(&self) -> f64 {
        self.compatibility_avg
    }

    pub const fn triangles(&self) -> usize {
        self.triangles
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub const fn style(&self) -> Style {
        self.style
    }
}
