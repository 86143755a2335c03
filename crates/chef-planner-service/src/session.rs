use std::collections::BTreeSet;

use chef_planner_catalog::{self as catalog, TemplateEntry, UnlockCheck};
use chef_planner_core::{
    price_variant, rate, segment_fit, CostDeviation, FitBreakdown, IngredientCatalog,
    PricingPolicy, PricingResult, RatingBreakdown, RecipeVariant, Segment,
};
use chef_planner_menu::{MenuItem, Placement};
use serde_json::{json, Value};

use crate::error::ServiceError;

/// A generated variant together with its latest evaluation.
#[derive(Debug, Clone)]
pub struct Draft {
    pub id: u64,
    pub template: &'static TemplateEntry,
    pub segment: Segment,
    pub section: String,
    pub target: f64,
    pub variant: RecipeVariant,
    pub pricing: PricingResult,
    pub rating: RatingBreakdown,
    pub fit: FitBreakdown,
    pub badge: CostDeviation,
}

impl Draft {
    /// Prices `variant` against `target`, then rates it and scores the
    /// segment fit of the suggested price.
    #[allow(clippy::too_many_arguments)]
    pub fn evaluate(
        id: u64,
        template: &'static TemplateEntry,
        segment: &Segment,
        section: &str,
        mut variant: RecipeVariant,
        target: f64,
        catalog: &IngredientCatalog,
        policy: &PricingPolicy,
    ) -> Self {
        let pricing = price_variant(&mut variant, segment, section, catalog, target, policy);
        let rating = rate(
            &variant,
            &pricing.tiers,
            Some(template.category),
            catalog,
            segment.is_gourmet(),
        );
        let fit = segment_fit(
            rating.stars,
            segment,
            section,
            pricing.suggested_price,
            &variant,
            catalog,
        );
        let badge = CostDeviation::classify(pricing.cost, target);
        Self {
            id,
            template,
            segment: segment.clone(),
            section: section.to_string(),
            target,
            variant,
            pricing,
            rating,
            fit,
            badge,
        }
    }

    /// Same draft, re-evaluated against another target.
    pub fn repriced(&self, target: f64, catalog: &IngredientCatalog, policy: &PricingPolicy) -> Self {
        Self::evaluate(
            self.id,
            self.template,
            &self.segment,
            &self.section,
            self.variant.clone(),
            target,
            catalog,
            policy,
        )
    }

    pub fn name(&self) -> String {
        format!("{} with {}", self.template.name, self.variant.hero())
    }

    pub fn to_menu_item(&self, catalog: &IngredientCatalog) -> MenuItem {
        let placement = Placement {
            template: self.template.name,
            customer: &self.segment.name,
            section: &self.section,
        };
        MenuItem::freeze(
            &placement,
            &self.variant,
            &self.pricing,
            &self.rating,
            &self.fit,
            catalog,
        )
    }

    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name(),
            "template": self.template.name,
            "segment": self.segment.name,
            "section": self.section,
            "target": self.target,
            "variant": self.variant,
            "pricing": self.pricing,
            "rating": self.rating,
            "fit": self.fit,
            "badge": self.badge,
            "badge_label": self.badge.label(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct MenuEntry {
    pub id: u64,
    pub item: MenuItem,
}

impl MenuEntry {
    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.item.name(),
            "item": self.item,
        })
    }
}

/// Per-connection planner state: the latest drafts, the menu being built and
/// the template unlock budget.
#[derive(Debug)]
pub struct Session {
    drafts: Vec<Draft>,
    menu: Vec<MenuEntry>,
    unlocked: BTreeSet<String>,
    points: u32,
    next_id: u64,
}

impl Session {
    pub fn new(points: u32) -> Self {
        Self {
            drafts: Vec::new(),
            menu: Vec::new(),
            unlocked: catalog::free_templates()
                .into_iter()
                .map(str::to_string)
                .collect(),
            points,
            next_id: 1,
        }
    }

    pub fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub const fn points(&self) -> u32 {
        self.points
    }

    pub const fn unlocked(&self) -> &BTreeSet<String> {
        &self.unlocked
    }

    pub fn is_unlocked(&self, entry: &TemplateEntry) -> bool {
        entry.is_free() || self.unlocked.contains(entry.name)
    }

    /// Spends points on `name`. Returns the points left.
    pub fn unlock(&mut self, name: &str) -> Result<u32, ServiceError> {
        let check = catalog::validate_unlock(name, self.points, &self.unlocked);
        match (check, catalog::template(name)) {
            (UnlockCheck::Affordable { remaining, .. }, Some(entry)) => {
                self.points = remaining;
                self.unlocked.insert(entry.name.to_string());
                Ok(remaining)
            }
            (UnlockCheck::Unknown, _) | (_, None) => Err(ServiceError::NotFound(
                UnlockCheck::Unknown.message(name),
            )),
            (check, Some(entry)) => Err(ServiceError::Rejected(check.message(entry.name))),
        }
    }

    /// Replaces the previous generation's drafts.
    pub fn replace_drafts(&mut self, drafts: Vec<Draft>) {
        self.drafts = drafts;
    }

    pub fn draft(&self, id: u64) -> Result<&Draft, ServiceError> {
        self.drafts
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| ServiceError::NotFound(format!("draft {id} not found")))
    }

    pub fn replace_draft(&mut self, draft: Draft) -> Result<(), ServiceError> {
        let id = draft.id;
        let slot = self
            .drafts
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| ServiceError::NotFound(format!("draft {id} not found")))?;
        *slot = draft;
        Ok(())
    }

    /// Freezes a draft onto the menu under a fresh id. The draft stays
    /// available, so the same variant can be added again.
    pub fn add_to_menu(
        &mut self,
        draft_id: u64,
        catalog: &IngredientCatalog,
    ) -> Result<&MenuEntry, ServiceError> {
        let item = self.draft(draft_id)?.to_menu_item(catalog);
        let id = self.allocate_id();
        self.menu.push(MenuEntry { id, item });
        self.menu
            .last()
            .ok_or_else(|| ServiceError::NotFound(format!("menu item {id} not found")))
    }

    pub fn remove_from_menu(&mut self, menu_id: u64) -> Result<MenuEntry, ServiceError> {
        let pos = self
            .menu
            .iter()
            .position(|e| e.id == menu_id)
            .ok_or_else(|| ServiceError::NotFound(format!("menu item {menu_id} not found")))?;
        Ok(self.menu.remove(pos))
    }

    pub fn menu(&self) -> &[MenuEntry] {
        &self.menu
    }

    pub fn menu_items(&self) -> Vec<MenuItem> {
        self.menu.iter().map(|e| e.item.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_templates_start_unlocked() {
        let session = Session::new(0);
        let pasta = catalog::template("Pasta").unwrap_or_else(|| panic!("Pasta missing"));
        assert!(session.is_unlocked(pasta));
        assert_eq!(session.unlocked().len(), catalog::free_templates().len());
    }

    #[test]
    fn unlocking_spends_points_once() {
        let mut session = Session::new(20);
        let left = session
            .unlock("risotto")
            .unwrap_or_else(|e| panic!("unlock: {e}"));
        assert_eq!(left, 5);
        assert_eq!(session.points(), 5);
        assert!(session.unlocked().contains("Risotto"));

        let again = session.unlock("Risotto");
        assert!(matches!(again, Err(ServiceError::Rejected(ref m)) if m.contains("already")));

        let too_dear = session.unlock("Fish Tartare");
        assert!(matches!(too_dear, Err(ServiceError::Rejected(ref m)) if m.contains("10 more")));
        assert_eq!(session.points(), 5);
    }

    #[test]
    fn unknown_template_is_not_found() {
        let mut session = Session::new(50);
        assert!(matches!(
            session.unlock("Space Soup"),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn missing_ids_are_reported() {
        let mut session = Session::new(0);
        assert!(matches!(session.draft(7), Err(ServiceError::NotFound(_))));
        assert!(matches!(
            session.remove_from_menu(3),
            Err(ServiceError::NotFound(ref m)) if m == "menu item 3 not found"
        ));
        assert_eq!(session.allocate_id(), 1);
        assert_eq!(session.allocate_id(), 2);
    }
}
