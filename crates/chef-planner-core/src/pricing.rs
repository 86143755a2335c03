use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::compat::round2;
use crate::types::{IngredientCatalog, Role, Segment, Tier};
use crate::variant::RecipeVariant;

/// Ratios (relative to the target cost) steering the greedy tier search and
/// the suggested menu price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Upgrade pass runs when the all-NORMAL cost is below this.
    pub upgrade_trigger: f64,
    /// An upgrade is kept only if the new total stays at or below this.
    pub upgrade_ceiling: f64,
    /// After a NORMAL→FIRST_CHOICE step, try GOURMET while still below this.
    pub gourmet_step_below: f64,
    /// Downgrade pass runs when the all-NORMAL cost is above this.
    pub downgrade_trigger: f64,
    /// GOURMET→FIRST_CHOICE is kept only if the new total stays at or above this.
    pub first_choice_floor: f64,
    /// FIRST_CHOICE→NORMAL is kept only if the new total stays at or above this.
    pub normal_floor: f64,
    /// Downgrading stops once the total is at or below this.
    pub downgrade_stop: f64,
    /// Costs within this band of the target are priced at the target.
    pub price_band: f64,
    pub margin: f64,
    /// The price never drops below this share of the target.
    pub price_floor: f64,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            upgrade_trigger: 0.8,
            upgrade_ceiling: 1.05,
            gourmet_step_below: 0.9,
            downgrade_trigger: 1.2,
            first_choice_floor: 0.8,
            normal_floor: 0.7,
            downgrade_stop: 1.1,
            price_band: 0.15,
            margin: 1.1,
            price_floor: 0.85,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingResult {
    pub tiers: BTreeMap<String, Tier>,
    pub cost: f64,
    pub suggested_price: f64,
}

/// Total cost of `ingredients` at their tiers (NORMAL when absent), rounded
/// to cents. Unknown ingredients contribute nothing.
pub fn estimate_cost<S: AsRef<str>>(
    ingredients: &[S],
    tiers: &BTreeMap<String, Tier>,
    catalog: &IngredientCatalog,
) -> f64 {
    round2(raw_cost(ingredients, tiers, catalog))
}

fn raw_cost<S: AsRef<str>>(
    ingredients: &[S],
    tiers: &BTreeMap<String, Tier>,
    catalog: &IngredientCatalog,
) -> f64 {
    ingredients
        .iter()
        .filter_map(|name| {
            let name = name.as_ref();
            let tier = tiers.get(name).copied().unwrap_or(Tier::Normal);
            catalog.get(name).map(|i| i.unit_cost(tier))
        })
        .sum()
}

/// Hero first, then fat/cheese/base, plain complements, seasonings last.
/// Selection order is kept inside each group.
fn upgrade_order<'a>(ingredients: &'a [String], roles: &BTreeMap<String, Role>) -> Vec<&'a str> {
    let rank = |name: &str| match roles.get(name) {
        Some(Role::Hero) => 0,
        Some(role) if role.is_premium() => 1,
        Some(Role::Seasoning) => 3,
        _ => 2,
    };
    let mut order: Vec<&str> = ingredients.iter().map(String::as_str).collect();
    order.sort_by_key(|name| rank(*name));
    order
}

/// Greedy tier search starting from `start`. Runs at most one of the two
/// passes and never backtracks, so the result may stay outside the target band.
/// Each ingredient is visited once and moves at most one tier when
/// downgrading. Names missing from the catalog keep their tier.
pub fn adjust_tiers(
    ingredients: &[String],
    roles: &BTreeMap<String, Role>,
    start: &BTreeMap<String, Tier>,
    target: f64,
    catalog: &IngredientCatalog,
    policy: &PricingPolicy,
) -> BTreeMap<String, Tier> {
    let mut tiers: BTreeMap<String, Tier> = ingredients
        .iter()
        .map(|name| (name.clone(), start.get(name).copied().unwrap_or(Tier::Normal)))
        .collect();
    if target <= 0.0 {
        return tiers;
    }

    let initial = raw_cost(ingredients, &tiers, catalog);
    let mut order = upgrade_order(ingredients, roles);

    if initial < target * policy.upgrade_trigger {
        debug!(initial, target, "upgrade pass");
        let ceiling = target * policy.upgrade_ceiling;
        for name in order {
            if catalog.get(name).is_none() {
                continue;
            }
            let Some(current) = tiers.get(name).copied() else {
                continue;
            };
            if current == Tier::Normal {
                if try_step(&mut tiers, name, Tier::FirstChoice, ingredients, catalog, |c| c <= ceiling)
                    && raw_cost(ingredients, &tiers, catalog) < target * policy.gourmet_step_below
                {
                    try_step(&mut tiers, name, Tier::Gourmet, ingredients, catalog, |c| c <= ceiling);
                }
            } else if current == Tier::FirstChoice {
                try_step(&mut tiers, name, Tier::Gourmet, ingredients, catalog, |c| c <= ceiling);
            }
        }
    } else if initial > target * policy.downgrade_trigger {
        debug!(initial, target, "downgrade pass");
        order.reverse();
        let fc_floor = target * policy.first_choice_floor;
        let normal_floor = target * policy.normal_floor;
        for name in order {
            if raw_cost(ingredients, &tiers, catalog) <= target * policy.downgrade_stop {
                break;
            }
            if catalog.get(name).is_none() {
                continue;
            }
            // One step per visit.
            match tiers.get(name).copied() {
                Some(Tier::Gourmet) => {
                    try_step(&mut tiers, name, Tier::FirstChoice, ingredients, catalog, |c| c >= fc_floor);
                }
                Some(Tier::FirstChoice) => {
                    try_step(&mut tiers, name, Tier::Normal, ingredients, catalog, |c| c >= normal_floor);
                }
                _ => {}
            }
        }
    }
    tiers
}

/// Moves `name` to `next` if the resulting total passes `accept`; otherwise
/// leaves the map untouched.
fn try_step(
    tiers: &mut BTreeMap<String, Tier>,
    name: &str,
    next: Tier,
    ingredients: &[String],
    catalog: &IngredientCatalog,
    accept: impl Fn(f64) -> bool,
) -> bool {
    let Some(previous) = tiers.insert(name.to_string(), next) else {
        tiers.remove(name);
        return false;
    };
    if accept(raw_cost(ingredients, tiers, catalog)) {
        true
    } else {
        tiers.insert(name.to_string(), previous);
        false
    }
}

/// Target price when cost landed inside the band, otherwise cost plus margin
/// but never below the price floor.
pub fn suggest_price(cost: f64, target: f64, policy: &PricingPolicy) -> f64 {
    if (cost - target).abs() <= target * policy.price_band {
        return round2(target);
    }
    round2((cost * policy.margin).max(target * policy.price_floor))
}

/// Prices `variant` against `target`, writing the chosen tiers back into it.
/// Always starts from all-NORMAL tiers, so repeated calls agree.
pub fn price_variant(
    variant: &mut RecipeVariant,
    segment: &Segment,
    section: &str,
    catalog: &IngredientCatalog,
    target: f64,
    policy: &PricingPolicy,
) -> PricingResult {
    let tiers = adjust_tiers(
        variant.ingredients(),
        variant.roles(),
        &BTreeMap::new(),
        target,
        catalog,
        policy,
    );
    let cost = estimate_cost(variant.ingredients(), &tiers, catalog);
    let suggested_price = suggest_price(cost, target, policy);

    if target > 0.0 && (cost - target).abs() > target * policy.price_band {
        warn!(
            segment = %segment.name,
            section,
            cost,
            target,
            "tier search finished outside the target band"
        );
    }

    variant.set_tiers(tiers.clone());
    PricingResult {
        tiers,
        cost,
        suggested_price,
    }
}

/// Badge for the gap between actual cost and target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CostDeviation {
    UnknownTarget,
    OnTarget,
    Over { pct: f64, severe: bool },
    Under { pct: f64 },
}

impl CostDeviation {
    const ON_TARGET_PCT: f64 = 10.0;
    const SEVERE_PCT: f64 = 25.0;

    pub fn classify(actual: f64, target: f64) -> Self {
        if target <= 0.0 {
            return Self::UnknownTarget;
        }
        let pct = (actual - target) / target * 100.0;
        if pct.abs() <= Self::ON_TARGET_PCT {
            Self::OnTarget
        } else if pct > 0.0 {
            Self::Over {
                pct: round2(pct),
                severe: pct > Self::SEVERE_PCT,
            }
        } else {
            Self::Under {
                pct: round2(pct.abs()),
            }
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::UnknownTarget => "no target".to_string(),
            Self::OnTarget => "on target".to_string(),
            Self::Over { pct, .. } => format!("+{pct:.0}% over target"),
            Self::Under { pct } => format!("-{pct:.0}% under target"),
        }
    }
}
