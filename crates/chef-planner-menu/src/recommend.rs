use std::collections::{BTreeMap, BTreeSet};

use chef_planner_catalog::{self as catalog, SIGNATURE_POINTS};
use chef_planner_core::Segment;
use serde::Serialize;
use tracing::debug;

use crate::item::MenuItem;

const MAX_RECOMMENDATIONS: usize = 5;
const MAX_PER_KIND: usize = 2;
const UNDER_REPRESENTED_PROBABILITY: f64 = 0.2;

const STARTER_TEMPLATES: [(&str, &str); 3] = [
    ("Pasta", "Universal template to get started"),
    ("Grilled Meat", "Classic main course"),
    ("Salad", "Essential light option"),
];

/// Which sections a template usually serves.
const TEMPLATE_SECTIONS: [(&str, &[&str]); 11] = [
    ("Salad", &["Appetizer", "SideDish"]),
    ("Vegetable Soup", &["Soup", "Appetizer"]),
    ("Grilled Fish", &["MainCourse"]),
    ("Roasted Fish", &["MainCourse"]),
    ("Grilled Meat", &["MainCourse"]),
    ("Roasted Meat", &["MainCourse"]),
    ("Pasta", &["MainCourse"]),
    ("Risotto", &["MainCourse"]),
    ("Ice Cream", &["Dessert"]),
    ("Cookies", &["Dessert"]),
    ("Cheesecake", &["Dessert"]),
];

/// Templates that bring a given tag onto the menu.
const TAG_TEMPLATES: [(&str, &[&str]); 5] = [
    ("Seafood", &["Grilled Fish", "Fish Soup", "Fish Tartare"]),
    ("Meat", &["Grilled Meat", "Meatballs", "Meat Stew"]),
    ("Cheese", &["Cheesecake", "Lasagne"]),
    ("Wine", &["Risotto", "Braised Meat"]),
    ("Vegetables", &["Salad", "Vegetable Soup", "Grilled Veggies"]),
];

const GOURMET_SIGNATURES: [&str; 3] = ["Risotto", "Fish Tartare", "Millefeuille"];
const HEARTY_SIGNATURES: [&str; 2] = ["Stuffed Meat", "Braised Meat"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub template: String,
    pub points: u32,
    pub reason: String,
}

/// Cheapest template among `names` that is known, still locked and within budget.
fn cheapest_affordable<'a>(
    names: impl IntoIterator<Item = &'a str>,
    unlocked: &BTreeSet<String>,
    budget: u32,
) -> Option<(&'static str, u32)> {
    names
        .into_iter()
        .filter(|name| !unlocked.contains(*name))
        .filter_map(catalog::template)
        .filter(|t| t.points <= budget)
        .map(|t| (t.name, t.points))
        .min_by_key(|(_, points)| *points)
}

/// Templates worth unlocking next, cheapest first. At most five.
pub fn unlock_recommendations(
    items: &[MenuItem],
    segment: &Segment,
    unlocked: &BTreeSet<String>,
    budget: u32,
) -> Vec<Recommendation> {
    if items.is_empty() {
        return STARTER_TEMPLATES
            .iter()
            .filter(|(name, _)| !unlocked.contains(*name))
            .map(|(name, reason)| Recommendation {
                template: (*name).to_string(),
                points: catalog::template(name).map_or(0, |t| t.points),
                reason: (*reason).to_string(),
            })
            .collect();
    }

    let mut out: Vec<Recommendation> = Vec::new();
    let push = |out: &mut Vec<Recommendation>, template: &str, points: u32, reason: String| {
        if !out.iter().any(|r| r.template == template) {
            out.push(Recommendation {
                template: template.to_string(),
                points,
                reason,
            });
        }
    };

    let mut section_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for item in items {
        *section_counts.entry(item.section.as_str()).or_insert(0) += 1;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = items.len() as f64;
    let under_represented = segment.sections.iter().filter(|(section, info)| {
        #[allow(clippy::cast_precision_loss)]
        let current = section_counts.get(section.as_str()).copied().unwrap_or(0) as f64;
        info.probability > UNDER_REPRESENTED_PROBABILITY && current < info.probability * n * 0.5
    });
    for (section, info) in under_represented.take(MAX_PER_KIND) {
        let candidates = TEMPLATE_SECTIONS
            .iter()
            .filter(|(_, sections)| sections.contains(&section.as_str()))
            .map(|(name, _)| *name);
        if let Some((name, points)) = cheapest_affordable(candidates, unlocked, budget) {
            let reason = format!(
                "Improves coverage of section '{section}' ({:.1}% probability)",
                info.probability * 100.0
            );
            push(&mut out, name, points, reason);
        }
    }

    let menu_tags: BTreeSet<&str> = items
        .iter()
        .flat_map(|i| i.tags.iter().map(String::as_str))
        .collect();
    let missing = segment
        .favourite_tags
        .iter()
        .filter(|t| !menu_tags.contains(t.as_str()));
    for tag in missing.take(MAX_PER_KIND) {
        let Some((_, candidates)) = TAG_TEMPLATES.iter().find(|(t, _)| *t == tag.as_str()) else {
            continue;
        };
        if let Some((name, points)) =
            cheapest_affordable(candidates.iter().copied(), unlocked, budget)
        {
            push(
                &mut out,
                name,
                points,
                format!("Covers missing favourite tag '{tag}'"),
            );
        }
    }

    if budget >= SIGNATURE_POINTS {
        if let Some((name, reason)) = signature_pick(segment, unlocked) {
            push(&mut out, name, SIGNATURE_POINTS, reason);
        }
    }

    out.sort_by_key(|r| r.points);
    out.truncate(MAX_RECOMMENDATIONS);
    debug!(segment = %segment.name, count = out.len(), "unlock recommendations");
    out
}

fn signature_pick(segment: &Segment, unlocked: &BTreeSet<String>) -> Option<(&'static str, String)> {
    let available: Vec<&'static str> = catalog::all()
        .iter()
        .filter(|t| t.points == SIGNATURE_POINTS && !unlocked.contains(t.name))
        .map(|t| t.name)
        .collect();
    let first = *available.first()?;

    let name = segment.name.to_lowercase();
    let preferred: &[&'static str] = if name.contains("gourmet") {
        &GOURMET_SIGNATURES
    } else if name.contains("meat") || name.contains("family") {
        &HEARTY_SIGNATURES
    } else {
        &[]
    };
    match preferred.iter().find(|p| available.contains(*p)) {
        Some(pick) => Some((
            *pick,
            format!(
                "Signature dish ({SIGNATURE_POINTS} pts) suited to the {} segment",
                segment.name
            ),
        )),
        None => Some((
            first,
            format!("Signature dish ({SIGNATURE_POINTS} pts) to set the menu apart"),
        )),
    }
}
