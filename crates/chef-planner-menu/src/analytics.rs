use std::collections::{BTreeMap, BTreeSet};

use chef_planner_core::Segment;
use serde::Serialize;

use crate::item::MenuItem;

const CROWDED_SECTION_RATIO: f64 = 0.6;
const CROWDED_SECTION_MIN: usize = 3;
const MISSING_SECTION_PROBABILITY: f64 = 0.3;
const REDUNDANT_COMBO_MIN: usize = 3;
const OVERUSED_TAG_RATIO: f64 = 0.6;
const OVERUSED_TAG_MIN: usize = 2;
const INCOHERENT_PRICE_PCT: f64 = 20.0;
const INCOHERENT_SHARE: f64 = 0.3;
const UNDER_TARGET_PCT: f64 = -5.0;
const OVER_TARGET_PCT: f64 = 15.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionCoverage {
    pub count: usize,
    pub actual_ratio: f64,
    pub expected_ratio: f64,
    pub deviation: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TagCoverage {
    pub total_unique_tags: usize,
    pub favourite_coverage: usize,
    pub favourite_total: usize,
    pub secondary_coverage: usize,
    pub secondary_total: usize,
    pub expected_coverage: usize,
    pub expected_total: usize,
    pub favourite_coverage_pct: f64,
    pub missing_favourites: Vec<String>,
    pub missing_expected: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ComplexityStats {
    pub min: usize,
    pub avg: f64,
    pub max: usize,
}

/// Counts of items whose cost sits under, on or over the section expectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CostDistribution {
    pub under_target: usize,
    pub on_target: usize,
    pub over_target: usize,
}

impl CostDistribution {
    pub const fn total(&self) -> usize {
        self.under_target + self.on_target + self.over_target
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CostVsTarget {
    /// Mean absolute deviation, in percent.
    pub avg_deviation: f64,
    pub distribution: CostDistribution,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MenuKpis {
    pub n_items: usize,
    pub avg_stars: f64,
    pub median_price: f64,
    pub avg_price_deviation_pct: f64,
    pub avg_fit_total: f64,
    pub avg_fit_price: f64,
    pub avg_fit_tags: f64,
    pub avg_fit_eval: f64,
    pub section_coverage: BTreeMap<String, SectionCoverage>,
    pub tag_coverage: TagCoverage,
    pub complexity: ComplexityStats,
    pub cost_vs_target: CostVsTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct VarietyStats {
    pub templates: BTreeMap<String, usize>,
    pub sections: BTreeMap<String, usize>,
    pub styles: BTreeMap<String, usize>,
    pub unique_ingredients: usize,
}

#[allow(clippy::cast_precision_loss)]
fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0_usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = n as f64;
    sum / n
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values.get(mid).copied().unwrap_or_default()
    } else {
        match (values.get(mid.wrapping_sub(1)), values.get(mid)) {
            (Some(a), Some(b)) => (a + b) / 2.0,
            _ => 0.0,
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

/// Signed deviation of `actual` from `expected`, in percent.
fn deviation_pct(actual: f64, expected: f64) -> Option<f64> {
    (expected > 0.0).then(|| (actual - expected) / expected * 100.0)
}

fn section_counts(items: &[MenuItem]) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for item in items {
        *counts.entry(item.section.as_str()).or_insert(0) += 1;
    }
    counts
}

fn tag_counts(items: &[MenuItem]) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for tag in items.iter().flat_map(|i| i.tags.iter()) {
        *counts.entry(tag.as_str()).or_insert(0) += 1;
    }
    counts
}

fn menu_tags(items: &[MenuItem]) -> BTreeSet<&str> {
    items
        .iter()
        .flat_map(|i| i.tags.iter().map(String::as_str))
        .collect()
}

/// Key performance indicators of a menu for one customer segment.
/// Section expectations come from the segment, with the neutral default for
/// sections it does not list.
pub fn menu_kpis(items: &[MenuItem], segment: &Segment) -> MenuKpis {
    if items.is_empty() {
        return MenuKpis {
            tag_coverage: tag_coverage(items, segment),
            ..MenuKpis::default()
        };
    }
    let n = items.len();

    let mut price_deviations = Vec::new();
    let mut cost_deviations = Vec::new();
    for item in items {
        let expected = segment.section(&item.section).cost_expectation;
        if let Some(dev) = deviation_pct(item.price, expected) {
            price_deviations.push(dev.abs());
        }
        if let Some(dev) = deviation_pct(item.cost, expected) {
            cost_deviations.push(dev);
        }
    }

    let section_coverage = section_counts(items)
        .into_iter()
        .map(|(section, count)| {
            let actual_ratio = ratio(count, n);
            let expected_ratio = segment.section(section).probability;
            (
                section.to_string(),
                SectionCoverage {
                    count,
                    actual_ratio,
                    expected_ratio,
                    deviation: (actual_ratio - expected_ratio).abs(),
                },
            )
        })
        .collect();

    let counts: Vec<usize> = items.iter().map(MenuItem::ingredient_count).collect();
    #[allow(clippy::cast_precision_loss)]
    let complexity = ComplexityStats {
        min: counts.iter().copied().min().unwrap_or_default(),
        avg: round_to(mean(counts.iter().map(|c| *c as f64)), 1),
        max: counts.iter().copied().max().unwrap_or_default(),
    };

    let mut distribution = CostDistribution::default();
    for dev in &cost_deviations {
        if *dev < UNDER_TARGET_PCT {
            distribution.under_target += 1;
        } else if *dev > OVER_TARGET_PCT {
            distribution.over_target += 1;
        } else {
            distribution.on_target += 1;
        }
    }

    let breakdowns: Vec<_> = items.iter().filter_map(|i| i.fit_breakdown).collect();

    MenuKpis {
        n_items: n,
        avg_stars: round_to(mean(items.iter().map(|i| i.stars)), 2),
        median_price: round_to(median(items.iter().map(|i| i.price).collect()), 2),
        avg_price_deviation_pct: round_to(mean(price_deviations), 1),
        avg_fit_total: round_to(mean(items.iter().map(|i| i.segment_fit)), 1),
        avg_fit_price: round_to(mean(breakdowns.iter().map(|b| b.price_fit)), 1),
        avg_fit_tags: round_to(mean(breakdowns.iter().map(|b| b.tag_fit)), 1),
        avg_fit_eval: round_to(mean(breakdowns.iter().map(|b| b.eval_fit)), 1),
        section_coverage,
        tag_coverage: tag_coverage(items, segment),
        complexity,
        cost_vs_target: CostVsTarget {
            avg_deviation: round_to(mean(cost_deviations.iter().map(|d| d.abs())), 1),
            distribution,
        },
    }
}

fn covered<'a>(wanted: impl IntoIterator<Item = &'a String>, tags: &BTreeSet<&str>) -> usize {
    wanted
        .into_iter()
        .filter(|t| tags.contains(t.as_str()))
        .count()
}

fn missing<'a>(wanted: impl IntoIterator<Item = &'a String>, tags: &BTreeSet<&str>) -> Vec<String> {
    wanted
        .into_iter()
        .filter(|t| !tags.contains(t.as_str()))
        .cloned()
        .collect()
}

fn tag_coverage(items: &[MenuItem], segment: &Segment) -> TagCoverage {
    let tags = menu_tags(items);
    let favourite_coverage = covered(&segment.favourite_tags, &tags);
    let favourite_total = segment.favourite_tags.len();
    TagCoverage {
        total_unique_tags: tags.len(),
        favourite_coverage,
        favourite_total,
        secondary_coverage: covered(&segment.secondary_favourite_tags, &tags),
        secondary_total: segment.secondary_favourite_tags.len(),
        expected_coverage: covered(segment.expectations.keys(), &tags),
        expected_total: segment.expectations.len(),
        favourite_coverage_pct: if favourite_total == 0 {
            100.0
        } else {
            round_to(ratio(favourite_coverage, favourite_total) * 100.0, 1)
        },
        missing_favourites: missing(&segment.favourite_tags, &tags),
        missing_expected: missing(segment.expectations.keys(), &tags),
    }
}

/// Expected average ingredient count for a segment, derived from its name.
fn complexity_range(segment_name: &str) -> (f64, f64) {
    let name = segment_name.to_lowercase();
    if name.contains("gourmet") || name.contains("premium") {
        (6.0, 10.0)
    } else if name.contains("family") || name.contains("casual") {
        (4.0, 8.0)
    } else {
        (5.0, 8.0)
    }
}

/// Variety and coherence problems worth showing next to the menu.
pub fn variety_warnings(items: &[MenuItem], segment: &Segment) -> Vec<String> {
    if items.is_empty() {
        return vec!["Menu is empty: add recipes to see the analysis".to_string()];
    }
    let n = items.len();
    let mut warnings = Vec::new();

    let sections = section_counts(items);
    for (section, count) in &sections {
        let share = ratio(*count, n);
        if share > CROWDED_SECTION_RATIO && *count > CROWDED_SECTION_MIN {
            warnings.push(format!(
                "Too many dishes in section '{section}' ({count}/{n}, {:.1}%)",
                share * 100.0
            ));
        }
    }

    for (section, info) in &segment.sections {
        if info.probability > MISSING_SECTION_PROBABILITY && !sections.contains_key(section.as_str())
        {
            warnings.push(format!(
                "Section '{section}' missing ({:.1}% probability for this segment)",
                info.probability * 100.0
            ));
        }
    }

    let mut combos: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for item in items.iter().filter(|i| !i.anchor.is_empty()) {
        *combos
            .entry((item.template.as_str(), item.anchor.as_str()))
            .or_insert(0) += 1;
    }
    for ((template, anchor), count) in combos {
        if count >= REDUNDANT_COMBO_MIN {
            warnings.push(format!(
                "Redundancy: {count} similar dishes with template '{template}' and ingredient '{anchor}'"
            ));
        }
    }

    let tags = tag_counts(items);
    let missing: Vec<&str> = segment
        .favourite_tags
        .iter()
        .map(String::as_str)
        .filter(|t| !tags.contains_key(t))
        .collect();
    if !missing.is_empty() && missing.len() * 2 > segment.favourite_tags.len() {
        let listed: Vec<&str> = missing.iter().take(3).copied().collect();
        warnings.push(format!("Missing favourite tags: {}", listed.join(", ")));
    }

    for (tag, count) in &tags {
        let share = ratio(*count, n);
        if share > OVERUSED_TAG_RATIO && *count > OVERUSED_TAG_MIN {
            warnings.push(format!(
                "Tag '{tag}' overused: in {count}/{n} dishes ({:.1}%)",
                share * 100.0
            ));
        }
    }

    let incoherent = items
        .iter()
        .filter(|item| {
            deviation_pct(item.price, segment.section(&item.section).cost_expectation)
                .is_some_and(|dev| dev.abs() > INCOHERENT_PRICE_PCT)
        })
        .count();
    if ratio(incoherent, n) > INCOHERENT_SHARE {
        warnings.push(format!(
            "Incoherent prices: {incoherent}/{n} dishes off target (more than 20%)"
        ));
    }

    #[allow(clippy::cast_precision_loss)]
    let avg = mean(items.iter().map(|i| i.ingredient_count() as f64));
    let (low, high) = complexity_range(&segment.name);
    if avg < low - 1.0 {
        warnings.push(format!(
            "Menu too simple for the segment (average {avg:.1} ingredients)"
        ));
    } else if avg > high + 1.0 {
        warnings.push(format!(
            "Menu too complex for the segment (average {avg:.1} ingredients)"
        ));
    }

    warnings
}

/// Overall menu health, 0..=100.
pub fn menu_health_score(kpis: &MenuKpis, warning_count: usize) -> u32 {
    if kpis.n_items == 0 {
        return 0;
    }
    let stars = kpis.avg_stars / 5.0 * 30.0;
    let fit = kpis.avg_fit_total / 100.0 * 25.0;
    let price_coherence = kpis
        .avg_price_deviation_pct
        .mul_add(-0.5, 20.0)
        .clamp(0.0, 20.0);
    let unbalanced = kpis
        .section_coverage
        .values()
        .filter(|c| c.deviation > 0.3)
        .count();
    #[allow(clippy::cast_precision_loss)]
    let section_balance = 5.0_f64.mul_add(-(unbalanced as f64), 15.0).max(0.0);
    let tags = kpis.tag_coverage.favourite_coverage_pct / 100.0 * 10.0;
    #[allow(clippy::cast_precision_loss)]
    let penalty = (warning_count.saturating_mul(3) as f64).min(20.0);

    let total = stars + fit + price_coherence + section_balance + tags - penalty;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let score = total.clamp(0.0, 100.0).trunc() as u32;
    score
}

pub fn variety_stats(items: &[MenuItem]) -> VarietyStats {
    let mut stats = VarietyStats::default();
    for item in items {
        *stats.templates.entry(item.template.clone()).or_insert(0) += 1;
        *stats.sections.entry(item.section.clone()).or_insert(0) += 1;
        *stats
            .styles
            .entry(item.style.label().to_string())
            .or_insert(0) += 1;
    }
    stats.unique_ingredients = items
        .iter()
        .flat_map(|i| i.ingredients.iter())
        .collect::<BTreeSet<_>>()
        .len();
    stats
}

#[cfg(test)]
mod tests {
    use chef_planner_core::{SectionInfo, Style};

    use super::*;

    fn item(template: &str, anchor: &str, section: &str, price: f64, tags: &[&str]) -> MenuItem {
        MenuItem {
            template: template.to_string(),
            anchor: anchor.to_string(),
            style: Style::Classico,
            ingredients: (0..6).map(|i| format!("{anchor}-{i}")).collect(),
            roles: BTreeMap::new(),
            tiers: BTreeMap::new(),
            cost: price / 1.1,
            price,
            stars: 3.0,
            segment_fit: 70.0,
            fit_breakdown: None,
            customer: "Gourmet".to_string(),
            section: section.to_string(),
            notes: String::new(),
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
        }
    }

    fn gourmet() -> Segment {
        let mut segment = Segment::new("Gourmet");
        segment.favourite_tags = ["Seafood", "Wine", "Truffle"]
            .into_iter()
            .map(String::from)
            .collect();
        segment.expectations = BTreeMap::from([("Seafood".to_string(), 0.9)]);
        segment.sections = BTreeMap::from([
            (
                "MainCourse".to_string(),
                SectionInfo {
                    probability: 1.0,
                    cost_expectation: 20.0,
                },
            ),
            (
                "Dessert".to_string(),
                SectionInfo {
                    probability: 0.9,
                    cost_expectation: 10.0,
                },
            ),
        ]);
        segment
    }

    #[test]
    fn empty_menu() {
        let segment = gourmet();
        let kpis = menu_kpis(&[], &segment);
        assert_eq!(kpis.n_items, 0);
        assert_eq!(kpis.tag_coverage.missing_favourites.len(), 3);
        assert_eq!(menu_health_score(&kpis, 0), 0);
        assert_eq!(variety_warnings(&[], &segment).len(), 1);
        assert_eq!(variety_stats(&[]), VarietyStats::default());
    }

    #[test]
    fn kpis_aggregate_items() {
        let segment = gourmet();
        let items = vec![
            item("Grilled Fish", "Salmon", "MainCourse", 20.0, &["Seafood"]),
            item("Risotto", "Rice", "MainCourse", 24.0, &["Carbs", "Wine"]),
            item("Cookies", "Flour", "Dessert", 8.0, &["Sweet"]),
        ];
        let kpis = menu_kpis(&items, &segment);

        assert_eq!(kpis.n_items, 3);
        assert!((kpis.avg_stars - 3.0).abs() < 1e-9);
        assert!((kpis.median_price - 20.0).abs() < 1e-9);
        // |0| + |20| + |20| over three items
        assert!((kpis.avg_price_deviation_pct - 13.3).abs() < 1e-9);

        let main = kpis
            .section_coverage
            .get("MainCourse")
            .unwrap_or_else(|| panic!("main course missing"));
        assert_eq!(main.count, 2);
        assert!((main.expected_ratio - 1.0).abs() < 1e-9);

        assert_eq!(kpis.tag_coverage.favourite_coverage, 2);
        assert_eq!(kpis.tag_coverage.missing_favourites, vec!["Truffle".to_string()]);
        assert!((kpis.tag_coverage.favourite_coverage_pct - 66.7).abs() < 1e-9);
        assert_eq!(kpis.tag_coverage.expected_coverage, 1);
        assert_eq!(kpis.complexity.min, 6);
        assert_eq!(kpis.complexity.max, 6);
        assert_eq!(kpis.cost_vs_target.distribution.total(), 3);
    }

    #[test]
    fn cost_distribution_is_signed() {
        let segment = gourmet();
        let mut cheap = item("Pasta", "Spaghetti", "MainCourse", 10.0, &[]);
        cheap.cost = 10.0;
        let mut pricey = item("Paella", "Shrimp", "MainCourse", 30.0, &[]);
        pricey.cost = 30.0;
        let mut fair = item("Grilled Fish", "Bass", "MainCourse", 22.0, &[]);
        fair.cost = 21.0;

        let kpis = menu_kpis(&[cheap, pricey, fair], &segment);
        let dist = kpis.cost_vs_target.distribution;
        assert_eq!(dist.under_target, 1);
        assert_eq!(dist.over_target, 1);
        assert_eq!(dist.on_target, 1);
        // (50 + 50 + 5) / 3
        assert!((kpis.cost_vs_target.avg_deviation - 35.0).abs() < 1e-9);
    }

    #[test]
    fn warnings_cover_menu_imbalances() {
        let segment = gourmet();
        let items: Vec<_> = (0..4)
            .map(|_| item("Grilled Fish", "Salmon", "MainCourse", 40.0, &["Seafood"]))
            .collect();
        let warnings = variety_warnings(&items, &segment);

        assert!(warnings.iter().any(|w| w.starts_with("Too many dishes in section 'MainCourse'")));
        assert!(warnings.iter().any(|w| w.starts_with("Section 'Dessert' missing")));
        assert!(warnings.iter().any(|w| w.starts_with("Redundancy: 4 similar dishes")));
        assert!(warnings.iter().any(|w| w == "Missing favourite tags: Truffle, Wine"));
        assert!(warnings.iter().any(|w| w.starts_with("Tag 'Seafood' overused")));
        assert!(warnings.iter().any(|w| w.starts_with("Incoherent prices: 4/4")));
        assert!(!warnings.iter().any(|w| w.starts_with("Menu too")));
    }

    #[test]
    fn complexity_warning_uses_segment_name() {
        let segment = gourmet();
        let mut small = item("Salad", "Lettuce", "MainCourse", 20.0, &["Seafood", "Wine"]);
        small.ingredients.truncate(3);
        let warnings = variety_warnings(&[small], &segment);
        assert_eq!(
            warnings,
            vec![
                "Section 'Dessert' missing (90.0% probability for this segment)".to_string(),
                "Menu too simple for the segment (average 3.0 ingredients)".to_string(),
            ]
        );
    }

    #[test]
    fn health_score_combines_components() {
        let segment = gourmet();
        let items = vec![
            item("Grilled Fish", "Salmon", "MainCourse", 20.0, &["Seafood", "Wine", "Truffle"]),
            item("Cookies", "Flour", "Dessert", 10.0, &["Sweet"]),
        ];
        let kpis = menu_kpis(&items, &segment);
        // stars 18 + fit 17.5 + price 20 + two unbalanced sections 5 + tags 10
        assert_eq!(menu_health_score(&kpis, 0), 70);
        assert_eq!(menu_health_score(&kpis, 2), 64);
        assert_eq!(menu_health_score(&kpis, 50), 50);
    }

    #[test]
    fn variety_counts() {
        let items = vec![
            item("Grilled Fish", "Salmon", "MainCourse", 20.0, &[]),
            item("Grilled Fish", "Bass", "MainCourse", 20.0, &[]),
        ];
        let stats = variety_stats(&items);
        assert_eq!(stats.templates.get("Grilled Fish"), Some(&2));
        assert_eq!(stats.styles.get("classico"), Some(&2));
        assert_eq!(stats.unique_ingredients, 12);
    }
}
