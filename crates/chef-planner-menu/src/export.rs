use std::collections::BTreeMap;
use std::fmt::Write as _;

use chef_planner_core::{FitBreakdown, Role, Tier};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analytics::{menu_health_score, MenuKpis};
use crate::item::MenuItem;
use crate::recommend::Recommendation;

pub const FORMAT_VERSION: &str = "1.0";
const RULE_WIDTH: usize = 70;
const REPORT_INGREDIENTS_SHOWN: usize = 4;
const REPORT_INGREDIENTS_FULL: usize = 6;

const CSV_HEADERS: [&str; 15] = [
    "ID",
    "Name",
    "Template",
    "Section",
    "Customer Segment",
    "Main Ingredient",
    "Style",
    "Rating (stars)",
    "Price",
    "Cost",
    "Segment Fit (%)",
    "Ingredient Count",
    "Ingredients",
    "Ingredient Tiers",
    "Notes",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Csv,
    Json,
    Report,
}

impl ExportKind {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "report" | "txt" | "text" => Some(Self::Report),
            _ => None,
        }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Report => "txt",
        }
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn tiers_summary(tiers: &BTreeMap<String, Tier>) -> String {
    tiers
        .iter()
        .map(|(name, tier)| format!("{name}:{}", tier.label()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One row per item, ids starting at 1.
pub fn export_csv(items: &[MenuItem]) -> String {
    if items.is_empty() {
        return "No menu items to export".to_string();
    }
    let mut out = CSV_HEADERS.join(",");
    out.push('\n');
    for (i, item) in items.iter().enumerate() {
        let row = [
            (i + 1).to_string(),
            item.name(),
            item.template.clone(),
            item.section.clone(),
            item.customer.clone(),
            item.anchor.clone(),
            item.style_title(),
            format!("{:.1}", item.stars),
            format!("{:.2}", item.price),
            format!("{:.2}", item.cost),
            format!("{:.0}", item.segment_fit),
            item.ingredient_count().to_string(),
            item.ingredients.join(", "),
            tiers_summary(&item.tiers),
            item.notes.clone(),
        ];
        let fields: Vec<String> = row.iter().map(|f| csv_field(f)).collect();
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

#[derive(Debug, Serialize)]
struct JsonExport<'a> {
    menu_info: MenuInfo,
    menu_items: Vec<JsonItem<'a>>,
}

#[derive(Debug, Serialize)]
struct MenuInfo {
    total_items: usize,
    exported_at: String,
    format_version: &'static str,
}

#[derive(Debug, Serialize)]
struct JsonItem<'a> {
    id: usize,
    name: String,
    template: &'a str,
    section: &'a str,
    customer_segment: &'a str,
    anchor_ingredient: &'a str,
    style: &'static str,
    rating: JsonRating,
    pricing: JsonPricing,
    ingredients: JsonIngredients<'a>,
    notes: &'a str,
    tags: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct JsonRating {
    stars: f64,
    segment_fit_pct: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    fit_breakdown: Option<FitBreakdown>,
}

#[derive(Debug, Serialize)]
struct JsonPricing {
    suggested_price: f64,
    total_cost: f64,
}

#[derive(Debug, Serialize)]
struct JsonIngredients<'a> {
    list: &'a [String],
    count: usize,
    roles: &'a BTreeMap<String, Role>,
    tiers: &'a BTreeMap<String, Tier>,
}

fn round(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

/// Pretty-printed JSON document with a header block and one entry per item.
pub fn export_json(
    items: &[MenuItem],
    exported_at: DateTime<Utc>,
) -> Result<String, serde_json::Error> {
    let menu_items = items
        .iter()
        .enumerate()
        .map(|(i, item)| JsonItem {
            id: i + 1,
            name: item.name(),
            template: &item.template,
            section: &item.section,
            customer_segment: &item.customer,
            anchor_ingredient: &item.anchor,
            style: item.style.label(),
            rating: JsonRating {
                stars: round(item.stars, 2),
                segment_fit_pct: round(item.segment_fit, 1),
                fit_breakdown: item.fit_breakdown,
            },
            pricing: JsonPricing {
                suggested_price: round(item.price, 2),
                total_cost: round(item.cost, 2),
            },
            ingredients: JsonIngredients {
                list: &item.ingredients,
                count: item.ingredient_count(),
                roles: &item.roles,
                tiers: &item.tiers,
            },
            notes: &item.notes,
            tags: item.tags.iter().map(String::as_str).collect(),
        })
        .collect();

    serde_json::to_string_pretty(&JsonExport {
        menu_info: MenuInfo {
            total_items: items.len(),
            exported_at: exported_at.to_rfc3339(),
            format_version: FORMAT_VERSION,
        },
        menu_items,
    })
}

/// Everything the text report needs besides the items themselves.
#[derive(Debug, Clone, Copy)]
pub struct ReportContext<'a> {
    pub segment_name: &'a str,
    pub kpis: &'a MenuKpis,
    pub warnings: &'a [String],
    pub recommendations: &'a [Recommendation],
    pub exported_at: DateTime<Utc>,
}

fn verdict(health: u32) -> &'static str {
    if health >= 80 {
        "Excellent menu: ready for service"
    } else if health >= 60 {
        "Good menu: small improvements recommended"
    } else {
        "Menu needs significant improvements"
    }
}

fn complexity_label(avg: f64) -> &'static str {
    if avg < 4.0 {
        "simple"
    } else if avg > 8.0 {
        "complex"
    } else {
        "balanced"
    }
}

#[allow(clippy::cast_precision_loss)]
fn share_pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Human-readable report: summary, KPIs, coverage, per-dish detail,
/// warnings, unlock advice and cost distribution.
pub fn export_report(items: &[MenuItem], ctx: &ReportContext<'_>) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_report(&mut out, items, ctx);
    out
}

fn write_report(out: &mut String, items: &[MenuItem], ctx: &ReportContext<'_>) -> std::fmt::Result {
    let kpis = ctx.kpis;
    let heavy = "=".repeat(RULE_WIDTH);

    writeln!(out, "{heavy}")?;
    writeln!(out, "CHEF PLANNER - MENU REPORT")?;
    writeln!(out, "{heavy}")?;
    writeln!(out, "Exported: {}", ctx.exported_at.format("%d/%m/%Y %H:%M"))?;
    writeln!(out, "Customer segment: {}", ctx.segment_name)?;
    writeln!(out, "Recipes on the menu: {}", kpis.n_items)?;
    writeln!(out)?;

    let health = menu_health_score(kpis, ctx.warnings.len());
    writeln!(out, "SUMMARY")?;
    writeln!(out, "{}", "-".repeat(30))?;
    writeln!(out, "Menu health: {health}/100")?;
    writeln!(out, "{}", verdict(health))?;
    writeln!(out)?;

    writeln!(out, "KEY PERFORMANCE INDICATORS")?;
    writeln!(out, "{}", "-".repeat(40))?;
    writeln!(out, "Average rating: {:.1}/5.0 stars", kpis.avg_stars)?;
    writeln!(out, "Average segment fit: {:.1}%", kpis.avg_fit_total)?;
    writeln!(out, "Median price: {:.2}", kpis.median_price)?;
    writeln!(out, "Price deviation: {:.1}%", kpis.avg_price_deviation_pct)?;
    writeln!(out)?;
    writeln!(out, "   Fit breakdown:")?;
    writeln!(out, "   Price fit: {:.1}%", kpis.avg_fit_price)?;
    writeln!(out, "   Tag fit: {:.1}%", kpis.avg_fit_tags)?;
    writeln!(out, "   Evaluation fit: {:.1}%", kpis.avg_fit_eval)?;
    writeln!(out)?;

    writeln!(out, "SECTION COVERAGE")?;
    writeln!(out, "{}", "-".repeat(25))?;
    for (section, info) in &kpis.section_coverage {
        let status = if (info.actual_ratio - info.expected_ratio).abs() <= 0.2 {
            "ok"
        } else {
            "!!"
        };
        writeln!(
            out,
            "[{status}] {section}: {} recipes ({:.1}%, expected {:.1}%)",
            info.count,
            info.actual_ratio * 100.0,
            info.expected_ratio * 100.0
        )?;
    }
    writeln!(out)?;

    writeln!(out, "FAVOURITE TAG COVERAGE")?;
    writeln!(out, "{}", "-".repeat(30))?;
    let tags = &kpis.tag_coverage;
    writeln!(out, "Favourite tag coverage: {:.0}%", tags.favourite_coverage_pct)?;
    if tags.missing_favourites.is_empty() {
        writeln!(out, "All favourite tags are covered")?;
    } else {
        let listed: Vec<&str> = tags
            .missing_favourites
            .iter()
            .take(5)
            .map(String::as_str)
            .collect();
        writeln!(out, "Missing favourite tags: {}", listed.join(", "))?;
    }
    writeln!(out)?;

    writeln!(out, "COMPLEXITY")?;
    writeln!(out, "{}", "-".repeat(25))?;
    let complexity = kpis.complexity;
    writeln!(
        out,
        "Ingredients per recipe - min: {}, avg: {:.1}, max: {}",
        complexity.min, complexity.avg, complexity.max
    )?;
    writeln!(out, "Menu complexity: {}", complexity_label(complexity.avg))?;
    writeln!(out)?;

    if !items.is_empty() {
        writeln!(out, "RECIPES")?;
        writeln!(out, "{}", "-".repeat(25))?;
        for (i, item) in items.iter().enumerate() {
            writeln!(out, "{:2}. {}", i + 1, item.name())?;
            writeln!(
                out,
                "    {} | {} | {:.1} stars | {:.2} | fit {:.0}%",
                item.section,
                item.style_title(),
                item.stars,
                item.price,
                item.segment_fit
            )?;
            if item.ingredients.len() <= REPORT_INGREDIENTS_FULL {
                writeln!(out, "    {}", item.ingredients.join(", "))?;
            } else {
                let shown: Vec<&str> = item
                    .ingredients
                    .iter()
                    .take(REPORT_INGREDIENTS_SHOWN)
                    .map(String::as_str)
                    .collect();
                writeln!(
                    out,
                    "    {}... (+{} more)",
                    shown.join(", "),
                    item.ingredients.len() - REPORT_INGREDIENTS_SHOWN
                )?;
            }
            let upgrades: Vec<String> = item
                .tiers
                .iter()
                .filter(|(_, tier)| **tier != Tier::Normal)
                .map(|(name, tier)| format!("{name} ({})", tier.display_name()))
                .collect();
            if !upgrades.is_empty() {
                writeln!(out, "    Upgrades: {}", upgrades.join(", "))?;
            }
            writeln!(out)?;
        }
    }

    if !ctx.warnings.is_empty() {
        writeln!(out, "WARNINGS")?;
        writeln!(out, "{}", "-".repeat(35))?;
        for (i, warning) in ctx.warnings.iter().enumerate() {
            writeln!(out, "{:2}. {warning}", i + 1)?;
        }
        writeln!(out)?;
    }

    if !ctx.recommendations.is_empty() {
        writeln!(out, "SUGGESTIONS")?;
        writeln!(out, "{}", "-".repeat(45))?;
        writeln!(out, "Templates worth unlocking:")?;
        for (i, rec) in ctx.recommendations.iter().enumerate() {
            writeln!(
                out,
                "{:2}. {} ({} points) - {}",
                i + 1,
                rec.template,
                rec.points,
                rec.reason
            )?;
        }
        writeln!(out)?;
    }

    let dist = kpis.cost_vs_target.distribution;
    writeln!(out, "COST VS TARGET")?;
    writeln!(out, "{}", "-".repeat(30))?;
    let total = dist.total();
    if total > 0 {
        for (label, count) in [
            ("Under target", dist.under_target),
            ("On target", dist.on_target),
            ("Over target", dist.over_target),
        ] {
            writeln!(
                out,
                "{label}: {count} recipes ({:.1}%)",
                share_pct(count, total)
            )?;
        }
    }
    writeln!(out)?;

    writeln!(out, "{heavy}")?;
    writeln!(out, "Generated by chef-planner")?;
    write!(out, "{heavy}")
}

/// `chef_planner_<segment>_<YYYYmmdd_HHMM>.<ext>`, segment lowercased with
/// spaces replaced by underscores.
pub fn export_filename(kind: ExportKind, segment_name: &str, at: DateTime<Utc>) -> String {
    let segment = segment_name.to_lowercase().replace(' ', "_");
    format!(
        "chef_planner_{segment}_{}.{}",
        at.format("%Y%m%d_%H%M"),
        kind.extension()
    )
}
