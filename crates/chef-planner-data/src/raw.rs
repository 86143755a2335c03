use std::collections::{BTreeMap, BTreeSet};

use chef_planner_core::{
    FlavorAxis, FlavorProfile, Ingredient, MatchEdge, QualityCost, ScoreWeights, SectionInfo,
    Segment, Tier,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::DataError;

/// Items parsed from one data file plus the non-fatal problems met on the way.
#[derive(Debug, Clone)]
pub struct Parsed<T> {
    pub items: Vec<T>,
    pub warnings: Vec<String>,
}

impl<T> Default for Parsed<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Tags come either as a JSON array or as one comma-separated string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTags {
    List(Vec<String>),
    Joined(String),
}

impl RawTags {
    fn into_tags(self) -> Vec<String> {
        let raw = match self {
            Self::List(list) => list,
            Self::Joined(joined) => joined.split(',').map(str::to_string).collect(),
        };
        raw.into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct RawIngredient {
    #[serde(alias = "Name")]
    name: String,
    #[serde(default, alias = "Tags")]
    tags: Option<RawTags>,
    #[serde(default, alias = "FlavorValues")]
    flavor_values: Option<Value>,
    #[serde(default, alias = "Qualities")]
    quality_costs: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawSegment {
    name: String,
    #[serde(default)]
    favourite_tags: Option<RawTags>,
    #[serde(default)]
    secondary_favourite_tags: Option<RawTags>,
    #[serde(default)]
    tag_score_weight: Option<f64>,
    #[serde(default)]
    price_score_weight: Option<f64>,
    #[serde(default)]
    evaluation_score_weight: Option<f64>,
    #[serde(default)]
    expectations: BTreeMap<String, f64>,
    #[serde(default, alias = "menu_section_info")]
    sections: Option<Map<String, Value>>,
}

const fn default_cost(tier: Tier) -> QualityCost {
    match tier {
        Tier::Normal => QualityCost::new(1.0, 1),
        Tier::FirstChoice => QualityCost::new(2.0, 2),
        Tier::Gourmet => QualityCost::new(3.0, 3),
    }
}

fn entries(json: &str, kind: &str) -> Result<Vec<Map<String, Value>>, DataError> {
    let value: Value = serde_json::from_str(json)?;
    let Value::Array(items) = value else {
        return Err(DataError::InvalidInput(format!("{kind} data must be an array")));
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(map),
            _ => Err(DataError::InvalidInput(format!("{kind} {i} is not an object"))),
        })
        .collect()
}

fn has_any(map: &Map<String, Value>, keys: &[&str]) -> bool {
    keys.iter().any(|k| map.contains_key(*k))
}

/// Parses and normalises an ingredient file. Missing flavor axes become 0,
/// missing quality tiers get the stock 1/2/3 costs, and repeated names keep
/// the first entry.
pub fn parse_ingredients(json: &str) -> Result<Parsed<Ingredient>, DataError> {
    let maps = entries(json, "ingredient")?;
    if maps.is_empty() {
        return Err(DataError::InvalidInput("ingredients array is empty".to_string()));
    }

    let mut out = Parsed::default();
    let mut seen = BTreeSet::new();
    for (i, map) in maps.into_iter().enumerate() {
        if !has_any(&map, &["name", "Name"]) {
            return Err(DataError::InvalidInput(format!("ingredient {i} missing name field")));
        }
        let has_tags = has_any(&map, &["tags", "Tags"]);
        let has_flavor = has_any(&map, &["flavor_values", "FlavorValues"]);
        let has_costs = has_any(&map, &["quality_costs", "Qualities"]);

        let raw: RawIngredient = serde_json::from_value(Value::Object(map))
            .map_err(|e| DataError::InvalidInput(format!("ingredient {i}: {e}")))?;
        let name = raw.name.trim().to_string();
        if name.is_empty() {
            return Err(DataError::InvalidInput(format!("ingredient {i} has an empty name")));
        }

        let warn = |out: &mut Parsed<Ingredient>, what: &str| {
            out.warnings.push(format!("Ingredient '{name}': {what}"));
        };
        if !has_tags {
            warn(&mut out, "missing tags");
        }
        if !has_flavor {
            warn(&mut out, "missing flavor values");
        }
        if !has_costs {
            warn(&mut out, "missing quality costs");
        }
        if !seen.insert(name.clone()) {
            warn(&mut out, "duplicate entry ignored");
            continue;
        }

        let flavor = flavor_profile(raw.flavor_values.as_ref(), &mut out.warnings, &name);
        let mut ingredient = Ingredient::new(name.clone())
            .with_tags(raw.tags.map(RawTags::into_tags).unwrap_or_default())
            .with_flavor(flavor);
        ingredient.quality_costs = quality_costs(raw.quality_costs.as_ref(), &mut out.warnings, &name);
        out.items.push(ingredient);
    }
    Ok(out)
}

fn flavor_profile(value: Option<&Value>, warnings: &mut Vec<String>, name: &str) -> FlavorProfile {
    let mut profile = FlavorProfile::default();
    let Some(Value::Object(map)) = value else {
        return profile;
    };
    for (key, raw) in map {
        let Some(axis) = FlavorAxis::from_label(key) else {
            warnings.push(format!("Ingredient '{name}': unknown flavor axis '{key}'"));
            continue;
        };
        match raw.as_u64().and_then(|v| u32::try_from(v).ok()) {
            Some(v) => profile.set(axis, v),
            None => warnings.push(format!(
                "Ingredient '{name}': flavor {} must be a non-negative integer (found {raw})",
                axis.label()
            )),
        }
    }
    profile
}

fn quality_costs(
    value: Option<&Value>,
    warnings: &mut Vec<String>,
    name: &str,
) -> BTreeMap<Tier, QualityCost> {
    let provided = match value {
        Some(Value::Object(map)) => Some(map),
        _ => None,
    };
    Tier::ALL
        .into_iter()
        .map(|tier| {
            let fallback = default_cost(tier);
            let Some(Value::Object(entry)) = provided.and_then(|m| m.get(tier.label())) else {
                return (tier, fallback);
            };
            let field = |a: &str, b: &str| entry.get(a).or_else(|| entry.get(b));
            let mut unit_cost = field("unit_cost", "UnitCost")
                .and_then(Value::as_f64)
                .unwrap_or(fallback.unit_cost);
            if unit_cost < 0.0 {
                warnings.push(format!(
                    "Ingredient '{name}': negative {tier} unit cost clamped to 0"
                ));
                unit_cost = 0.0;
            }
            let points_cost = field("points_cost", "PointsCost")
                .and_then(Value::as_u64)
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(fallback.points_cost);
            (tier, QualityCost::new(unit_cost, points_cost))
        })
        .collect()
}

/// Parses a match file. Values outside 1..=3 are clamped into range with a
/// warning; an empty file is allowed.
pub fn parse_matches(json: &str) -> Result<Parsed<MatchEdge>, DataError> {
    let maps = entries(json, "match")?;
    let mut out = Parsed::default();
    if maps.is_empty() {
        out.warnings.push("Matches array is empty".to_string());
        return Ok(out);
    }

    for (i, map) in maps.into_iter().enumerate() {
        let a = endpoint(&map, "IngredientA", "A", i)?;
        let b = endpoint(&map, "IngredientB", "B", i)?;
        let Some(raw_value) = map.get("MatchValue") else {
            return Err(DataError::InvalidInput(format!("match {i} missing field: MatchValue")));
        };
        let value = match raw_value.as_i64() {
            Some(v @ 1..=3) => v,
            other => {
                out.warnings.push(format!(
                    "Match {i}: MatchValue should be 1, 2, or 3 (found {raw_value})"
                ));
                other.unwrap_or(1).clamp(1, 3)
            }
        };
        let value = u8::try_from(value).unwrap_or(1);
        if a == b {
            out.warnings.push(format!("Match {i}: '{a}' paired with itself, ignored"));
            continue;
        }
        out.items.push(MatchEdge::new(a, b, value));
    }
    Ok(out)
}

fn endpoint(map: &Map<String, Value>, key: &str, alias: &str, i: usize) -> Result<String, DataError> {
    map.get(key)
        .or_else(|| map.get(alias))
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| DataError::InvalidInput(format!("match {i} missing field: {key}")))
}

/// Parses the customer segment file.
pub fn parse_segments(json: &str) -> Result<Parsed<Segment>, DataError> {
    let maps = entries(json, "customer")?;
    if maps.is_empty() {
        return Err(DataError::InvalidInput("customer types array is empty".to_string()));
    }

    let mut out = Parsed::default();
    for (i, map) in maps.into_iter().enumerate() {
        if !map.contains_key("name") {
            return Err(DataError::InvalidInput(format!(
                "customer {i} missing required field: name"
            )));
        }
        let raw: RawSegment = serde_json::from_value(Value::Object(map))
            .map_err(|e| DataError::InvalidInput(format!("customer {i}: {e}")))?;
        let mut segment = Segment::new(raw.name.trim());
        let name = segment.name.clone();

        match raw.favourite_tags {
            Some(tags) => segment.favourite_tags.extend(tags.into_tags()),
            None => out.warnings.push(format!("Customer '{name}': missing favourite_tags")),
        }
        if let Some(tags) = raw.secondary_favourite_tags {
            segment.secondary_favourite_tags.extend(tags.into_tags());
        }

        let defaults = ScoreWeights::default();
        segment.weights = ScoreWeights {
            tag: raw.tag_score_weight.unwrap_or(defaults.tag),
            price: raw.price_score_weight.unwrap_or(defaults.price),
            evaluation: raw.evaluation_score_weight.unwrap_or(defaults.evaluation),
        };
        segment.expectations = raw.expectations;

        match raw.sections {
            None => out.warnings.push(format!("Customer '{name}': missing sections data")),
            Some(sections) => {
                for (section, info) in sections {
                    if let Some(info) = section_info(&info, &name, &section, &mut out.warnings) {
                        segment.sections.insert(section, info);
                    }
                }
            }
        }
        out.items.push(segment);
    }
    Ok(out)
}

fn section_info(
    value: &Value,
    customer: &str,
    section: &str,
    warnings: &mut Vec<String>,
) -> Option<SectionInfo> {
    let Value::Object(map) = value else {
        warnings.push(format!(
            "Customer '{customer}': section '{section}' is not an object"
        ));
        return None;
    };
    let defaults = SectionInfo::default();
    let cost_expectation = match map.get("cost_expectation").and_then(Value::as_f64) {
        Some(cost) => cost.max(0.0),
        None => {
            warnings.push(format!(
                "Customer '{customer}': section '{section}' missing cost_expectation"
            ));
            defaults.cost_expectation
        }
    };
    let probability = map
        .get("probability")
        .and_then(Value::as_f64)
        .map_or(defaults.probability, |p| p.clamp(0.0, 1.0));
    Some(SectionInfo {
        probability,
        cost_expectation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingredient_aliases_and_defaults() {
        let json = r#"[
            {"Name": "Lemon", "Tags": "Citrus, Acid, ", "FlavorValues": {"ACID": 4, "sour": 3},
             "Qualities": {"NORMAL": {"UnitCost": 0.4, "PointsCost": 1}}},
            {"name": "Salt"}
        ]"#;
        let parsed = parse_ingredients(json).unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert_eq!(parsed.items.len(), 2);

        let lemon = parsed.items.first().unwrap_or_else(|| panic!("lemon missing"));
        assert!(lemon.has_tag("Citrus") && lemon.has_tag("Acid"));
        assert_eq!(lemon.tags.len(), 2);
        assert_eq!(lemon.flavor(FlavorAxis::Acid), 4);
        assert_eq!(lemon.flavor(FlavorAxis::Sour), 3);
        assert_eq!(lemon.flavor(FlavorAxis::Umami), 0);
        assert!((lemon.unit_cost(Tier::Normal) - 0.4).abs() < 1e-9);
        assert!((lemon.unit_cost(Tier::Gourmet) - 3.0).abs() < 1e-9);

        // Salt has no tags, flavors or costs.
        assert_eq!(parsed.warnings.len(), 3);
    }

    #[test]
    fn structural_problems_are_errors() {
        assert!(matches!(parse_ingredients("{}"), Err(DataError::InvalidInput(_))));
        assert!(matches!(parse_ingredients("[]"), Err(DataError::InvalidInput(_))));
        assert!(matches!(parse_ingredients(r#"[{"tags": []}]"#), Err(DataError::InvalidInput(_))));
        assert!(matches!(parse_ingredients("[1]"), Err(DataError::InvalidInput(_))));
        assert!(matches!(parse_ingredients("not json"), Err(DataError::Serde(_))));
    }

    #[test]
    fn duplicate_ingredients_keep_first() {
        let json = r#"[
            {"name": "Egg", "tags": ["Dairy"], "flavor_values": {}, "quality_costs": {}},
            {"name": "Egg", "tags": ["Protein"], "flavor_values": {}, "quality_costs": {}}
        ]"#;
        let parsed = parse_ingredients(json).unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert_eq!(parsed.items.len(), 1);
        assert!(parsed.items.iter().all(|i| i.has_tag("Dairy")));
        assert_eq!(parsed.warnings, vec!["Ingredient 'Egg': duplicate entry ignored".to_string()]);
    }

    #[test]
    fn matches_accept_short_keys_and_clamp_values() {
        let json = r#"[
            {"IngredientA": "Salmon", "IngredientB": "Lemon", "MatchValue": 3},
            {"A": "Salmon", "B": "Dill", "MatchValue": 7},
            {"A": "Dill", "B": "Dill", "MatchValue": 2}
        ]"#;
        let parsed = parse_matches(json).unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert_eq!(
            parsed.items,
            vec![MatchEdge::new("Salmon", "Lemon", 3), MatchEdge::new("Salmon", "Dill", 3)]
        );
        assert_eq!(parsed.warnings.len(), 2);

        assert!(parse_matches(r#"[{"A": "Salmon", "MatchValue": 2}]"#).is_err());
        let empty = parse_matches("[]").unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert!(empty.items.is_empty());
        assert_eq!(empty.warnings.len(), 1);
    }

    #[test]
    fn segments_fill_defaults_and_warn() {
        let json = r#"[
            {"name": "Students", "price_score_weight": 1.0,
             "sections": {"MainCourse": {"probability": 0.9}, "Dessert": 3}},
            {"name": "Couples", "favourite_tags": "Wine, Dessert",
             "menu_section_info": {"Dessert": {"probability": 0.6, "cost_expectation": 8.0}}}
        ]"#;
        let parsed = parse_segments(json).unwrap_or_else(|e| panic!("parse failed: {e}"));
        let [students, couples] = parsed.items.as_slice() else {
            panic!("expected two segments");
        };

        assert!((students.weights.price - 1.0).abs() < 1e-9);
        assert!((students.weights.tag - 0.33).abs() < 1e-9);
        assert!((students.section("MainCourse").cost_expectation - 10.0).abs() < 1e-9);
        assert!(!students.sections.contains_key("Dessert"));

        assert!(couples.favourite_tags.contains("Wine"));
        assert!((couples.section("Dessert").cost_expectation - 8.0).abs() < 1e-9);

        // missing favourites, missing cost_expectation, non-object section
        assert_eq!(parsed.warnings.len(), 3);
    }
}
