use chef_planner_core::{
    FlavorAxis, FlavorProfile, Ingredient, MatchEdge, ScoreWeights, SectionInfo, Segment, Tier,
};

use crate::{DataSource, Dataset};

fn segment(
    name: &str,
    favourite: &[&str],
    secondary: &[&str],
    weights: ScoreWeights,
    expectations: &[(&str, f64)],
    sections: &[(&str, f64, f64)],
) -> Segment {
    let mut segment = Segment::new(name);
    segment
        .favourite_tags
        .extend(favourite.iter().map(|t| (*t).to_string()));
    segment
        .secondary_favourite_tags
        .extend(secondary.iter().map(|t| (*t).to_string()));
    segment.weights = weights;
    segment.expectations = expectations
        .iter()
        .map(|(tag, w)| ((*tag).to_string(), *w))
        .collect();
    segment.sections = sections
        .iter()
        .map(|(section, probability, cost_expectation)| {
            (
                (*section).to_string(),
                SectionInfo {
                    probability: *probability,
                    cost_expectation: *cost_expectation,
                },
            )
        })
        .collect();
    segment
}

fn flavor(values: [u32; 6]) -> FlavorProfile {
    let mut profile = FlavorProfile::default();
    for (axis, value) in FlavorAxis::ALL.into_iter().zip(values) {
        profile.set(axis, value);
    }
    profile
}

fn ingredient(name: &str, tags: &[&str], values: [u32; 6], costs: [(f64, u32); 3]) -> Ingredient {
    let mut out = Ingredient::new(name)
        .with_tags(tags.iter().copied())
        .with_flavor(flavor(values));
    for (tier, (unit_cost, points_cost)) in Tier::ALL.into_iter().zip(costs) {
        out = out.with_cost(tier, unit_cost, points_cost);
    }
    out
}

/// Two segments, three ingredients, three matches: enough to exercise every
/// planner path without any files.
pub(crate) fn dataset() -> Dataset {
    let segments = vec![
        segment(
            "Gourmet",
            &["Wine", "Seafood"],
            &["Meat", "Dairy"],
            ScoreWeights {
                tag: 1.0,
                price: 0.0,
                evaluation: 1.0,
            },
            &[("Wine", 0.8), ("Seafood", 0.9)],
            &[
                ("MainCourse", 1.0, 25.0),
                ("Appetizer", 0.8, 15.0),
                ("Dessert", 0.9, 12.0),
            ],
        ),
        segment(
            "BlueCollar",
            &["Carbs", "Beer"],
            &["Meat"],
            ScoreWeights {
                tag: 0.7,
                price: 1.0,
                evaluation: 0.0,
            },
            &[("Carbs", 0.9), ("Beer", 0.8)],
            &[
                ("MainCourse", 1.0, 12.0),
                ("Appetizer", 0.3, 6.0),
                ("Dessert", 0.2, 4.0),
            ],
        ),
    ];

    // SOUR, SALT, ACID, SWEET, FAT, UMAMI
    let ingredients = vec![
        ingredient(
            "Salmon",
            &["Seafood", "Premium"],
            [1, 2, 0, 0, 4, 3],
            [(3.0, 2), (5.0, 3), (8.0, 4)],
        ),
        ingredient(
            "Pasta",
            &["Carbs", "Basic"],
            [0, 1, 0, 1, 1, 1],
            [(0.5, 1), (1.0, 1), (2.0, 2)],
        ),
        ingredient(
            "Tomato",
            &["Vegetables", "Acid"],
            [3, 0, 4, 2, 0, 2],
            [(0.8, 1), (1.5, 1), (2.5, 2)],
        ),
    ];

    let edges = vec![
        MatchEdge::new("Salmon", "Pasta", 2),
        MatchEdge::new("Salmon", "Tomato", 3),
        MatchEdge::new("Pasta", "Tomato", 3),
    ];

    Dataset::from_parts(ingredients, edges, segments, Vec::new(), DataSource::Demo)
}
