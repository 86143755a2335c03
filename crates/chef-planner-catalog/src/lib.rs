use std::collections::{BTreeMap, BTreeSet};

use chef_planner_core::{DietRule, Template, TemplateCategory};
use DietRule::{Carb, Dessert as Sweet, Fish, Meat as MeatRule, Neutral, Vegetarian as Veg};
use TemplateCategory::{Burger, Dessert, Fish as FishCat, Meat, PastaRice, Vegetarian};

/// Unlock price of a signature (top-tier) template.
pub const SIGNATURE_POINTS: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateEntry {
    pub name: &'static str,
    pub category: TemplateCategory,
    pub points: u32,
    pub rule: DietRule,
    pub description: &'static str,
}

impl TemplateEntry {
    pub fn to_template(&self) -> Template {
        Template::new(self.name, self.category, self.points, self.rule)
    }

    pub const fn is_free(&self) -> bool {
        self.points == 0
    }
}

const fn entry(
    name: &'static str,
    category: TemplateCategory,
    points: u32,
    rule: DietRule,
    description: &'static str,
) -> TemplateEntry {
    TemplateEntry {
        name,
        category,
        points,
        rule,
        description,
    }
}

static TEMPLATES: [TemplateEntry; 42] = [
    entry("Pasta", PastaRice, 0, Carb, "Classic pasta dishes with sauce and toppings"),
    entry("Gnocchi", PastaRice, 15, Carb, "Soft potato dumplings with rich sauces"),
    entry("Lasagne", PastaRice, 5, Carb, "Layered pasta with meat, cheese and sauce"),
    entry("Stuffed Pasta", PastaRice, 15, Carb, "Ravioli, tortellini and filled pasta"),
    entry("Sautéed Rice", PastaRice, 0, Carb, "Quick-cooked rice with vegetables and proteins"),
    entry("Risotto", PastaRice, 15, Carb, "Creamy Italian rice dish"),
    entry("Paella", PastaRice, 15, Carb, "Spanish rice dish with seafood or meat"),
    entry("Rice Pie", PastaRice, 5, Carb, "Baked rice dish with filling"),
    entry("Grilled Meat", Meat, 0, MeatRule, "Flame-grilled meat with seasonings"),
    entry("Meat Stew", Meat, 0, MeatRule, "Slow-cooked tender meat in sauce"),
    entry("Roasted Meat", Meat, 5, MeatRule, "Oven-roasted meat with herbs"),
    entry("Boiled Meat", Meat, 5, MeatRule, "Tender boiled meat preparations"),
    entry("Stuffed Meat", Meat, 15, MeatRule, "Meat rolls with filling"),
    entry("Meatballs", Meat, 5, MeatRule, "Seasoned ground meat balls"),
    entry("Braised Meat", Meat, 15, MeatRule, "Slow-braised meat in liquid"),
    entry("Meat Tartare", Meat, 15, MeatRule, "Raw seasoned meat delicacy"),
    entry("Fried Meat", Meat, 15, MeatRule, "Crispy fried meat preparations"),
    entry("Grilled Fish", FishCat, 0, Fish, "Flame-grilled fish with herbs"),
    entry("Steamed Fish", FishCat, 0, Fish, "Delicate steamed fish preparations"),
    entry("Roasted Fish", FishCat, 5, Fish, "Oven-baked fish with vegetables"),
    entry("Fish Soup", FishCat, 5, Fish, "Rich fish broth with seafood"),
    entry("Fish Tartare", FishCat, 15, Fish, "Raw seasoned fish delicacy"),
    entry("Fried Fish", FishCat, 15, Fish, "Crispy fried fish preparations"),
    entry("Sautéed Veggies", Vegetarian, 0, Veg, "Pan-fried vegetables with seasonings"),
    entry("Salad", Vegetarian, 0, Veg, "Fresh mixed vegetables and greens"),
    entry("Grilled Veggies", Vegetarian, 0, Veg, "Flame-grilled vegetable medley"),
    entry("Steamed Veggies", Vegetarian, 5, Veg, "Healthy steamed vegetable dishes"),
    entry("Roasted Veggies", Vegetarian, 5, Veg, "Oven-roasted vegetable combinations"),
    entry("Vegetable Soup", Vegetarian, 5, Veg, "Hearty vegetable broth"),
    entry("Velvety", Vegetarian, 15, Veg, "Smooth cream-based vegetable soups"),
    entry("Fried Veggies", Vegetarian, 15, Veg, "Crispy fried vegetable preparations"),
    entry("Pie", Dessert, 0, Sweet, "Sweet or savory baked pies"),
    entry("Cookies", Dessert, 0, Sweet, "Sweet baked cookie varieties"),
    entry("Semifreddo", Dessert, 5, Sweet, "Semi-frozen Italian dessert"),
    entry("Pastries", Dessert, 5, Sweet, "Delicate baked pastry items"),
    entry("Cheesecake", Dessert, 5, Sweet, "Rich cream cheese dessert"),
    entry("Ice Cream", Dessert, 15, Sweet, "Frozen dessert with mix-ins"),
    entry("Fried Dessert", Dessert, 15, Sweet, "Crispy fried sweet treats"),
    entry("Millefeuille", Dessert, 15, Sweet, "Layered puff pastry dessert"),
    entry("Hamburger", Burger, 0, Neutral, "Classic beef burger with toppings"),
    entry("Fish Burger", Burger, 0, Fish, "Seafood burger with sauce"),
    entry("Veggie Burger", Burger, 0, Veg, "Plant-based burger patty"),
];

pub fn all() -> &'static [TemplateEntry] {
    &TEMPLATES
}

/// Exact name first, then a case-insensitive match.
pub fn template(name: &str) -> Option<&'static TemplateEntry> {
    let name = name.trim();
    TEMPLATES
        .iter()
        .find(|t| t.name == name)
        .or_else(|| TEMPLATES.iter().find(|t| t.name.eq_ignore_ascii_case(name)))
}

pub fn description(name: &str) -> &'static str {
    template(name).map_or("Recipe template", |t| t.description)
}

/// Templates grouped by category, each group sorted by points then name.
pub fn by_category() -> BTreeMap<TemplateCategory, Vec<&'static TemplateEntry>> {
    let mut groups: BTreeMap<TemplateCategory, Vec<&'static TemplateEntry>> = BTreeMap::new();
    for entry in &TEMPLATES {
        groups.entry(entry.category).or_default().push(entry);
    }
    for group in groups.values_mut() {
        group.sort_by(|a, b| a.points.cmp(&b.points).then_with(|| a.name.cmp(b.name)));
    }
    groups
}

/// Names of templates that are free to use without spending points.
pub fn free_templates() -> BTreeSet<&'static str> {
    TEMPLATES
        .iter()
        .filter(|t| t.is_free())
        .map(|t| t.name)
        .collect()
}

/// Locked templates whose price fits in `points`, cheapest first.
pub fn unlockable(points: u32, unlocked: &BTreeSet<String>) -> Vec<&'static TemplateEntry> {
    let mut out: Vec<&'static TemplateEntry> = TEMPLATES
        .iter()
        .filter(|t| !t.is_free() && !unlocked.contains(t.name) && t.points <= points)
        .collect();
    out.sort_by(|a, b| a.points.cmp(&b.points).then_with(|| a.name.cmp(b.name)));
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlockCheck {
    Unknown,
    AlreadyUnlocked,
    Affordable { cost: u32, remaining: u32 },
    TooExpensive { cost: u32, missing: u32 },
}

impl UnlockCheck {
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Affordable { .. })
    }

    pub fn message(&self, name: &str) -> String {
        match self {
            Self::Unknown => format!("unknown template '{name}'"),
            Self::AlreadyUnlocked => format!("{name} is already unlocked"),
            Self::Affordable { cost, remaining } => {
                format!("{name} unlocks for {cost} points, {remaining} left")
            }
            Self::TooExpensive { cost, missing } => {
                format!("{name} costs {cost} points, {missing} more needed")
            }
        }
    }
}

pub fn validate_unlock(name: &str, points: u32, unlocked: &BTreeSet<String>) -> UnlockCheck {
    let Some(entry) = template(name) else {
        return UnlockCheck::Unknown;
    };
    if entry.is_free() || unlocked.contains(entry.name) {
        return UnlockCheck::AlreadyUnlocked;
    }
    match points.checked_sub(entry.points) {
        Some(remaining) => UnlockCheck::Affordable {
            cost: entry.points,
            remaining,
        },
        None => UnlockCheck::TooExpensive {
            cost: entry.points,
            missing: entry.points - points,
        },
    }
}

/// Points needed to unlock every named template. Unknown names cost nothing.
pub fn total_unlock_cost<S: AsRef<str>>(names: &[S]) -> u32 {
    names
        .iter()
        .filter_map(|n| template(n.as_ref()))
        .map(|t| t.points)
        .sum()
}

/// Menu sections a dish can be placed in.
pub const SECTION_NAMES: [&str; 7] = [
    "Appetizer",
    "MainCourse",
    "SideDish",
    "Soup",
    "Salad",
    "Dessert",
    "Beverage",
];

static SECTION_SUGGESTIONS: [(&str, &[(&str, &str)]); 6] = [
    (
        "Appetizer",
        &[
            ("Salad", "Perfect fresh starter for any segment"),
            ("Grilled Veggies", "Light and healthy option"),
            ("Stuffed Pasta", "Premium appetizer for upscale segments"),
        ],
    ),
    (
        "MainCourse",
        &[
            ("Pasta", "Universal crowd-pleaser"),
            ("Grilled Meat", "Classic main course"),
            ("Grilled Fish", "Healthy protein option"),
            ("Risotto", "Premium comfort food"),
            ("Paella", "Show-stopping signature dish"),
        ],
    ),
    (
        "SideDish",
        &[
            ("Sautéed Veggies", "Essential healthy side"),
            ("Roasted Veggies", "Elevated vegetable preparation"),
        ],
    ),
    (
        "Soup",
        &[
            ("Vegetable Soup", "Comforting starter"),
            ("Fish Soup", "Premium seafood option"),
        ],
    ),
    ("Salad", &[("Salad", "Essential fresh option")]),
    (
        "Dessert",
        &[
            ("Cookies", "Simple crowd-pleaser"),
            ("Ice Cream", "Premium frozen dessert"),
            ("Millefeuille", "Signature pastry for gourmet segments"),
        ],
    ),
];

/// Suggested templates (with a short pitch) for a menu section.
pub fn section_suggestions(section: &str) -> &'static [(&'static str, &'static str)] {
    SECTION_SUGGESTIONS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(section))
        .map(|(_, list)| *list)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use chef_planner_core::{check_anchor, AnchorCheck, Ingredient};

    use super::*;

    #[test]
    fn catalog_shape() {
        assert_eq!(all().len(), 42);
        let groups = by_category();
        let sizes: Vec<usize> = TemplateCategory::ALL
            .iter()
            .map(|c| groups.get(c).map_or(0, Vec::len))
            .collect();
        assert_eq!(sizes, vec![8, 9, 6, 8, 8, 3]);

        let names: BTreeSet<&str> = all().iter().map(|t| t.name).collect();
        assert_eq!(names.len(), 42, "template names are unique");
    }

    #[test]
    fn burgers_carry_their_own_diet_rule() {
        let rules: Vec<DietRule> = ["Hamburger", "Fish Burger", "Veggie Burger"]
            .iter()
            .filter_map(|n| template(n))
            .map(|t| t.rule)
            .collect();
        assert_eq!(rules, vec![DietRule::Neutral, DietRule::Fish, DietRule::Vegetarian]);
    }

    #[test]
    fn hamburger_takes_any_anchor() {
        let hamburger = template("Hamburger")
            .map(TemplateEntry::to_template)
            .unwrap_or_else(|| panic!("Hamburger missing from catalog"));
        let portobello = Ingredient::new("Portobello").with_tags(["Mushroom", "Vegetables"]);
        assert_eq!(check_anchor(&hamburger, &portobello), AnchorCheck::Compatible);
    }

    #[test]
    fn lookup_is_forgiving_about_case() {
        assert_eq!(template("grilled fish").map(|t| t.name), Some("Grilled Fish"));
        assert!(template("Sushi").is_none());
        assert_eq!(description("Sushi"), "Recipe template");
    }

    #[test]
    fn groups_are_sorted_by_points_then_name() {
        let groups = by_category();
        let pasta: Vec<&str> = groups
            .get(&TemplateCategory::PastaRice)
            .map(|g| g.iter().map(|t| t.name).collect())
            .unwrap_or_default();
        assert_eq!(pasta.first(), Some(&"Pasta"));
        assert_eq!(pasta.get(1), Some(&"Sautéed Rice"));
        assert_eq!(pasta.get(2), Some(&"Lasagne"));
    }

    #[test]
    fn unlock_rules() {
        let mut unlocked = BTreeSet::new();
        assert_eq!(validate_unlock("Pasta", 0, &unlocked), UnlockCheck::AlreadyUnlocked);
        assert_eq!(
            validate_unlock("Risotto", 20, &unlocked),
            UnlockCheck::Affordable {
                cost: 15,
                remaining: 5
            }
        );
        assert_eq!(
            validate_unlock("Risotto", 10, &unlocked),
            UnlockCheck::TooExpensive {
                cost: 15,
                missing: 5
            }
        );
        assert_eq!(validate_unlock("Sushi", 10, &unlocked), UnlockCheck::Unknown);

        unlocked.insert("Risotto".to_string());
        assert_eq!(validate_unlock("Risotto", 20, &unlocked), UnlockCheck::AlreadyUnlocked);
        assert!(unlockable(5, &unlocked).iter().all(|t| t.points <= 5));
        assert!(unlockable(50, &unlocked).iter().all(|t| t.name != "Risotto"));
        assert_eq!(total_unlock_cost(&["Risotto", "Lasagne", "Sushi"]), 20);
    }

    #[test]
    fn suggestions_by_section() {
        assert_eq!(section_suggestions("maincourse").len(), 5);
        assert!(section_suggestions("Brunch").is_empty());
        for (name, _) in SECTION_SUGGESTIONS.iter().flat_map(|(_, list)| list.iter()) {
            assert!(template(name).is_some(), "{name} is not a catalog template");
        }
    }
}
