use std::fs;
use std::path::{Path, PathBuf};

use chef_planner_core::{CompatibilityIndex, Ingredient, IngredientCatalog, MatchEdge, Segment};
use thiserror::Error;
use tracing::{info, warn};

mod demo;
mod raw;

pub use raw::{parse_ingredients, parse_matches, parse_segments, Parsed};

pub const CUSTOMERS_FILE: &str = "customers.json";
pub const INGREDIENTS_FILE: &str = "ingredients.json";
pub const MATCHES_FILE: &str = "matches.json";

#[derive(Debug, Error)]
pub enum DataError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Directory(PathBuf),
    Demo,
}

/// Everything the planner reads once per data load. Never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub catalog: IngredientCatalog,
    pub edges: Vec<MatchEdge>,
    pub index: CompatibilityIndex,
    pub segments: Vec<Segment>,
    pub warnings: Vec<String>,
    pub source: DataSource,
}

impl Dataset {
    pub fn from_parts(
        ingredients: Vec<Ingredient>,
        edges: Vec<MatchEdge>,
        segments: Vec<Segment>,
        warnings: Vec<String>,
        source: DataSource,
    ) -> Self {
        let index = CompatibilityIndex::build(&edges);
        Self {
            catalog: IngredientCatalog::new(ingredients),
            edges,
            index,
            segments,
            warnings,
            source,
        }
    }

    /// Loads `customers.json`, `ingredients.json` and `matches.json` from
    /// `dir`. Warnings are prefixed with the file they came from.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, DataError> {
        let dir = dir.as_ref();
        let read = |file: &str| -> Result<String, DataError> { Ok(fs::read_to_string(dir.join(file))?) };

        let customers = parse_segments(&read(CUSTOMERS_FILE)?)?;
        let ingredients = parse_ingredients(&read(INGREDIENTS_FILE)?)?;
        let matches = parse_matches(&read(MATCHES_FILE)?)?;

        let mut warnings = Vec::new();
        warnings.extend(customers.warnings.into_iter().map(|w| format!("Customers: {w}")));
        warnings.extend(ingredients.warnings.into_iter().map(|w| format!("Ingredients: {w}")));
        warnings.extend(matches.warnings.into_iter().map(|w| format!("Matches: {w}")));

        let dataset = Self::from_parts(
            ingredients.items,
            matches.items,
            customers.items,
            warnings,
            DataSource::Directory(dir.to_path_buf()),
        );
        dataset.warn_unknown_partners();
        info!(
            dir = %dir.display(),
            ingredients = dataset.catalog.len(),
            matches = dataset.index.edge_count(),
            segments = dataset.segments.len(),
            warnings = dataset.warnings.len(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    /// Loads `dir` when given, falling back to the demo data when it is
    /// absent or unusable. The reason for a fallback is kept in `warnings`.
    pub fn load_dir_or_demo(dir: Option<&Path>) -> Self {
        let Some(dir) = dir else {
            return Self::demo();
        };
        match Self::load_dir(dir) {
            Ok(dataset) => dataset,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "data files unusable, using demo data");
                let mut dataset = Self::demo();
                dataset
                    .warnings
                    .push(format!("Using demo data: {} ({e})", dir.display()));
                dataset
            }
        }
    }

    pub fn demo() -> Self {
        demo::dataset()
    }

    pub const fn is_demo(&self) -> bool {
        matches!(self.source, DataSource::Demo)
    }

    /// Exact name first, then case-insensitive.
    pub fn segment(&self, name: &str) -> Option<&Segment> {
        self.segments
            .iter()
            .find(|s| s.name == name)
            .or_else(|| self.segments.iter().find(|s| s.name.eq_ignore_ascii_case(name)))
    }

    pub fn segment_names(&self) -> Vec<&str> {
        self.segments.iter().map(|s| s.name.as_str()).collect()
    }

    fn warn_unknown_partners(&self) {
        let unknown = self
            .edges
            .iter()
            .flat_map(|e| [&e.a, &e.b])
            .filter(|name| !self.catalog.contains(name))
            .count();
        if unknown > 0 {
            warn!(unknown, "match endpoints reference ingredients missing from the catalog");
        }
    }
}
