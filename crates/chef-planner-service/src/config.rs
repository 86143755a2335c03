use std::path::PathBuf;

pub const DATA_DIR_ENV: &str = "CHEF_PLANNER_DATA_DIR";
pub const SEED_ENV: &str = "CHEF_PLANNER_SEED";
pub const POINTS_ENV: &str = "CHEF_PLANNER_POINTS";
pub const LOG_ENV: &str = "CHEF_PLANNER_LOG";

pub const DEFAULT_POINTS: u32 = 50;
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Daemon settings. Every field has a usable default, so an empty
/// environment starts the planner on demo data with a random seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub data_dir: Option<PathBuf>,
    pub seed: Option<u64>,
    pub points: u32,
    pub log_filter: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            seed: None,
            points: DEFAULT_POINTS,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Empty or unparsable values
    /// fall back to the defaults.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            data_dir: read(DATA_DIR_ENV).map(PathBuf::from),
            seed: read(SEED_ENV).and_then(|v| v.parse().ok()),
            points: read(POINTS_ENV)
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_POINTS),
            log_filter: read(LOG_ENV).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub const fn with_points(mut self, points: u32) -> Self {
        self.points = points;
        self
    }
}
