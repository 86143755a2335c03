//! Menu-level view of evaluated recipes: the frozen [`MenuItem`] record,
//! KPIs and warnings for a customer segment, template unlock advice, and
//! CSV/JSON/text exports.

mod analytics;
mod export;
mod item;
mod recommend;

pub use analytics::{
    menu_health_score, menu_kpis, variety_stats, variety_warnings, ComplexityStats,
    CostDistribution, CostVsTarget, MenuKpis, SectionCoverage, TagCoverage, VarietyStats,
};
pub use export::{
    export_csv, export_filename, export_json, export_report, ExportKind, ReportContext,
    FORMAT_VERSION,
};
pub use item::{MenuItem, Placement};
pub use recommend::{unlock_recommendations, Recommendation};
