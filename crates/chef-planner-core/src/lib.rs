pub mod compat;
pub mod error;
pub mod fit;
pub mod generator;
pub mod pool;
pub mod pricing;
pub mod rating;
pub mod rules;
pub mod types;
pub mod variant;

pub use compat::*;
pub use error::PlannerError;
pub use fit::*;
pub use generator::*;
pub use pool::*;
pub use pricing::*;
pub use rating::*;
pub use rules::*;
pub use types::*;
pub use variant::*;
