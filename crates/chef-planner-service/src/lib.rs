//! JSON-RPC command surface for the chef planner.
//!
//! [`PlannerService`] owns one loaded dataset and one session (drafts, menu,
//! unlocked templates) and answers line-delimited JSON-RPC 2.0 requests.

pub mod config;
mod error;
pub mod protocol;
mod server;
mod session;

pub use config::ServiceConfig;
pub use error::ServiceError;
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use server::PlannerService;
