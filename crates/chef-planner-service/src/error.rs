use chef_planner_core::PlannerError;
use thiserror::Error;

use crate::protocol::{DOMAIN_ERROR, INVALID_PARAMS, METHOD_NOT_FOUND};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("method not found")]
    MethodNotFound,
    #[error("invalid params: {0}")]
    InvalidParams(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Planner(#[from] PlannerError),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl ServiceError {
    pub const fn code(&self) -> i64 {
        match self {
            Self::MethodNotFound => METHOD_NOT_FOUND,
            Self::InvalidParams(_) => INVALID_PARAMS,
            Self::NotFound(_) | Self::Rejected(_) | Self::Planner(_) | Self::Serde(_) => {
                DOMAIN_ERROR
            }
        }
    }
}
