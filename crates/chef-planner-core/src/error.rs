use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlannerError {
    #[error("anchor ingredient '{anchor}' not found")]
    AnchorNotFound { anchor: String },

    #[error("template '{template}' incompatible with anchor: {reason}")]
    TemplateViolation { template: String, reason: String },

    #[error("invalid recipe variant: {0}")]
    InvalidVariant(String),
}
