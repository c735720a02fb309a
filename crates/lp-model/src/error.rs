use lp_core::CoreError;
use thiserror::Error;

use crate::expr::ExprError;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Configuration error: {what}")]
    Config { what: String },

    #[error("Circular dependency or undefined names in constants: {}", names.join(", "))]
    CircularOrUndefinedConstant { names: Vec<String> },

    #[error("Unknown constant: {name}")]
    UnknownConstant { name: String },

    #[error("Failed to evaluate {context}: {source}")]
    Expression {
        context: String,
        #[source]
        source: ExprError,
    },

    #[error("Degenerate evaluation: {what}")]
    DegenerateEvaluation { what: String },

    #[error("Improper system: numerator degree {num_degree} exceeds denominator degree {den_degree}")]
    ImproperSystem { num_degree: usize, den_degree: usize },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ModelError {
    pub(crate) fn config(what: impl Into<String>) -> Self {
        ModelError::Config { what: what.into() }
    }

    pub(crate) fn expression(context: impl Into<String>, source: ExprError) -> Self {
        ModelError::Expression {
            context: context.into(),
            source,
        }
    }
}
