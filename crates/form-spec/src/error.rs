use thiserror::Error;

use crate::validator::{ValidationError, summarize};

/// Failures raised by the validator factory.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to compile schema: {}", summarize(.0))]
    Compile(Vec<ValidationError>),
    #[error("unresolved schema reference '{0}'")]
    UnresolvedRef(String),
    #[error("data failed validation: {}", summarize(.0))]
    Validation(Vec<ValidationError>),
}

impl SchemaError {
    /// Per-field violations carried by the error, if any.
    pub fn errors(&self) -> &[ValidationError] {
        match self {
            SchemaError::Compile(errors) | SchemaError::Validation(errors) => errors,
            SchemaError::UnresolvedRef(_) => &[],
        }
    }
}

/// Failures raised while building a render plan.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("layout key '{0}' does not match any schema property")]
    UnknownKey(String),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("failed to render title template '{template}': {message}")]
    Template { template: String, message: String },
}
