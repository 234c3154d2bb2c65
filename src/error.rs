//! Failures surfaced by catalog lookups and requirement calculations

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// A caller-supplied number violates a documented precondition.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    #[error("recipe '{recipe}' of '{building}' has no inputs")]
    NoInputs { building: String, recipe: String },

    /// An optional catalog feature is absent, e.g. a faction without beehives.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl CatalogError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        CatalogError::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        CatalogError::InvalidArgument(message.into())
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
