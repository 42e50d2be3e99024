use thiserror::Error;
use crate::error::ErrorKind;
use crate::registry::RegistryError;
use crate::relation::RelationError;

/// Configuration errors found before any group runs.
///
/// An engine is never constructed from a configuration that fails validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("Dimension '{dimension}', widget '{widget}': unknown plugin '{plugin}'")]
    UnknownPlugin {
        dimension: String,
        widget: String,
        plugin: String,
    },
    #[error("Dimension '{dimension}', widget '{widget}': unknown source '{name}'")]
    UnknownSource {
        dimension: String,
        widget: String,
        name: String,
    },
    #[error("Dimension '{dimension}': {source}")]
    MalformedRelation {
        dimension: String,
        #[source]
        source: RelationError,
    },
    #[error("Dimension '{0}' has no source")]
    NoSource(String),
    #[error("Dimension '{dimension}' declares source '{name}' twice")]
    DuplicateSource { dimension: String, name: String },
    #[error("Dimension '{0}' is declared twice")]
    DuplicateDimension(String),
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValidationError::Registry(e) => e.kind(),
            ValidationError::UnknownPlugin { .. } => ErrorKind::UnknownPlugin,
            ValidationError::UnknownSource { .. }
            | ValidationError::MalformedRelation { .. }
            | ValidationError::NoSource(_)
            | ValidationError::DuplicateSource { .. }
            | ValidationError::DuplicateDimension(_) => ErrorKind::MalformedRelation,
        }
    }
}
