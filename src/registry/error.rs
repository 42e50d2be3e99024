use thiserror::Error;
use crate::error::ErrorKind;

/// Errors that can occur while registering or resolving entities
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Entity '{0}' not found")]
    UnknownEntity(String),
    #[error("Invalid schema for entity '{entity}': {reason}")]
    InvalidEntitySchema { entity: String, reason: String },
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::UnknownEntity(_) => ErrorKind::UnknownEntity,
            RegistryError::InvalidEntitySchema { .. } => ErrorKind::InvalidEntitySchema,
        }
    }
}
