use thiserror::Error;
use crate::error::ErrorKind;

/// Errors that can occur while resolving `@key.path` references
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    /// The root key was not produced by an earlier step
    #[error("Unresolved reference '{reference}': no prior step produced '{key}'")]
    Unresolved { reference: String, key: String },
    /// An intermediate key or index is missing
    #[error("Unresolved reference '{reference}': '{segment}' not found")]
    MissingPath { reference: String, segment: String },
    /// Not a valid `@key.path` expression
    #[error("Malformed reference '{0}'")]
    Malformed(String),
}

impl ReferenceError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::UnresolvedReference
    }
}
