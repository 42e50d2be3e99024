//! Error types for ecotransform

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors that can occur during parsing
#[derive(Debug, Error)]
pub enum ParseError {
    /// IO error reading file
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// YAML deserialization error
    #[error("Invalid YAML: {source}")]
    Yaml {
        #[from]
        source: serde_yaml::Error,
    },
    /// JSON deserialization error (data files)
    #[error("Invalid JSON: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

impl From<std::io::Error> for ParseError {
    fn from(err: std::io::Error) -> Self {
        ParseError::Io {
            path: String::new(),
            source: err,
        }
    }
}

/// The kind of a failure, as reported in run failure records.
///
/// Every error type of the crate maps onto exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ErrorKind {
    UnknownEntity,
    InvalidEntitySchema,
    CyclicHierarchy,
    AmbiguousStatsRow,
    DuplicateId,
    MalformedRelation,
    UnknownPlugin,
    PluginParamError,
    PluginDataError,
    UnresolvedReference,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
