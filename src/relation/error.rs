use thiserror::Error;
use crate::error::ErrorKind;

/// Errors that can occur while building a relation
#[derive(Debug, Error)]
pub enum RelationError {
    /// A parent-pointer cycle, including a node that is its own parent
    #[error("Hierarchy of '{entity}' contains a cycle through node '{node}'")]
    CyclicHierarchy { entity: String, node: String },
    /// More than one stats row for one group
    #[error("Stats entity '{entity}' has more than one row for id '{id}'")]
    AmbiguousStatsRow { entity: String, id: String },
    /// Two reference rows share an id
    #[error("Entity '{entity}' has duplicate id '{id}'")]
    DuplicateId { entity: String, id: String },
    /// A column named by the relation spec does not exist
    #[error("Relation column '{field}' not found in entity '{entity}'")]
    MissingField { entity: String, field: String },
    /// Unknown relation plugin or otherwise unusable spec
    #[error("Malformed relation: {0}")]
    Malformed(String),
}

impl RelationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RelationError::CyclicHierarchy { .. } => ErrorKind::CyclicHierarchy,
            RelationError::AmbiguousStatsRow { .. } => ErrorKind::AmbiguousStatsRow,
            RelationError::DuplicateId { .. } => ErrorKind::DuplicateId,
            RelationError::MissingField { .. } | RelationError::Malformed(_) => {
                ErrorKind::MalformedRelation
            }
        }
    }
}
