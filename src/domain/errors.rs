use thiserror::Error;

use super::value_objects::EntityKind;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid blob id: {0:?}")]
    InvalidBlobId(String),

    #[error("Invalid entity kind: {0}")]
    InvalidEntityKind(String),

    #[error("{kind} records hold at most {max} image references, got {actual}")]
    TooManyReferences {
        kind: EntityKind,
        max: usize,
        actual: usize,
    },

    #[error("Reference slot {index} out of range for {kind} record {entity_id}")]
    SlotOutOfRange {
        kind: EntityKind,
        entity_id: String,
        index: usize,
    },

    #[error("Invalid entity id: {0:?}")]
    InvalidEntityId(String),
}
