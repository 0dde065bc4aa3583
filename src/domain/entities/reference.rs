use serde::Serialize;

use crate::domain::{
    errors::DomainError,
    value_objects::{BlobId, EntityKind},
};

/// A single (kind, record, field, blob) reference tuple
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ImageReference {
    pub kind: EntityKind,
    pub entity_id: String,
    pub field: &'static str,
    pub blob_id: BlobId,
    /// Position within the reference field (always 0 for single-slot kinds)
    pub slot: usize,
}

/// A live record projected down to its id and image reference slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencedRecord {
    kind: EntityKind,
    entity_id: String,
    slots: Vec<BlobId>,
}

impl ReferencedRecord {
    pub fn new(
        kind: EntityKind,
        entity_id: impl Into<String>,
        slots: Vec<BlobId>,
    ) -> Result<Self, DomainError> {
        let entity_id = entity_id.into();
        if entity_id.trim().is_empty() {
            return Err(DomainError::InvalidEntityId(entity_id));
        }

        let max = kind.descriptor().max_slots;
        if slots.len() > max {
            return Err(DomainError::TooManyReferences {
                kind,
                max,
                actual: slots.len(),
            });
        }

        Ok(Self {
            kind,
            entity_id,
            slots,
        })
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn slots(&self) -> &[BlobId] {
        &self.slots
    }

    /// Every reference tuple carried by this record, in slot order
    pub fn references(&self) -> impl Iterator<Item = ImageReference> + '_ {
        let field = self.kind.descriptor().field;
        self.slots
            .iter()
            .enumerate()
            .map(move |(slot, blob_id)| ImageReference {
                kind: self.kind,
                entity_id: self.entity_id.clone(),
                field,
                blob_id: blob_id.clone(),
                slot,
            })
    }

    /// Replace the blob at `index`, keeping every other slot in place.
    ///
    /// Returns the blob id previously held by the slot.
    pub fn replace_slot(&mut self, index: usize, blob_id: BlobId) -> Result<BlobId, DomainError> {
        match self.slots.get_mut(index) {
            Some(slot) => Ok(std::mem::replace(slot, blob_id)),
            None => Err(DomainError::SlotOutOfRange {
                kind: self.kind,
                entity_id: self.entity_id.clone(),
                index,
            }),
        }
    }
}
