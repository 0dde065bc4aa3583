//! Table of every record kind that references stored images.
//!
//! Scanner and optimizer iterate this table instead of carrying one
//! hand-written routine per kind. Each entry names the field holding the
//! reference(s), how many slots the field has, and the backend functions
//! used to list and repoint records of that kind.

use crate::domain::value_objects::EntityKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceDescriptor {
    pub kind: EntityKind,
    /// Record field holding the blob id (or ordered list of ids)
    pub field: &'static str,
    /// Maximum number of blob ids the field holds
    pub max_slots: usize,
    /// Query returning records with a non-empty reference field
    pub list_function: &'static str,
    /// Mutation replacing the reference field
    pub update_function: &'static str,
}

impl ReferenceDescriptor {
    /// True when the field is an ordered list rather than a single id
    pub fn is_multi_slot(&self) -> bool {
        self.max_slots > 1
    }
}

pub static REFERENCE_TABLE: [ReferenceDescriptor; 4] = [
    ReferenceDescriptor {
        kind: EntityKind::Cafe,
        field: "imageStorageId",
        max_slots: 1,
        list_function: "cafes:listWithImages",
        update_function: "cafes:updateImage",
    },
    ReferenceDescriptor {
        kind: EntityKind::Product,
        field: "imageStorageId",
        max_slots: 1,
        list_function: "products:listWithImages",
        update_function: "products:updateImage",
    },
    ReferenceDescriptor {
        kind: EntityKind::User,
        field: "avatarStorageId",
        max_slots: 1,
        list_function: "users:listWithImages",
        update_function: "users:updateImage",
    },
    ReferenceDescriptor {
        kind: EntityKind::Review,
        field: "imageStorageIds",
        max_slots: 2,
        list_function: "reviews:listWithImages",
        update_function: "reviews:updateImages",
    },
];

impl EntityKind {
    pub fn descriptor(&self) -> &'static ReferenceDescriptor {
        match self {
            EntityKind::Cafe => &REFERENCE_TABLE[0],
            EntityKind::Product => &REFERENCE_TABLE[1],
            EntityKind::User => &REFERENCE_TABLE[2],
            EntityKind::Review => &REFERENCE_TABLE[3],
        }
    }
}
