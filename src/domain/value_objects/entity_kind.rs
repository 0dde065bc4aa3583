use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Kind of catalog record that can reference stored images
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Cafe,
    Product,
    User,
    /// Carries an ordered list of up to two images
    Review,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Cafe,
        EntityKind::Product,
        EntityKind::User,
        EntityKind::Review,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Cafe => "cafe",
            EntityKind::Product => "product",
            EntityKind::User => "user",
            EntityKind::Review => "review",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cafe" | "cafes" => Ok(EntityKind::Cafe),
            "product" | "products" => Ok(EntityKind::Product),
            "user" | "users" => Ok(EntityKind::User),
            "review" | "reviews" => Ok(EntityKind::Review),
            _ => Err(DomainError::InvalidEntityKind(s.to_string())),
        }
    }
}
