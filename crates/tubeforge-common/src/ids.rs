//! Identity of catalog entities.
//!
//! An entity is identified by its kind plus the opaque id the remote
//! service assigned to it. Ids of different kinds live in separate
//! namespaces, so the pair is the cache key.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two kinds of catalog entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A single playable item.
    Item,
    /// An ordered list of items.
    Collection,
}

impl EntityKind {
    /// Lowercase name used in logs and keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Item => "item",
            EntityKind::Collection => "collection",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Cache identity of an entity: `(kind, id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityKey {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn item(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Item, id)
    }

    pub fn collection(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Collection, id)
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}
