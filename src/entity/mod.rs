//! Catalog entities and their identity cache.
//!
//! [`Item`] and [`Collection`] each declare a fixed set of [`AsyncField`]s.
//! [`Entity`] is the kind-tagged handle used where either may appear
//! (search results, cache lookups).

mod cache;
mod collection;
mod item;

use std::sync::Arc;

pub use cache::EntityCache;
pub use collection::Collection;
pub use item::{item_thumbnail_urls, Item};
pub use tubeforge_common::{EntityKey, EntityKind};

use crate::field::AsyncField;

/// A shared handle to an item or a collection.
#[derive(Debug, Clone)]
pub enum Entity {
    Item(Arc<Item>),
    Collection(Arc<Collection>),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Item(_) => EntityKind::Item,
            Entity::Collection(_) => EntityKind::Collection,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Entity::Item(item) => item.id(),
            Entity::Collection(collection) => collection.id(),
        }
    }

    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.kind(), self.id())
    }

    pub fn title(&self) -> &AsyncField<String> {
        match self {
            Entity::Item(item) => item.title(),
            Entity::Collection(collection) => collection.title(),
        }
    }

    pub fn channel(&self) -> &AsyncField<String> {
        match self {
            Entity::Item(item) => item.channel(),
            Entity::Collection(collection) => collection.channel(),
        }
    }

    pub fn thumbnails(&self) -> &AsyncField<Vec<String>> {
        match self {
            Entity::Item(item) => item.thumbnails(),
            Entity::Collection(collection) => collection.thumbnails(),
        }
    }

    pub fn as_item(&self) -> Option<&Arc<Item>> {
        match self {
            Entity::Item(item) => Some(item),
            Entity::Collection(_) => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Arc<Collection>> {
        match self {
            Entity::Collection(collection) => Some(collection),
            Entity::Item(_) => None,
        }
    }

    /// Whether both handles point at the same shared object.
    pub fn ptr_eq(&self, other: &Entity) -> bool {
        match (self, other) {
            (Entity::Item(a), Entity::Item(b)) => Arc::ptr_eq(a, b),
            (Entity::Collection(a), Entity::Collection(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
