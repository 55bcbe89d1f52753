//! Process-wide identity map for entities.
//!
//! At most one [`Entity`] exists per `(kind, id)` while it is cached. The
//! map is bounded and evicts the least recently used entry. Eviction only
//! makes an entity undiscoverable; loads already holding it run to
//! completion.

use std::num::NonZeroUsize;
use std::sync::{Arc, Weak};

use lru::LruCache;
use parking_lot::Mutex;
use tracing::debug;
use tubeforge_common::{EntityKey, EntityKind};

use super::{Collection, Entity, Item};
use crate::catalog::CatalogInner;

pub struct EntityCache {
    entries: Mutex<LruCache<EntityKey, Entity>>,
    catalog: Weak<CatalogInner>,
}

impl EntityCache {
    /// A capacity of zero is treated as one.
    pub(crate) fn new(capacity: usize, catalog: Weak<CatalogInner>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            catalog,
        }
    }

    /// Return the cached entity for `(kind, id)`, creating it if needed.
    ///
    /// Lookup and insertion happen under one lock, so concurrent first
    /// requests for the same key all receive the same instance.
    pub fn get(&self, kind: EntityKind, id: &str) -> Entity {
        let key = EntityKey::new(kind, id);
        let mut entries = self.entries.lock();

        if let Some(entity) = entries.get(&key) {
            return entity.clone();
        }

        let entity = match kind {
            EntityKind::Item => Entity::Item(Arc::new(Item::new(id, self.catalog.clone()))),
            EntityKind::Collection => {
                Entity::Collection(Arc::new(Collection::new(id, self.catalog.clone())))
            }
        };

        if let Some((evicted, _)) = entries.push(key, entity.clone()) {
            debug!(key = %evicted, "Evicted least recently used entity");
        }
        entity
    }

    pub fn item(&self, id: &str) -> Arc<Item> {
        match self.get(EntityKind::Item, id) {
            Entity::Item(item) => item,
            Entity::Collection(_) => unreachable!("item key mapped to a collection"),
        }
    }

    pub fn collection(&self, id: &str) -> Arc<Collection> {
        match self.get(EntityKind::Collection, id) {
            Entity::Collection(collection) => collection,
            Entity::Item(_) => unreachable!("collection key mapped to an item"),
        }
    }

    /// Whether `(kind, id)` is cached, without refreshing its recency.
    pub fn contains(&self, kind: EntityKind, id: &str) -> bool {
        self.entries.lock().contains(&EntityKey::new(kind, id))
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    fn cache(capacity: usize) -> EntityCache {
        EntityCache::new(capacity, Weak::new())
    }

    #[test]
    fn same_key_same_instance() {
        let cache = cache(10);
        let a = cache.get(EntityKind::Item, "x");
        let b = cache.get(EntityKind::Item, "x");
        assert!(a.ptr_eq(&b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn kinds_have_separate_namespaces() {
        let cache = cache(10);
        let item = cache.get(EntityKind::Item, "x");
        let collection = cache.get(EntityKind::Collection, "x");
        assert!(!item.ptr_eq(&collection));
        assert_eq!(collection.kind(), EntityKind::Collection);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn concurrent_first_access_creates_one_instance() {
        let cache = Arc::new(cache(10));
        let barrier = Arc::new(Barrier::new(12));

        let handles: Vec<_> = (0..12)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache.item("race")
                })
            })
            .collect();

        let items: Vec<Arc<Item>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(items.iter().all(|item| Arc::ptr_eq(item, &items[0])));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = cache(2);
        let first = cache.item("a");
        cache.item("b");
        // Touch "a" so "b" becomes the eviction candidate.
        cache.item("a");
        cache.item("c");

        assert!(cache.contains(EntityKind::Item, "a"));
        assert!(!cache.contains(EntityKind::Item, "b"));
        assert!(cache.contains(EntityKind::Item, "c"));
        assert!(Arc::ptr_eq(&first, &cache.item("a")));
    }

    #[test]
    fn evicted_entity_is_recreated() {
        let cache = cache(1);
        let old = cache.item("a");
        cache.item("b");
        let fresh = cache.item("a");
        assert!(!Arc::ptr_eq(&old, &fresh));
    }

    #[test]
    fn zero_capacity_holds_one() {
        assert_eq!(cache(0).capacity(), 1);
    }
}
