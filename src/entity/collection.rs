//! Collections: ordered, capped lists of items.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::warn;
use tubeforge_api::{CollectionRecord, RemoteCatalogApi};
use tubeforge_common::{EntityKind, Result};

use super::Item;
use crate::catalog::CatalogInner;
use crate::expander;
use crate::field::AsyncField;
use crate::loader::{clamp_count, select_thumbnails, DetailGroup};

/// A collection of items.
///
/// `title`, `channel`, `item_count` and `thumbnails` come from one batched
/// call. `members` is expanded page by page in a single background job and
/// is capped at the catalog's `max_members`.
pub struct Collection {
    id: String,
    catalog: Weak<CatalogInner>,
    /// Held while the detail group moves out of `unset`.
    details_lock: Mutex<()>,
    title: AsyncField<String>,
    channel: AsyncField<String>,
    item_count: AsyncField<u64>,
    thumbnails: AsyncField<Vec<String>>,
    members: AsyncField<Vec<Arc<Item>>>,
}

impl Collection {
    pub(crate) fn new(id: impl Into<String>, catalog: Weak<CatalogInner>) -> Self {
        Self {
            id: id.into(),
            catalog,
            details_lock: Mutex::new(()),
            title: AsyncField::new(),
            channel: AsyncField::new(),
            item_count: AsyncField::new(),
            thumbnails: AsyncField::new(),
            members: AsyncField::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(self: &Arc<Self>) -> &AsyncField<String> {
        self.with_details(&self.title)
    }

    pub fn channel(self: &Arc<Self>) -> &AsyncField<String> {
        self.with_details(&self.channel)
    }

    /// Reported number of members, clamped to `max_members`.
    pub fn item_count(self: &Arc<Self>) -> &AsyncField<u64> {
        self.with_details(&self.item_count)
    }

    pub fn thumbnails(self: &Arc<Self>) -> &AsyncField<Vec<String>> {
        self.with_details(&self.thumbnails)
    }

    /// Member items in collection order. Each member's own details start
    /// loading in the background as its page arrives.
    pub fn members(self: &Arc<Self>) -> &AsyncField<Vec<Arc<Item>>> {
        if self.members.ensure_pending() {
            match self.catalog.upgrade() {
                Some(catalog) => {
                    let collection = Arc::clone(self);
                    let job_catalog = Arc::clone(&catalog);
                    catalog.pool.submit(move || {
                        let members = expander::expand_members(&job_catalog, &collection.id);
                        collection.members.resolve(Some(members));
                        Ok(())
                    });
                }
                None => {
                    warn!(id = %self.id, "Catalog dropped; members unavailable");
                    self.members.resolve(None);
                }
            }
        }
        &self.members
    }

    /// Store values carried by a search result.
    pub(crate) fn seed(
        &self,
        title: Option<String>,
        channel: Option<String>,
        thumbnails: Vec<String>,
    ) {
        if let Some(title) = title {
            self.title.resolve(Some(title));
        }
        if let Some(channel) = channel {
            self.channel.resolve(Some(channel));
        }
        self.thumbnails.resolve(Some(thumbnails));
    }

    fn with_details<'a, T>(self: &'a Arc<Self>, field: &'a AsyncField<T>) -> &'a AsyncField<T> {
        if field.is_unset() {
            match self.catalog.upgrade() {
                Some(catalog) => {
                    catalog.loader().load(vec![Arc::clone(self)]);
                }
                None => {
                    warn!(id = %self.id, "Catalog dropped; collection details unavailable");
                    if self.mark_details_pending() {
                        self.apply_details(None, 0);
                    }
                }
            }
        }
        field
    }
}

impl DetailGroup for Collection {
    type Record = CollectionRecord;

    const KIND: EntityKind = EntityKind::Collection;

    fn id(&self) -> &str {
        &self.id
    }

    fn mark_details_pending(&self) -> bool {
        let _group = self.details_lock.lock();
        self.title.ensure_pending()
            | self.item_count.ensure_pending()
            | self.thumbnails.ensure_pending()
            | self.channel.ensure_pending()
    }

    fn fetch_details(
        api: &dyn RemoteCatalogApi,
        ids: &[String],
    ) -> Result<Vec<CollectionRecord>> {
        api.list_collections(ids)
    }

    fn record_id(record: &CollectionRecord) -> &str {
        &record.id
    }

    fn apply_details(&self, record: Option<&CollectionRecord>, max_members: usize) {
        match record {
            Some(record) => {
                self.title.resolve(record.title.clone());
                self.channel.resolve(record.channel_title.clone());
                self.item_count.resolve(
                    record
                        .item_count
                        .map(|count| clamp_count(count, max_members)),
                );
                self.thumbnails
                    .resolve(Some(select_thumbnails(&record.thumbnails)));
            }
            None => {
                self.title.resolve(None);
                self.channel.resolve(None);
                self.item_count.resolve(None);
                self.thumbnails.resolve(None);
            }
        }
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("item_count", &self.item_count)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tubeforge_api::Thumbnail;

    fn detached(id: &str) -> Arc<Collection> {
        Arc::new(Collection::new(id, Weak::new()))
    }

    #[test]
    fn count_clamped_to_max_members() {
        let collection = detached("PL1");
        collection.mark_details_pending();
        collection.apply_details(
            Some(&CollectionRecord {
                id: "PL1".into(),
                title: Some("Mix".into()),
                channel_title: Some("Chan".into()),
                item_count: Some(500),
                thumbnails: vec![
                    Thumbnail::new("default", "d.jpg"),
                    Thumbnail::new("medium", "m.jpg"),
                ],
            }),
            60,
        );
        assert_eq!(collection.item_count().read(), Some(60));
        assert_eq!(collection.thumbnails().read().unwrap(), vec!["m.jpg"]);
        assert_eq!(collection.title().read().as_deref(), Some("Mix"));
    }

    #[test]
    fn absent_record_resolves_everything_unavailable() {
        let collection = detached("PL1");
        collection.mark_details_pending();
        collection.apply_details(None, 60);
        assert_eq!(collection.title().read(), None);
        assert_eq!(collection.item_count().read(), None);
        assert_eq!(collection.thumbnails().read(), None);
    }

    #[test]
    fn detached_members_are_unavailable() {
        let collection = detached("PL1");
        assert!(collection.members().read().is_none());
    }

    #[test]
    fn concurrent_group_marking_has_one_owner() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Barrier;
        use std::thread;

        for _ in 0..200 {
            let entity = detached("PL1");
            let barrier = Arc::new(Barrier::new(8));
            let owners = Arc::new(AtomicUsize::new(0));

            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let entity = Arc::clone(&entity);
                    let barrier = Arc::clone(&barrier);
                    let owners = Arc::clone(&owners);
                    thread::spawn(move || {
                        barrier.wait();
                        if entity.mark_details_pending() {
                            owners.fetch_add(1, Ordering::SeqCst);
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            assert_eq!(owners.load(Ordering::SeqCst), 1);
        }
    }
}
