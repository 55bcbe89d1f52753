//! Single playable items.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::warn;
use tubeforge_api::{ItemRecord, RemoteCatalogApi};
use tubeforge_common::{EntityKind, Result};

use crate::catalog::CatalogInner;
use crate::field::AsyncField;
use crate::loader::{parse_duration, DetailGroup};
use crate::locator;

/// Thumbnail URL template for a bare item id, with the two size variants.
const THUMBNAIL_BASE: &str = "https://i.ytimg.com/vi";
const THUMBNAIL_VARIANTS: [&str; 2] = ["mqdefault", "hqdefault"];

/// Thumbnail URLs for an item, derived from its id without a remote call.
pub fn item_thumbnail_urls(id: &str) -> Vec<String> {
    THUMBNAIL_VARIANTS
        .iter()
        .map(|variant| format!("{THUMBNAIL_BASE}/{id}/{variant}.jpg"))
        .collect()
}

/// A single playable item.
///
/// Obtain instances through [`Catalog::item`](crate::Catalog::item) so that
/// each id maps to one shared object. Every accessor is non-blocking: it
/// starts the load on first use and returns the field handle; call
/// [`AsyncField::read`] when the value is actually needed.
///
/// `title`, `channel` and `length_seconds` are fetched together in one
/// batched call; `thumbnails` is computed locally; `audio_locator` is
/// resolved separately and is much more expensive.
pub struct Item {
    id: String,
    catalog: Weak<CatalogInner>,
    /// Held while the detail group moves out of `unset`.
    details_lock: Mutex<()>,
    title: AsyncField<String>,
    channel: AsyncField<String>,
    length_seconds: AsyncField<u64>,
    thumbnails: AsyncField<Vec<String>>,
    audio_locator: AsyncField<String>,
}

impl Item {
    pub(crate) fn new(id: impl Into<String>, catalog: Weak<CatalogInner>) -> Self {
        Self {
            id: id.into(),
            catalog,
            details_lock: Mutex::new(()),
            title: AsyncField::new(),
            channel: AsyncField::new(),
            length_seconds: AsyncField::new(),
            thumbnails: AsyncField::new(),
            audio_locator: AsyncField::new(),
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

    /// Duration in whole seconds.
    pub fn length_seconds(self: &Arc<Self>) -> &AsyncField<u64> {
        self.with_details(&self.length_seconds)
    }

    pub fn thumbnails(&self) -> &AsyncField<Vec<String>> {
        if self.thumbnails.ensure_pending() {
            self.thumbnails.resolve(Some(item_thumbnail_urls(&self.id)));
        }
        &self.thumbnails
    }

    /// Playable audio URL. `None` once resolved means the item could not be
    /// streamed (deleted, restricted, no suitable encoding).
    pub fn audio_locator(self: &Arc<Self>) -> &AsyncField<String> {
        if self.audio_locator.ensure_pending() {
            match self.catalog.upgrade() {
                Some(catalog) => {
                    let item = Arc::clone(self);
                    let resolver = Arc::clone(&catalog.resolver);
                    let preferred = catalog.settings.preferred_container.clone();
                    catalog.pool.submit(move || {
                        let url = locator::resolve_audio_locator(
                            resolver.as_ref(),
                            &item.id,
                            &preferred,
                        );
                        item.audio_locator.resolve(url);
                        Ok(())
                    });
                }
                None => {
                    warn!(id = %self.id, "Catalog dropped; audio locator unavailable");
                    self.audio_locator.resolve(None);
                }
            }
        }
        &self.audio_locator
    }

    /// Store values that arrived as a side effect of another call (search
    /// results, collection pages). Absent values are left for the detail load.
    pub(crate) fn seed(&self, title: Option<String>, channel: Option<String>) {
        if let Some(title) = title {
            self.title.resolve(Some(title));
        }
        if let Some(channel) = channel {
            self.channel.resolve(Some(channel));
        }
    }

    fn with_details<'a, T>(self: &'a Arc<Self>, field: &'a AsyncField<T>) -> &'a AsyncField<T> {
        if field.is_unset() {
            match self.catalog.upgrade() {
                Some(catalog) => {
                    catalog.loader().load(vec![Arc::clone(self)]);
                }
                None => {
                    warn!(id = %self.id, "Catalog dropped; item details unavailable");
                    if self.mark_details_pending() {
                        self.apply_details(None, 0);
                    }
                }
            }
        }
        field
    }
}

impl DetailGroup for Item {
    type Record = ItemRecord;

    const KIND: EntityKind = EntityKind::Item;

    fn id(&self) -> &str {
        &self.id
    }

    fn mark_details_pending(&self) -> bool {
        let _group = self.details_lock.lock();
        // Non-short-circuiting: every field must leave `unset`.
        self.title.ensure_pending()
            | self.length_seconds.ensure_pending()
            | self.channel.ensure_pending()
    }

    fn fetch_details(api: &dyn RemoteCatalogApi, ids: &[String]) -> Result<Vec<ItemRecord>> {
        api.list_items(ids)
    }

    fn record_id(record: &ItemRecord) -> &str {
        &record.id
    }

    fn apply_details(&self, record: Option<&ItemRecord>, _max_members: usize) {
        match record {
            Some(record) => {
                self.title.resolve(record.title.clone());
                self.channel.resolve(record.channel_title.clone());
                self.length_seconds
                    .resolve(Some(record.duration.as_deref().map_or(0, parse_duration)));
            }
            None => {
                self.title.resolve(None);
                self.channel.resolve(None);
                self.length_seconds.resolve(None);
            }
        }
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("length_seconds", &self.length_seconds)
            .finish_non_exhaustive()
    }
}
