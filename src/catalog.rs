//! The catalog service: owner of the entity cache, worker pool and remote
//! collaborators.
//!
//! A [`Catalog`] replaces process-wide singletons with one explicit context.
//! Entities keep a weak reference back to it so their accessors can schedule
//! loads; once the catalog is dropped, new loads resolve as unavailable.

use std::sync::{Arc, Weak};
use std::time::Duration;

use anyhow::Context;
use tracing::{debug, info};
use tubeforge_api::{RemoteCatalogApi, SearchRecord, YoutubeDataApi};
use tubeforge_common::limits::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_MAX_MEMBERS, DEFAULT_MAX_WORKERS, DEFAULT_SEARCH_RESULTS,
};
use tubeforge_common::{EntityKind, Error, Result};

use crate::config::Config;
use crate::entity::{Collection, Entity, EntityCache, Item};
use crate::loader::{select_thumbnails, BatchLoader};
use crate::locator::{StreamResolver, YtDlpResolver};
use crate::pool::WorkerPool;
use crate::uri::parse_reference;

/// Tunables consumed by the catalog core.
#[derive(Debug, Clone)]
pub struct CatalogSettings {
    /// Cap on `members` and on the reported `item_count` of collections.
    pub max_members: usize,
    /// Number of results requested per search.
    pub search_results: usize,
    /// Upper bound on concurrently running worker threads.
    pub max_workers: usize,
    /// Entities kept in the identity cache.
    pub cache_capacity: usize,
    /// Container extension preferred for audio streams.
    pub preferred_container: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            max_members: DEFAULT_MAX_MEMBERS,
            search_results: DEFAULT_SEARCH_RESULTS,
            max_workers: DEFAULT_MAX_WORKERS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            preferred_container: "m4a".to_string(),
        }
    }
}

pub(crate) struct CatalogInner {
    pub(crate) settings: CatalogSettings,
    pub(crate) api: Arc<dyn RemoteCatalogApi>,
    pub(crate) resolver: Arc<dyn StreamResolver>,
    pub(crate) pool: WorkerPool,
    pub(crate) cache: EntityCache,
}

impl CatalogInner {
    pub(crate) fn loader(&self) -> BatchLoader {
        BatchLoader::new(
            Arc::clone(&self.api),
            self.pool.clone(),
            self.settings.max_members,
        )
    }

    fn entity_from_search(&self, record: SearchRecord) -> Entity {
        match record.kind {
            EntityKind::Item => {
                let item = self.cache.item(&record.id);
                item.seed(record.title, record.channel_title);
                Entity::Item(item)
            }
            EntityKind::Collection => {
                let collection = self.cache.collection(&record.id);
                collection.seed(
                    record.title,
                    record.channel_title,
                    select_thumbnails(&record.thumbnails),
                );
                Entity::Collection(collection)
            }
        }
    }
}

/// Cached, lazily loaded access to remote items and collections.
///
/// # Examples
///
/// ```no_run
/// use tubeforge::{config, Catalog};
///
/// let config = config::load_config_or_default(None).unwrap();
/// let catalog = Catalog::from_config(&config).unwrap();
///
/// let item = catalog.item("dQw4w9WgXcQ");
/// let length = item.length_seconds(); // starts the load, does not block
/// println!("{:?}", length.read());    // blocks until the value arrives
/// ```
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
}

impl Catalog {
    pub fn new(
        api: Arc<dyn RemoteCatalogApi>,
        resolver: Arc<dyn StreamResolver>,
        settings: CatalogSettings,
    ) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<CatalogInner>| CatalogInner {
            pool: WorkerPool::new(settings.max_workers),
            cache: EntityCache::new(settings.cache_capacity, weak.clone()),
            api,
            resolver,
            settings,
        });
        Self { inner }
    }

    /// Build a catalog backed by the YouTube Data API and yt-dlp.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let api = YoutubeDataApi::with_options(
            config.youtube.endpoint.clone(),
            config.youtube.api_key.clone(),
            Duration::from_secs(config.youtube.timeout_secs),
        )
        .context("Failed to build YouTube API client")?;

        let resolver = match &config.resolver.yt_dlp_path {
            Some(path) => YtDlpResolver::new(path.clone()),
            None => YtDlpResolver::from_path()
                .context("yt-dlp not found on PATH; set resolver.yt_dlp_path")?,
        }
        .with_timeout(Duration::from_secs(config.resolver.timeout_secs));

        info!(
            api = api.name(),
            max_workers = config.catalog.max_workers,
            cache_capacity = config.catalog.cache_capacity,
            "Catalog initialized"
        );

        Ok(Self::new(
            Arc::new(api),
            Arc::new(resolver),
            config.settings(),
        ))
    }

    pub fn settings(&self) -> &CatalogSettings {
        &self.inner.settings
    }

    pub fn cache(&self) -> &EntityCache {
        &self.inner.cache
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.inner.pool
    }

    /// The cached entity for `(kind, id)`, created on first request.
    pub fn get(&self, kind: EntityKind, id: &str) -> Entity {
        self.inner.cache.get(kind, id)
    }

    pub fn item(&self, id: &str) -> Arc<Item> {
        self.inner.cache.item(id)
    }

    pub fn collection(&self, id: &str) -> Arc<Collection> {
        self.inner.cache.collection(id)
    }

    /// Resolve a URI, watch URL or bare id to its entity.
    pub fn lookup(&self, reference: &str) -> Option<Entity> {
        let key = parse_reference(reference)?;
        debug!(reference, key = %key, "Resolved reference");
        Some(self.get(key.kind, &key.id))
    }

    /// Search the remote catalog.
    ///
    /// Values the search response already carries (title, channel, and for
    /// collections the thumbnails) are stored on the returned entities, so
    /// reading them needs no further remote call.
    pub fn search(&self, query: &str) -> Result<Vec<Entity>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::Validation("search query is empty".into()));
        }

        info!(api = self.inner.api.name(), query, "Searching catalog");
        let records = self
            .inner
            .api
            .search(query, self.inner.settings.search_results)?;

        Ok(records
            .into_iter()
            .map(|record| self.inner.entity_from_search(record))
            .collect())
    }

    /// Start loading the detail fields of `items` in as few remote calls as
    /// possible. Returns the number of calls scheduled.
    pub fn load_items(&self, items: &[Arc<Item>]) -> usize {
        self.inner.loader().load(items.to_vec())
    }

    /// Collection counterpart of [`load_items`](Self::load_items).
    pub fn load_collections(&self, collections: &[Arc<Collection>]) -> usize {
        self.inner.loader().load(collections.to_vec())
    }

    /// Wait until every scheduled load has finished.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.inner.pool.wait_idle(timeout)
    }
}
