//! Shared test harness for integration tests.
//!
//! Provides [`FakeApi`], an in-memory [`RemoteCatalogApi`] that records every
//! call and can be told to fail specific requests, and [`FakeResolver`], a
//! scripted [`StreamResolver`]. [`TestHarness`] wires both into a
//! [`Catalog`].

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use tubeforge::locator::{StreamInfo, StreamKind, StreamResolver};
use tubeforge::{Catalog, CatalogSettings};
use tubeforge_api::{
    CollectionRecord, ItemRecord, MemberPage, MemberRecord, RemoteCatalogApi, SearchRecord,
};
use tubeforge_common::{Error, Result};

/// How long a test waits for background loads before giving up.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(10);

/// One recorded remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Search {
        query: String,
        max_results: usize,
    },
    ListItems(Vec<String>),
    ListCollections(Vec<String>),
    Members {
        collection_id: String,
        page_token: Option<String>,
        page_size: usize,
    },
}

/// In-memory remote catalog.
///
/// Member page tokens are the offset of the next page, so pagination is
/// deterministic.
#[derive(Default)]
pub struct FakeApi {
    items: Mutex<HashMap<String, ItemRecord>>,
    collections: Mutex<HashMap<String, CollectionRecord>>,
    members: Mutex<HashMap<String, Vec<MemberRecord>>>,
    search_results: Mutex<Vec<SearchRecord>>,
    /// A `list_items` call fails when it asks for any of these ids.
    failing_ids: Mutex<HashSet<String>>,
    /// `list_collection_members` fails on the page with this zero-based index.
    failing_page: Mutex<Option<usize>>,
    /// `list_collection_members` keeps returning a token on empty pages.
    endless_tokens: Mutex<bool>,
    fail_search: Mutex<bool>,
    calls: Mutex<Vec<Call>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_item(&self, id: &str, title: &str, channel: &str, duration: &str) {
        self.items.lock().insert(
            id.to_string(),
            ItemRecord {
                id: id.to_string(),
                title: Some(title.to_string()),
                channel_title: Some(channel.to_string()),
                duration: Some(duration.to_string()),
            },
        );
    }

    pub fn add_record(&self, record: ItemRecord) {
        self.items.lock().insert(record.id.clone(), record);
    }

    pub fn add_collection(&self, record: CollectionRecord) {
        self.collections.lock().insert(record.id.clone(), record);
    }

    /// Register `count` members for `collection_id`, with ids `<prefix>000`
    /// upwards. Returns the member ids in order.
    pub fn add_members(&self, collection_id: &str, prefix: &str, count: usize) -> Vec<String> {
        let records: Vec<MemberRecord> = (0..count)
            .map(|i| MemberRecord {
                member_id: format!("{prefix}{i:03}"),
                title: Some(format!("Member {i}")),
            })
            .collect();
        let ids = records.iter().map(|r| r.member_id.clone()).collect();
        self.members
            .lock()
            .insert(collection_id.to_string(), records);
        ids
    }

    pub fn set_member_records(&self, collection_id: &str, records: Vec<MemberRecord>) {
        self.members
            .lock()
            .insert(collection_id.to_string(), records);
    }

    pub fn set_search_results(&self, results: Vec<SearchRecord>) {
        *self.search_results.lock() = results;
    }

    pub fn fail_items_with(&self, id: &str) {
        self.failing_ids.lock().insert(id.to_string());
    }

    pub fn fail_member_page(&self, index: usize) {
        *self.failing_page.lock() = Some(index);
    }

    pub fn return_endless_tokens(&self) {
        *self.endless_tokens.lock() = true;
    }

    pub fn fail_search(&self) {
        *self.fail_search.lock() = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn list_items_calls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::ListItems(ids) => Some(ids),
                _ => None,
            })
            .collect()
    }

    pub fn list_collections_calls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::ListCollections(ids) => Some(ids),
                _ => None,
            })
            .collect()
    }

    /// `(page_token, page_size)` of every member page request.
    pub fn member_calls(&self) -> Vec<(Option<String>, usize)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Members {
                    page_token,
                    page_size,
                    ..
                } => Some((page_token, page_size)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

impl RemoteCatalogApi for FakeApi {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchRecord>> {
        self.record(Call::Search {
            query: query.to_string(),
            max_results,
        });
        if *self.fail_search.lock() {
            return Err(Error::api(503, "backend unavailable"));
        }
        Ok(self
            .search_results
            .lock()
            .iter()
            .take(max_results)
            .cloned()
            .collect())
    }

    fn list_items(&self, ids: &[String]) -> Result<Vec<ItemRecord>> {
        self.record(Call::ListItems(ids.to_vec()));
        {
            let failing = self.failing_ids.lock();
            if ids.iter().any(|id| failing.contains(id)) {
                return Err(Error::transport("connection reset"));
            }
        }
        let items = self.items.lock();
        Ok(ids.iter().filter_map(|id| items.get(id).cloned()).collect())
    }

    fn list_collections(&self, ids: &[String]) -> Result<Vec<CollectionRecord>> {
        self.record(Call::ListCollections(ids.to_vec()));
        let collections = self.collections.lock();
        Ok(ids
            .iter()
            .filter_map(|id| collections.get(id).cloned())
            .collect())
    }

    fn list_collection_members(
        &self,
        collection_id: &str,
        page_token: Option<&str>,
        page_size: usize,
    ) -> Result<MemberPage> {
        let page_index = self.member_calls().len();
        self.record(Call::Members {
            collection_id: collection_id.to_string(),
            page_token: page_token.map(str::to_string),
            page_size,
        });

        if *self.failing_page.lock() == Some(page_index) {
            return Err(Error::transport("timed out"));
        }

        let members = self.members.lock();
        let Some(all) = members.get(collection_id) else {
            return Err(Error::not_found("playlist", collection_id));
        };

        let start: usize = page_token.map_or(0, |t| t.parse().unwrap_or(0)).min(all.len());
        let end = (start + page_size).min(all.len());
        let next_page_token = if end < all.len() || *self.endless_tokens.lock() {
            Some(end.to_string())
        } else {
            None
        };

        Ok(MemberPage {
            items: all[start..end].to_vec(),
            next_page_token,
        })
    }
}

/// Scripted stream resolver; unknown ids fail like a deleted item.
#[derive(Default)]
pub struct FakeResolver {
    streams: Mutex<HashMap<String, Vec<StreamInfo>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeResolver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_audio(&self, item_id: &str, extension: &str, url: &str, kbps: f64) {
        self.streams
            .lock()
            .entry(item_id.to_string())
            .or_default()
            .push(StreamInfo {
                url: url.to_string(),
                extension: extension.to_string(),
                kind: StreamKind::AudioOnly,
                bitrate_kbps: Some(kbps),
            });
    }

    pub fn add_video_only(&self, item_id: &str, extension: &str, url: &str) {
        self.streams
            .lock()
            .entry(item_id.to_string())
            .or_default()
            .push(StreamInfo {
                url: url.to_string(),
                extension: extension.to_string(),
                kind: StreamKind::VideoOnly,
                bitrate_kbps: None,
            });
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl StreamResolver for FakeResolver {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn streams(&self, item_id: &str) -> Result<Vec<StreamInfo>> {
        self.calls.lock().push(item_id.to_string());
        self.streams
            .lock()
            .get(item_id)
            .cloned()
            .ok_or_else(|| Error::not_found("video", item_id))
    }
}

/// A [`Catalog`] over fresh fakes.
pub struct TestHarness {
    pub catalog: Catalog,
    pub api: Arc<FakeApi>,
    pub resolver: Arc<FakeResolver>,
}

impl TestHarness {
    /// Create a new harness with default settings.
    pub fn new() -> Self {
        Self::with_settings(CatalogSettings::default())
    }

    pub fn with_settings(settings: CatalogSettings) -> Self {
        let api = FakeApi::new();
        let resolver = FakeResolver::new();
        let catalog = Catalog::new(api.clone(), resolver.clone(), settings);
        Self {
            catalog,
            api,
            resolver,
        }
    }

    /// Wait for every background job and fail the test if they do not finish.
    pub fn settle(&self) {
        assert!(
            self.catalog.wait_idle(IDLE_TIMEOUT),
            "background jobs did not finish"
        );
    }
}

/// Ids `<prefix>000`, `<prefix>001`, ... registered as items on `api`.
pub fn seed_items(api: &FakeApi, prefix: &str, count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let id = format!("{prefix}{i:03}");
            api.add_item(&id, &format!("Title {i}"), "Channel", "PT3M20S");
            id
        })
        .collect()
}
