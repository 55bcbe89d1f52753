//! Batched loading of entity detail fields.
//!
//! [`BatchLoader::load`] takes every entity that still has an unscheduled
//! detail field, marks the group pending, and issues one remote list call per
//! chunk of at most [`BATCH_CHUNK_SIZE`] entities. Chunks keep the caller's
//! order so the sequence of remote calls is reproducible (record/replay
//! tests depend on it). Each chunk runs as one worker-pool job.
//!
//! A failed call resolves the whole chunk to `None`; an id missing from an
//! otherwise good response resolves just that entity to `None`.
//!
//! The decoding helpers ([`parse_duration`], [`clamp_count`],
//! [`select_thumbnails`]) turn raw record values into field values.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::{debug, warn};
use tubeforge_api::{RemoteCatalogApi, Thumbnail};
use tubeforge_common::limits::BATCH_CHUNK_SIZE;
use tubeforge_common::{EntityKind, Result};

use crate::pool::WorkerPool;

/// Thumbnail variants kept for collections.
const COLLECTION_THUMBNAIL_KEYS: [&str; 2] = ["medium", "high"];

/// An entity kind whose detail fields are populated together by one remote
/// list call.
pub trait DetailGroup: Send + Sync + Sized + 'static {
    /// Raw record the remote list call returns per entity.
    type Record: Send + 'static;

    const KIND: EntityKind;

    fn id(&self) -> &str;

    /// Mark every field of the group pending. Returns `true` if at least one
    /// field moved out of `unset`, i.e. this caller now owes a load.
    fn mark_details_pending(&self) -> bool;

    /// Issue the remote list call for `ids`.
    fn fetch_details(api: &dyn RemoteCatalogApi, ids: &[String]) -> Result<Vec<Self::Record>>;

    fn record_id(record: &Self::Record) -> &str;

    /// Resolve every field of the group from `record`; `None` resolves them
    /// all as unavailable. Fields already resolved keep their value.
    fn apply_details(&self, record: Option<&Self::Record>, max_members: usize);
}

/// Groups entities into chunked remote calls executed on the worker pool.
#[derive(Clone)]
pub struct BatchLoader {
    api: Arc<dyn RemoteCatalogApi>,
    pool: WorkerPool,
    max_members: usize,
}

impl BatchLoader {
    pub fn new(api: Arc<dyn RemoteCatalogApi>, pool: WorkerPool, max_members: usize) -> Self {
        Self {
            api,
            pool,
            max_members,
        }
    }

    /// Schedule the detail group for `entities`. Returns the number of
    /// remote calls (jobs) submitted; zero when nothing needed loading.
    pub fn load<E: DetailGroup>(&self, entities: Vec<Arc<E>>) -> usize {
        let pending: Vec<Arc<E>> = entities
            .into_iter()
            .filter(|entity| entity.mark_details_pending())
            .collect();

        if pending.is_empty() {
            return 0;
        }

        debug!(
            kind = %E::KIND,
            count = pending.len(),
            "Scheduling batched detail load"
        );

        let mut jobs = 0;
        for chunk in pending.chunks(BATCH_CHUNK_SIZE) {
            let chunk = chunk.to_vec();
            let api = Arc::clone(&self.api);
            let max_members = self.max_members;
            self.pool.submit(move || {
                load_chunk(api.as_ref(), &chunk, max_members);
                Ok(())
            });
            jobs += 1;
        }
        jobs
    }
}

fn load_chunk<E: DetailGroup>(api: &dyn RemoteCatalogApi, chunk: &[Arc<E>], max_members: usize) {
    let ids: Vec<String> = chunk.iter().map(|entity| entity.id().to_string()).collect();

    let records: HashMap<String, E::Record> = match E::fetch_details(api, &ids) {
        Ok(records) => records
            .into_iter()
            .map(|record| (E::record_id(&record).to_string(), record))
            .collect(),
        Err(e) => {
            warn!(
                api = api.name(),
                kind = %E::KIND,
                count = ids.len(),
                error = %e,
                "Detail fetch failed; resolving chunk as unavailable"
            );
            HashMap::new()
        }
    };

    for entity in chunk {
        let record = records.get(entity.id());
        if record.is_none() {
            debug!(kind = %E::KIND, id = entity.id(), "No record returned");
        }
        entity.apply_details(record, max_members);
    }
}

fn duration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"PT(?:(?P<hours>\d+)H)?(?:(?P<minutes>\d+)M)?(?:(?P<seconds>\d+)S)?")
            .expect("duration pattern is valid")
    })
}

/// Convert a duration such as `PT1H2M10S` to seconds.
///
/// Missing components count as zero; anything unparseable yields 0.
pub fn parse_duration(raw: &str) -> u64 {
    let Some(caps) = duration_pattern().captures(raw) else {
        return 0;
    };
    let component = |name: &str| {
        caps.name(name)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };
    component("hours") * 3600 + component("minutes") * 60 + component("seconds")
}

/// Clamp a reported member count to the configured maximum.
pub fn clamp_count(raw: u64, max_members: usize) -> u64 {
    raw.min(max_members as u64)
}

/// URLs of the `medium` and `high` variants, in response order.
pub fn select_thumbnails(thumbnails: &[Thumbnail]) -> Vec<String> {
    thumbnails
        .iter()
        .filter(|t| COLLECTION_THUMBNAIL_KEYS.contains(&t.key.as_str()))
        .map(|t| t.url.clone())
        .collect()
}
