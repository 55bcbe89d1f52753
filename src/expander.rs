//! Page-by-page expansion of a collection's member list.

use std::sync::Arc;

use tracing::{debug, warn};
use tubeforge_common::limits::MAX_PAGE_SIZE;

use crate::catalog::CatalogInner;
use crate::entity::Item;

/// Fetch up to `max_members` members of `collection_id`.
///
/// Each page's items come from the entity cache, with their title seeded
/// when the page carries one; their remaining details start loading in the
/// background before the next page is requested. A failed page ends the
/// expansion and keeps whatever was gathered so far; so does an empty page,
/// even one that still returns a continuation token.
pub(crate) fn expand_members(catalog: &CatalogInner, collection_id: &str) -> Vec<Arc<Item>> {
    let max_members = catalog.settings.max_members;
    let loader = catalog.loader();
    let mut members: Vec<Arc<Item>> = Vec::new();
    let mut page_token: Option<String> = None;

    while members.len() < max_members {
        let page_size = MAX_PAGE_SIZE.min(max_members - members.len());

        let page = match catalog.api.list_collection_members(
            collection_id,
            page_token.as_deref(),
            page_size,
        ) {
            Ok(page) => page,
            Err(e) => {
                warn!(
                    api = catalog.api.name(),
                    collection_id,
                    fetched = members.len(),
                    error = %e,
                    "Member page fetch failed; keeping members fetched so far"
                );
                break;
            }
        };

        let remaining = max_members - members.len();
        let batch: Vec<Arc<Item>> = page
            .items
            .into_iter()
            .take(remaining)
            .map(|record| {
                let item = catalog.cache.item(&record.member_id);
                item.seed(record.title, None);
                item
            })
            .collect();

        debug!(collection_id, count = batch.len(), "Fetched member page");
        let empty_page = batch.is_empty();
        members.extend(batch.iter().cloned());
        loader.load(batch);

        match page.next_page_token {
            Some(token) if !empty_page => page_token = Some(token),
            _ => break,
        }
    }

    members
}
