//! The [`RemoteCatalogApi`] trait implemented by remote metadata backends.

use tubeforge_common::Result;

use crate::records::{CollectionRecord, ItemRecord, MemberPage, SearchRecord};

/// Stateless request/response access to a remote metadata service.
///
/// Implementations must be safe to share across threads (`Send + Sync`);
/// the catalog holds one behind an `Arc` and calls it from worker threads.
/// Each method blocks until the response has been decoded.
pub trait RemoteCatalogApi: Send + Sync {
    /// Short, lowercase identifier for this backend (e.g. `"youtube"`).
    fn name(&self) -> &'static str;

    /// Search for items and collections matching `query`, returning at most
    /// `max_results` records in relevance order.
    fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchRecord>>;

    /// Fetch detail records for up to 50 items.
    ///
    /// Ids unknown to the service (deleted, private) are simply absent from
    /// the returned list; order is not guaranteed to match `ids`.
    fn list_items(&self, ids: &[String]) -> Result<Vec<ItemRecord>>;

    /// Fetch detail records for up to 50 collections. Same absence rules as
    /// [`list_items`](Self::list_items).
    fn list_collections(&self, ids: &[String]) -> Result<Vec<CollectionRecord>>;

    /// Fetch one page of a collection's members.
    ///
    /// `page_token` is `None` for the first page; afterwards it is the
    /// `next_page_token` of the previous page.
    fn list_collection_members(
        &self,
        collection_id: &str,
        page_token: Option<&str>,
        page_size: usize,
    ) -> Result<MemberPage>;
}
