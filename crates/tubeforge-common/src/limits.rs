//! Default values for the catalog's tunable limits.

/// Maximum number of ids sent in one remote list call.
pub const BATCH_CHUNK_SIZE: usize = 50;

/// Largest page the remote service returns for collection members.
pub const MAX_PAGE_SIZE: usize = 50;

pub const DEFAULT_MAX_MEMBERS: usize = 60;
pub const DEFAULT_SEARCH_RESULTS: usize = 15;
pub const DEFAULT_MAX_WORKERS: usize = 15;
pub const DEFAULT_CACHE_CAPACITY: usize = 400;
