//! Tubeforge - cached, lazily loaded access to remote media catalogs
//!
//! Items (videos) and collections (playlists) are handed out as shared
//! entities whose fields fill in on background workers. Reading a field
//! blocks until its value, or its absence, is known.

pub mod catalog;
pub mod config;
pub mod entity;
mod expander;
pub mod field;
pub mod loader;
pub mod locator;
pub mod pool;
pub mod uri;

pub use catalog::{Catalog, CatalogSettings};
pub use entity::{Collection, Entity, EntityCache, Item};
pub use field::{AsyncField, FieldStatus};
pub use loader::{BatchLoader, DetailGroup};
pub use pool::WorkerPool;
pub use tubeforge_common::{EntityKey, EntityKind, Error, Result};
