//! tubeforge-common: shared types used across tubeforge.
//!
//! - **Errors**: the unified [`Error`] type and [`Result`] alias
//! - **Identity**: [`EntityKind`] and [`EntityKey`], the cache identity of a
//!   catalog entity
//! - **Limits**: default values for the tunable catalog limits
//!
//! # Examples
//!
//! ```
//! use tubeforge_common::{EntityKey, EntityKind, Error, Result};
//!
//! let key = EntityKey::new(EntityKind::Item, "dQw4w9WgXcQ");
//! assert_eq!(key.to_string(), "item:dQw4w9WgXcQ");
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("collection", "PL123"))
//! }
//! assert!(example().is_err());
//! ```

pub mod error;
pub mod ids;
pub mod limits;

pub use error::{Error, Result};
pub use ids::{EntityKey, EntityKind};
