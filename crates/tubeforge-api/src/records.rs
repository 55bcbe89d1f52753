//! Typed records returned by [`RemoteCatalogApi`](crate::RemoteCatalogApi).
//!
//! Records carry the service's raw values. Decoding into field values
//! (duration parsing, count clamping, thumbnail selection) is the catalog's
//! job, so every implementation shares one set of decoding rules.

use serde::{Deserialize, Serialize};
use tubeforge_common::EntityKind;

/// One thumbnail variant, keyed by the service's size name
/// (`default`, `medium`, `high`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub key: String,
    pub url: String,
}

impl Thumbnail {
    pub fn new(key: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            url: url.into(),
        }
    }
}

/// A search hit: either an item or a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRecord {
    pub id: String,
    pub kind: EntityKind,
    pub title: Option<String>,
    pub channel_title: Option<String>,
    /// Thumbnail variants in response order; may be empty.
    #[serde(default)]
    pub thumbnails: Vec<Thumbnail>,
}

/// Detail record for a single item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: String,
    pub title: Option<String>,
    pub channel_title: Option<String>,
    /// Duration as reported by the service, e.g. `PT1H2M10S`.
    pub duration: Option<String>,
}

/// Detail record for a collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionRecord {
    pub id: String,
    pub title: Option<String>,
    pub channel_title: Option<String>,
    /// Raw member count, before any clamping.
    pub item_count: Option<u64>,
    /// Thumbnail variants in response order.
    #[serde(default)]
    pub thumbnails: Vec<Thumbnail>,
}

/// One entry of a collection's member list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub member_id: String,
    /// Absent when the service omits it; the item's own details fill it in.
    pub title: Option<String>,
}

/// A page of collection members plus the token for the following page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberPage {
    pub items: Vec<MemberRecord>,
    pub next_page_token: Option<String>,
}
