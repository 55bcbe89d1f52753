//! Reference strings: URIs, watch URLs and bare ids.
//!
//! Accepted inputs, with an optional `yt:` prefix:
//!
//! - `youtube:video/<slug>.<id>` and `youtube:playlist/<slug>.<id>`
//! - `https://www.youtube.com/watch?v=<id>` (item)
//! - any youtube.com URL with a `list=<id>` parameter (collection; wins
//!   over `v=`)
//! - `https://youtu.be/<id>` (item)
//! - a bare id (item)

use reqwest::Url;
use tubeforge_common::{EntityKey, EntityKind};

const URI_SCHEME: &str = "youtube";

/// Public watch page for an item.
pub fn watch_url(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={id}")
}

/// Reduce a title to characters safe inside a URI path.
///
/// Keeps ASCII letters, digits and `-_.() `; whitespace runs collapse to a
/// single space and the result is trimmed.
pub fn safe_title(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || "-_.() ".contains(*c) || c.is_whitespace())
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Stable URI for an entity, e.g. `youtube:video/Some Song.dQw4w9WgXcQ`.
pub fn entity_uri(kind: EntityKind, title: &str, id: &str) -> String {
    let segment = match kind {
        EntityKind::Item => "video",
        EntityKind::Collection => "playlist",
    };
    format!("{URI_SCHEME}:{segment}/{}.{id}", safe_title(title))
}

/// Work out which entity a reference string points at.
pub fn parse_reference(reference: &str) -> Option<EntityKey> {
    let reference = reference.trim();
    let reference = reference.strip_prefix("yt:").unwrap_or(reference);
    if reference.is_empty() {
        return None;
    }

    if let Some(rest) = reference.strip_prefix("youtube:") {
        return parse_entity_uri(rest);
    }

    if reference.contains("youtube.com") || reference.contains("youtu.be") {
        return parse_web_url(reference);
    }

    if reference.contains(['/', ':', '?', ' ']) {
        return None;
    }
    Some(EntityKey::item(reference))
}

fn parse_entity_uri(rest: &str) -> Option<EntityKey> {
    let (segment, tail) = rest.split_once('/')?;
    let kind = match segment {
        "video" => EntityKind::Item,
        "playlist" => EntityKind::Collection,
        _ => return None,
    };
    // The slug may contain dots; the id never does.
    let id = tail.rsplit('.').next().filter(|id| !id.is_empty())?;
    Some(EntityKey::new(kind, id))
}

fn parse_web_url(reference: &str) -> Option<EntityKey> {
    let url = if reference.contains("://") {
        Url::parse(reference).ok()?
    } else {
        Url::parse(&format!("https://{reference}")).ok()?
    };

    let mut video = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "list" if !value.is_empty() => return Some(EntityKey::collection(value)),
            "v" if !value.is_empty() => video = Some(value.into_owned()),
            _ => {}
        }
    }
    if let Some(id) = video {
        return Some(EntityKey::item(id));
    }

    if url.host_str() == Some("youtu.be") {
        let id = url.path().trim_start_matches('/');
        if !id.is_empty() {
            return Some(EntityKey::item(id));
        }
    }
    None
}
