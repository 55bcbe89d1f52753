//! Playable stream resolution for items.
//!
//! A [`StreamResolver`] lists the encodings available for an item; the
//! catalog then picks one with [`select_audio_stream`]. Resolution is one
//! external call per item and far slower than metadata calls, so it is
//! never batched and only runs when an item's `audio_locator` is read.

mod ytdlp;

pub use ytdlp::YtDlpResolver;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use tubeforge_common::Result;

/// What a stream carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    AudioOnly,
    Combined,
    VideoOnly,
}

/// One available encoding of an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub url: String,
    /// Container extension, e.g. `m4a`, `webm`, `mp4`.
    pub extension: String,
    pub kind: StreamKind,
    pub bitrate_kbps: Option<f64>,
}

/// Lists the playable encodings of an item.
///
/// Implementations must be safe to share across threads (`Send + Sync`).
pub trait StreamResolver: Send + Sync {
    /// Human-readable name identifying this resolver.
    fn name(&self) -> &'static str;

    /// All known encodings for `item_id`. An error means the item is
    /// deleted, restricted, or the resolver itself failed.
    fn streams(&self, item_id: &str) -> Result<Vec<StreamInfo>>;
}

fn container_family(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "m4a" | "mp4" | "m4v" => Some("mp4"),
        "webm" | "weba" => Some("webm"),
        "ogg" | "opus" => Some("ogg"),
        _ => None,
    }
}

fn same_container(a: &str, b: &str) -> bool {
    match (container_family(a), container_family(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a.eq_ignore_ascii_case(b),
    }
}

fn best_of<'a>(
    streams: &'a [StreamInfo],
    kind: StreamKind,
    accept: impl Fn(&StreamInfo) -> bool,
) -> Option<&'a StreamInfo> {
    streams
        .iter()
        .filter(|s| s.kind == kind && accept(s))
        .max_by(|a, b| {
            a.bitrate_kbps
                .unwrap_or(0.0)
                .total_cmp(&b.bitrate_kbps.unwrap_or(0.0))
        })
}

/// Pick the stream to play.
///
/// Prefers the highest-bitrate audio-only stream with the `preferred`
/// extension; falls back to the best combined audio+video stream in the same
/// container family (`m4a` and `mp4` are one family).
pub fn select_audio_stream<'a>(
    streams: &'a [StreamInfo],
    preferred: &str,
) -> Option<&'a StreamInfo> {
    best_of(streams, StreamKind::AudioOnly, |s| {
        s.extension.eq_ignore_ascii_case(preferred)
    })
    .or_else(|| {
        best_of(streams, StreamKind::Combined, |s| {
            same_container(&s.extension, preferred)
        })
    })
}

/// Resolve the audio locator for `item_id`; `None` on any failure.
pub fn resolve_audio_locator(
    resolver: &dyn StreamResolver,
    item_id: &str,
    preferred: &str,
) -> Option<String> {
    let streams = match resolver.streams(item_id) {
        Ok(streams) => streams,
        Err(e) => {
            warn!(
                item_id,
                resolver = resolver.name(),
                error = %e,
                "Item deleted, restricted or unresolvable"
            );
            return None;
        }
    };

    match select_audio_stream(&streams, preferred) {
        Some(stream) => {
            debug!(
                item_id,
                extension = %stream.extension,
                kind = ?stream.kind,
                bitrate_kbps = ?stream.bitrate_kbps,
                "Selected stream"
            );
            Some(stream.url.clone())
        }
        None => {
            warn!(
                item_id,
                available = streams.len(),
                "No stream in a playable encoding"
            );
            None
        }
    }
}
