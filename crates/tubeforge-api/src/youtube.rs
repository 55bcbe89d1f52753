//! YouTube Data API v3 backend.
//!
//! Implements [`RemoteCatalogApi`] with a blocking [`reqwest`] client.
//! Requests use partial responses (`fields=`) so only the attributes the
//! catalog decodes travel over the wire.
//!
//! Reference: <https://developers.google.com/youtube/v3/docs/>

use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use tubeforge_common::{EntityKind, Error, Result};

use crate::provider::RemoteCatalogApi;
use crate::records::{
    CollectionRecord, ItemRecord, MemberPage, MemberRecord, SearchRecord, Thumbnail,
};

pub const YOUTUBE_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Wire types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "T: Deserialize<'de>"))]
struct ListResponse<T> {
    #[serde(default)]
    items: Vec<T>,
    next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: Option<String>,
    channel_title: Option<String>,
    #[serde(default)]
    thumbnails: Map<String, Value>,
    resource_id: Option<ResourceId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchId {
    kind: String,
    video_id: Option<String>,
    playlist_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchId,
    #[serde(default)]
    snippet: Snippet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentDetails {
    duration: Option<String>,
    item_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetailItem {
    id: String,
    #[serde(default)]
    snippet: Snippet,
    #[serde(default)]
    content_details: ContentDetails,
}

#[derive(Debug, Deserialize)]
struct PlaylistEntry {
    #[serde(default)]
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Blocking YouTube Data API client.
///
/// # Examples
///
/// ```no_run
/// use tubeforge_api::{RemoteCatalogApi, YoutubeDataApi};
///
/// let api = YoutubeDataApi::new("your-api-key").unwrap();
/// let hits = api.search("lofi", 5).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct YoutubeDataApi {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl YoutubeDataApi {
    /// Create a client against the public endpoint with default timeout.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_options(YOUTUBE_ENDPOINT, api_key, REQUEST_TIMEOUT)
    }

    /// Create a client against a custom endpoint (a mirror, or a mock
    /// server in tests).
    pub fn with_options(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::transport)?;

        let mut endpoint = endpoint.into();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Issue a GET against `resource` and decode the JSON body.
    fn get<T: DeserializeOwned>(&self, resource: &str, params: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{resource}", self.endpoint);

        let resp = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .map_err(Error::transport)?;

        let status = resp.status();
        let body = resp.text().map_err(Error::transport)?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or(body);
            warn!(
                resource,
                status = status.as_u16(),
                message = %message,
                "YouTube API returned an error"
            );
            return Err(Error::api(status.as_u16(), message));
        }

        serde_json::from_str(&body).map_err(|e| Error::parse(format!("{resource}: {e}")))
    }
}

/// Flatten a `{size: {url, width, height}}` map into variants, keeping the
/// response order.
fn thumbnails(map: Map<String, Value>) -> Vec<Thumbnail> {
    map.into_iter()
        .filter_map(|(key, value)| {
            value
                .get("url")
                .and_then(Value::as_str)
                .map(|url| Thumbnail::new(key, url))
        })
        .collect()
}

fn search_record(item: SearchItem) -> Option<SearchRecord> {
    let (kind, id) = match item.id.kind.as_str() {
        "youtube#video" => (EntityKind::Item, item.id.video_id?),
        "youtube#playlist" => (EntityKind::Collection, item.id.playlist_id?),
        other => {
            debug!(kind = other, "Skipping search result of unsupported kind");
            return None;
        }
    };

    Some(SearchRecord {
        id,
        kind,
        title: item.snippet.title,
        channel_title: item.snippet.channel_title,
        thumbnails: thumbnails(item.snippet.thumbnails),
    })
}

impl RemoteCatalogApi for YoutubeDataApi {
    fn name(&self) -> &'static str {
        "youtube"
    }

    fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchRecord>> {
        debug!(query, max_results, "YouTube search");

        let body: ListResponse<SearchItem> = self.get(
            "search",
            &[
                ("part", "id,snippet".into()),
                (
                    "fields",
                    "items(id,snippet(title,thumbnails,channelTitle))".into(),
                ),
                ("maxResults", max_results.to_string()),
                ("type", "video,playlist".into()),
                ("q", query.into()),
            ],
        )?;

        Ok(body.items.into_iter().filter_map(search_record).collect())
    }

    fn list_items(&self, ids: &[String]) -> Result<Vec<ItemRecord>> {
        debug!(count = ids.len(), "YouTube list videos");

        let body: ListResponse<DetailItem> = self.get(
            "videos",
            &[
                ("part", "id,snippet,contentDetails".into()),
                (
                    "fields",
                    "items(id,snippet(title,channelTitle),contentDetails(duration))".into(),
                ),
                ("id", ids.join(",")),
            ],
        )?;

        Ok(body
            .items
            .into_iter()
            .map(|item| ItemRecord {
                id: item.id,
                title: item.snippet.title,
                channel_title: item.snippet.channel_title,
                duration: item.content_details.duration,
            })
            .collect())
    }

    fn list_collections(&self, ids: &[String]) -> Result<Vec<CollectionRecord>> {
        debug!(count = ids.len(), "YouTube list playlists");

        let body: ListResponse<DetailItem> = self.get(
            "playlists",
            &[
                ("part", "id,snippet,contentDetails".into()),
                (
                    "fields",
                    "items(id,snippet(title,thumbnails,channelTitle),contentDetails(itemCount))"
                        .into(),
                ),
                ("id", ids.join(",")),
            ],
        )?;

        Ok(body
            .items
            .into_iter()
            .map(|item| CollectionRecord {
                id: item.id,
                title: item.snippet.title,
                channel_title: item.snippet.channel_title,
                item_count: item.content_details.item_count,
                thumbnails: thumbnails(item.snippet.thumbnails),
            })
            .collect())
    }

    fn list_collection_members(
        &self,
        collection_id: &str,
        page_token: Option<&str>,
        page_size: usize,
    ) -> Result<MemberPage> {
        debug!(collection_id, page_token, page_size, "YouTube list playlist items");

        let mut params = vec![
            ("part", "id,snippet".to_string()),
            (
                "fields",
                "nextPageToken,items(snippet(title,resourceId(videoId)))".to_string(),
            ),
            ("maxResults", page_size.to_string()),
            ("playlistId", collection_id.to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        let body: ListResponse<PlaylistEntry> = match self.get("playlistItems", &params) {
            Err(Error::Api { status: 404, .. }) => {
                return Err(Error::not_found("playlist", collection_id))
            }
            other => other?,
        };

        let items = body
            .items
            .into_iter()
            .filter_map(|entry| {
                let member_id = entry.snippet.resource_id?.video_id?;
                Some(MemberRecord {
                    member_id,
                    title: entry.snippet.title,
                })
            })
            .collect();

        Ok(MemberPage {
            items,
            next_page_token: body.next_page_token.filter(|t| !t.is_empty()),
        })
    }
}
