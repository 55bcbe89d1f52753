use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tubeforge_api::youtube::YOUTUBE_ENDPOINT;
use tubeforge_common::limits::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_MAX_MEMBERS, DEFAULT_MAX_WORKERS, DEFAULT_SEARCH_RESULTS,
};

use crate::catalog::CatalogSettings;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub youtube: YoutubeConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl Config {
    /// Settings for the catalog core, combining the catalog and resolver
    /// sections.
    pub fn settings(&self) -> CatalogSettings {
        CatalogSettings {
            preferred_container: self.resolver.preferred_container.clone(),
            ..CatalogSettings::from(&self.catalog)
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct YoutubeConfig {
    /// YouTube Data API v3 key
    #[serde(default)]
    pub api_key: String,

    /// Base URL of the Data API (override for mirrors or tests)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    YOUTUBE_ENDPOINT.to_string()
}

fn default_api_timeout() -> u64 {
    30
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_endpoint(),
            timeout_secs: default_api_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Maximum members fetched per collection
    #[serde(default = "default_max_members")]
    pub max_members: usize,

    /// Results requested per search
    #[serde(default = "default_search_results")]
    pub search_results: usize,

    /// Maximum concurrently running worker threads
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Entities kept in the identity cache
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_max_members() -> usize {
    DEFAULT_MAX_MEMBERS
}
fn default_search_results() -> usize {
    DEFAULT_SEARCH_RESULTS
}
fn default_max_workers() -> usize {
    DEFAULT_MAX_WORKERS
}
fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            max_members: default_max_members(),
            search_results: default_search_results(),
            max_workers: default_max_workers(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl From<&CatalogConfig> for CatalogSettings {
    fn from(config: &CatalogConfig) -> Self {
        Self {
            max_members: config.max_members,
            search_results: config.search_results,
            max_workers: config.max_workers,
            cache_capacity: config.cache_capacity,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Path to yt-dlp (found on PATH when unset)
    #[serde(default)]
    pub yt_dlp_path: Option<PathBuf>,

    /// Seconds before a yt-dlp invocation is killed (default: 60)
    #[serde(default = "default_resolver_timeout")]
    pub timeout_secs: u64,

    /// Container extension preferred for audio streams
    #[serde(default = "default_preferred_container")]
    pub preferred_container: String,
}

fn default_resolver_timeout() -> u64 {
    60
}

fn default_preferred_container() -> String {
    "m4a".to_string()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: None,
            timeout_secs: default_resolver_timeout(),
            preferred_container: default_preferred_container(),
        }
    }
}
