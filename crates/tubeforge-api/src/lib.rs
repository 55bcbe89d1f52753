//! tubeforge-api: access to the remote metadata service.
//!
//! - [`provider`] -- the [`RemoteCatalogApi`] trait consumed by the catalog core.
//! - [`records`] -- typed response records shared by every implementation.
//! - [`youtube`] -- [`YoutubeDataApi`], a blocking client for the YouTube Data API v3.
//!
//! Every call is synchronous: the catalog runs them inside worker-pool jobs.

pub mod provider;
pub mod records;
pub mod youtube;

pub use provider::RemoteCatalogApi;
pub use records::{
    CollectionRecord, ItemRecord, MemberPage, MemberRecord, SearchRecord, Thumbnail,
};
pub use youtube::YoutubeDataApi;
