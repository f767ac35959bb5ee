//! Media fetching: resolve a video URL with `yt-dlp`, store it, detect its MIME type.

pub mod binary;
pub mod error;
pub mod mime;
pub mod store;
pub mod ytdlp;

pub use {
    clipcast_common::MediaFile,
    error::{FetchError, Result},
    store::MediaStore,
    ytdlp::{YtDlpFetcher, validate_source_url},
};

use async_trait::async_trait;

/// Resolves a remote video reference to a file in local storage.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Download the single video behind `source_url`.
    ///
    /// On error nothing is left behind in the storage directory.
    async fn fetch(&self, source_url: &str) -> Result<MediaFile>;
}
