/// Data entities for tracks and queries
pub mod entities;
/// Error types and result aliases
pub mod errors;
/// Retry policy for catalog requests
pub mod retry;
/// Spotify catalog and token clients
pub mod spotify;
/// YouTube downloaders
pub mod youtube;

pub use spotify::{CatalogClient, ResourceFetcher, SpotifyTokenProvider, TokenProvider};
pub use youtube::{Downloader, DryRunDownloader, YtDlpDownloader};
