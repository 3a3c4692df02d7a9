//! Youtify - Download Spotify tracks through YouTube
//!
//! This library resolves Spotify track, album and playlist urls into a
//! deduplicated set of YouTube search queries and hands them to a downloader.

/// Client modules for the Spotify API and the YouTube downloader
pub mod clients;
/// Run configuration
pub mod config;
/// Reading urls from a file or stdin
pub mod input;
/// Batch resolution with deduplication
pub mod pipeline;
/// Spotify url decoding
pub mod reference;
/// Expansion of one reference into a lazy stream of queries.
pub mod resolver;

#[cfg(test)]
mod testing;

pub use clients::entities::Query;
pub use config::{Config, ConfigBuilder};
pub use pipeline::Pipeline;
pub use reference::{Reference, ResourceKind};
