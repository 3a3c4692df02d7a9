use std::fmt;

use log::debug;
use serde::Deserialize;

/// Prefix marking a query as a video platform search
pub const QUERY_PREFIX: &str = "search: ";

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Artist {
    /// Display name
    pub name: String,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
struct ExternalUrls {
    #[serde(default)]
    spotify: String,
}

// Track object as returned by the catalog, trimmed to the fields we use
#[derive(Deserialize, Debug)]
struct TrackObject {
    name: String,
    artists: Vec<Artist>,
    #[serde(default)]
    external_urls: ExternalUrls,
}

/// Metadata of one catalog track
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "TrackObject")]
pub struct TrackMetadata {
    /// Track title
    pub name: String,
    /// Artist names in the order the catalog lists them
    pub artist_names: Vec<String>,
    /// Public url of the track, logged with its query
    pub canonical_url: String,
}

impl From<TrackObject> for TrackMetadata {
    fn from(t: TrackObject) -> TrackMetadata {
        TrackMetadata {
            name: t.name,
            artist_names: t.artists.into_iter().map(|a| a.name).collect(),
            canonical_url: t.external_urls.spotify,
        }
    }
}

/// Search query for a single track on the video platform
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Query(String);

impl Query {
    /// Builds the canonical query of a track: its name followed by the
    /// comma separated artist names, first-listed artist first.
    #[must_use]
    pub fn build(track: &TrackMetadata) -> Query {
        let artists = track.artist_names.join(", ");
        let query = format!("{QUERY_PREFIX}{} {artists}", track.name);
        debug!(
            "Query \"{query}\" has been built. Track url: {}.",
            track.canonical_url
        );
        Query(query)
    }

    /// Full query, prefix included
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Search terms without the query prefix
    #[must_use]
    pub fn terms(&self) -> &str {
        self.0.strip_prefix(QUERY_PREFIX).unwrap_or(&self.0)
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Query {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One page of a paginated album or playlist listing
#[derive(Debug, Default)]
pub struct Page {
    /// Tracks of this page that could be decoded
    pub items: Vec<TrackMetadata>,
    /// Url of the following page, absent on the last one
    pub next: Option<String>,
}
