//! Turns a decoded reference into a lazy stream of search queries.
//!
//! Albums and playlists are paginated: pages are fetched one after the
//! other, following the `next` url of the previous page, and each page is
//! fully emitted before the next one is requested.

use futures::{
    Stream,
    future,
    stream::{self, BoxStream, StreamExt},
};
use log::{debug, error, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    clients::{
        entities::{Page, Query, TrackMetadata},
        spotify::{ResourceFetcher, SPOTIFY_API_BASE},
    },
    reference::{Reference, ResourceKind},
};

const ALBUM_PAGE_LIMIT: u32 = 50;
// Album tracks don't support field selection
const PLAYLIST_FIELDS: &str = "items(track(artists.name,external_urls.spotify,name)),next";

#[derive(Deserialize)]
struct RawPage {
    items: Vec<Value>,
    #[serde(default)]
    next: Option<String>,
}

// Playlist entries wrap the track object in `track`, album entries are the
// track object itself.
fn unwrap_item(kind: ResourceKind, item: Value) -> Option<Value> {
    match kind {
        ResourceKind::Playlist => match item {
            Value::Object(mut entry) => entry.remove("track").filter(|t| !t.is_null()),
            _ => None,
        },
        ResourceKind::Album | ResourceKind::Track => Some(item),
    }
}

fn parse_page(kind: ResourceKind, content: Value) -> Result<Page, serde_json::Error> {
    let raw: RawPage = serde_json::from_value(content)?;
    let items = raw
        .items
        .into_iter()
        .filter_map(|item| {
            let Some(track) = unwrap_item(kind, item) else {
                warn!("Skipping {kind} entry without track information");
                return None;
            };
            match serde_json::from_value::<TrackMetadata>(track) {
                Ok(track) => Some(track),
                Err(e) => {
                    warn!("Skipping malformed {kind} entry: {e}");
                    None
                }
            }
        })
        .collect();
    Ok(Page {
        items,
        next: raw.next,
    })
}

// State carried between two polls of a paginated stream: the rest of the
// current page and the url of the following one.
struct PageCursor {
    pending: std::vec::IntoIter<TrackMetadata>,
    next: Option<String>,
}

/// Resolves references against the catalog API
pub struct Resolver<F> {
    fetcher: F,
    api_base: String,
}

impl<F: ResourceFetcher> Resolver<F> {
    /// Resolver against the public Spotify Web API.
    pub fn new(fetcher: F) -> Self {
        Self::with_api_base(fetcher, SPOTIFY_API_BASE)
    }

    /// Resolver against another API root, like a local mock server.
    /// A trailing `/` is ignored.
    pub fn with_api_base(fetcher: F, api_base: impl Into<String>) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        Resolver { fetcher, api_base }
    }

    /// Underlying fetcher
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Url of the track, or of the first page of an album or playlist
    pub fn endpoint(&self, reference: &Reference) -> String {
        let base = &self.api_base;
        let id = &reference.id;
        match reference.kind {
            ResourceKind::Track => format!("{base}/tracks/{id}"),
            ResourceKind::Album => format!("{base}/albums/{id}/tracks?limit={ALBUM_PAGE_LIMIT}"),
            ResourceKind::Playlist => format!("{base}/playlists/{id}/tracks?fields={PLAYLIST_FIELDS}"),
        }
    }

    /// Lazy stream of the queries of every track behind `reference`.
    ///
    /// A failed fetch ends the stream; queries already yielded from earlier
    /// pages stay valid. A track yields a single query, or none on failure.
    pub fn resolve<'a>(&'a self, reference: &Reference, token: &'a str) -> BoxStream<'a, Query> {
        let url = self.endpoint(reference);
        match reference.kind {
            ResourceKind::Track => stream::once(self.track(url, token))
                .filter_map(future::ready)
                .boxed(),
            ResourceKind::Album | ResourceKind::Playlist => {
                self.pages(reference.kind, url, token).boxed()
            }
        }
    }

    async fn track(&self, url: String, token: &str) -> Option<Query> {
        let content = match self.fetcher.fetch(&url, token).await {
            Ok(content) => content,
            Err(e) => {
                error!("While trying to get information about track(s) from {url}: {e}.");
                return None;
            }
        };
        match serde_json::from_value::<TrackMetadata>(content) {
            Ok(track) => Some(Query::build(&track)),
            Err(e) => {
                error!("Unexpected track object from {url}: {e}.");
                None
            }
        }
    }

    fn pages<'a>(
        &'a self,
        kind: ResourceKind,
        url: String,
        token: &'a str,
    ) -> impl Stream<Item = Query> + Send + 'a {
        let cursor = PageCursor {
            pending: Vec::new().into_iter(),
            next: Some(url),
        };
        stream::unfold(cursor, move |mut cursor| async move {
            loop {
                if let Some(track) = cursor.pending.next() {
                    return Some((Query::build(&track), cursor));
                }
                let url = cursor.next.take()?;
                let content = match self.fetcher.fetch(&url, token).await {
                    Ok(content) => content,
                    Err(e) => {
                        error!("While trying to get information about track(s) from {url}: {e}.");
                        return None;
                    }
                };
                match parse_page(kind, content) {
                    Ok(page) => {
                        debug!("Fetched {} track(s) from {url}", page.items.len());
                        cursor.pending = page.items.into_iter();
                        cursor.next = page.next;
                    }
                    Err(e) => {
                        error!("Unexpected {kind} page from {url}: {e}.");
                        return None;
                    }
                }
            }
        })
    }
}
