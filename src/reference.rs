use std::{fmt, str::FromStr, sync::LazyLock};

use log::debug;
use regex::Regex;

use crate::clients::errors::InvalidReference;

#[allow(clippy::expect_used)]
static SPOTIFY_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://open\.spotify\.com/(?P<kind>track|album|playlist)/(?P<id>[a-zA-Z0-9]+).*$")
        .expect("Spotify url regex is valid")
});

/// Kind of catalog resource a reference points to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A single track
    Track,
    /// An album, resolved page by page
    Album,
    /// A user playlist, resolved page by page
    Playlist,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Track => "track",
            ResourceKind::Album => "album",
            ResourceKind::Playlist => "playlist",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded `https://open.spotify.com/{kind}/{id}` url
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    /// What the url points to
    pub kind: ResourceKind,
    /// Catalog id, alphanumeric
    pub id: String,
}

impl Reference {
    /// Decodes a Spotify url. Anything after the id (query string, extra
    /// path segments) is ignored.
    pub fn decode(url: &str) -> Result<Reference, InvalidReference> {
        let captures = SPOTIFY_URL
            .captures(url)
            .ok_or_else(|| InvalidReference(url.to_string()))?;

        let kind = match &captures["kind"] {
            "track" => ResourceKind::Track,
            "album" => ResourceKind::Album,
            "playlist" => ResourceKind::Playlist,
            _ => return Err(InvalidReference(url.to_string())),
        };
        let id = captures["id"].to_string();

        debug!("Url {url} decoded: type - {kind}; id - {id}.");
        Ok(Reference { kind, id })
    }
}

impl FromStr for Reference {
    type Err = InvalidReference;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Reference::decode(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_each_kind() {
        let cases = [
            ("https://open.spotify.com/track/6rqhFgbbKwnb9MLmUQDhG6", ResourceKind::Track),
            ("https://open.spotify.com/album/1ATL5GLyefJaxhQzSPVrLX", ResourceKind::Album),
            ("https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M", ResourceKind::Playlist),
        ];
        for (url, kind) in cases {
            let reference = Reference::decode(url).unwrap();
            assert_eq!(reference.kind, kind);
            assert_eq!(url.rsplit('/').next(), Some(reference.id.as_str()));
        }
    }

    #[test]
    fn ignores_trailing_content() {
        let reference: Reference = "https://open.spotify.com/playlist/abc123?si=xyz&utm=1"
            .parse()
            .unwrap();
        assert_eq!(
            reference,
            Reference {
                kind: ResourceKind::Playlist,
                id: "abc123".into()
            }
        );
    }

    #[test]
    fn rejects_malformed_urls() {
        for url in [
            "not-a-url",
            "",
            "https://open.spotify.com/track/",
            "https://open.spotify.com/show/123",
            "https://open.example.com/track/",
            "https://open.example.com/show/123",
            "https://open.example.com/track/abc",
            "http://open.spotify.com/track/abc",
            "https://open.spotify.com/artist/abc",
            " https://open.spotify.com/track/abc",
        ] {
            assert_eq!(
                Reference::decode(url),
                Err(InvalidReference(url.to_string())),
                "{url}"
            );
        }
    }

    #[test]
    fn id_stops_at_first_non_alphanumeric() {
        let reference = Reference::decode("https://open.spotify.com/album/abc-def").unwrap();
        assert_eq!(reference.id, "abc");
    }
}
