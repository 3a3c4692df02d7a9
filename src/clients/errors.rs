use std::path::PathBuf;

use rspotify::ClientError;
use thiserror::Error;

/// Result alias for fallible operations that end the run on failure
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Fatal errors: any of these aborts the whole run
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid flags, files or directories
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Failure of the rspotify client
    #[error("Spotify error: {0}")]
    SpotifyError(#[from] ClientError),

    /// No usable access token
    #[error("Access token error: {0}")]
    TokenError(String),

    /// The HTTP client could not be built
    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    /// Reading the url input failed
    #[error("An error occurred with {path:?}: {source}")]
    InputError {
        /// File being read, `-` for stdin
        path: PathBuf,
        /// Underlying io failure
        source: std::io::Error,
    },

    /// Nothing was resolved from the whole batch
    #[error("No tracks were collected from Spotify.")]
    EmptyResult,

    /// The downloader failed
    #[error("Download error: {0}")]
    DownloadError(String),
}

/// Failure of a single catalog request. Soft: the resource being resolved is
/// abandoned, the batch goes on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Non-success HTTP status, with the message of the error body
    #[error("Status Code {status}; Error Message {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Error description
        message: String,
    },

    /// Connection level failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// The request exceeded the client timeout
    #[error("Request timed out")]
    Timeout,

    /// Body is not the expected json
    #[error("Failed to parse response body: {0}")]
    Decode(String),
}

impl FetchError {
    /// Whether repeating the same request may succeed
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport(_) | FetchError::Timeout => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// A reference string that is not a Spotify track, album or playlist url
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid url syntax: {0}")]
pub struct InvalidReference(pub String);
