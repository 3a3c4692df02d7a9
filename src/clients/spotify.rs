use std::{
    future::Future,
    path::{Path, PathBuf},
    time::Duration,
};

use log::{debug, warn};
use reqwest::{
    StatusCode,
    header::{ACCEPT, CONTENT_TYPE},
};
use rspotify::{ClientCredsSpotify, Credentials, Token, prelude::*};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    clients::{
        errors::{Error, FetchError, Result},
        retry::RetryPolicy,
    },
    config::Config,
};

/// Base url of the Spotify Web API
pub const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";

/// One authenticated GET against the catalog API
pub trait ResourceFetcher: Send + Sync {
    /// Fetches `url` with `token` as bearer and returns the decoded json body.
    fn fetch(
        &self,
        url: &str,
        token: &str,
    ) -> impl Future<Output = std::result::Result<Value, FetchError>> + Send;
}

/// Source of the bearer token used for catalog requests
pub trait TokenProvider {
    /// Returns a valid access token, requesting a new one when needed.
    fn token(&self) -> impl Future<Output = Result<String>> + Send;
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ApiError,
}

fn error_message(status: StatusCode, body: &[u8]) -> String {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(body) => body.error.message,
        Err(_) => format!(
            "Unexpected response ({})",
            status.canonical_reason().unwrap_or("unknown status")
        ),
    }
}

/// HTTP client for the Spotify Web API catalog endpoints
pub struct CatalogClient {
    http: reqwest::Client,
    retry: RetryPolicy,
}

impl CatalogClient {
    /// Client whose every request gives up after `timeout`, retried per `retry`
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(CatalogClient { http, retry })
    }

    /// Client with the timeout and attempt count of `config`
    pub fn try_from_config(config: &Config) -> Result<Self> {
        CatalogClient::new(
            config.fetch_timeout,
            RetryPolicy::with_max_attempts(config.max_attempts),
        )
    }

    async fn fetch_once(&self, url: &str, token: &str) -> std::result::Result<Value, FetchError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        if status == StatusCode::OK {
            serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
        } else {
            Err(FetchError::Status {
                status: status.as_u16(),
                message: error_message(status, &body),
            })
        }
    }
}

impl ResourceFetcher for CatalogClient {
    async fn fetch(&self, url: &str, token: &str) -> std::result::Result<Value, FetchError> {
        let mut attempt = 1;
        loop {
            match self.fetch_once(url, token).await {
                Ok(content) => return Ok(content),
                Err(err) => match self.retry.next_delay(&err, attempt) {
                    Some(delay) => {
                        warn!(
                            "Request to {url} failed: {err}. Retrying in {delay:?} (attempt {}/{})",
                            attempt + 1,
                            self.retry.max_attempts()
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => return Err(err),
                },
            }
        }
    }
}

// Loads RSPOTIFY_CLIENT_ID and RSPOTIFY_CLIENT_SECRET into the environment
fn load_credentials_file(path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            dotenvy::from_path(path).map_err(|e| {
                Error::ConfigurationError(format!(
                    "Something happened in credentials file {path:?}: {e}"
                ))
            })?;
            debug!("Loaded Spotify credentials from {path:?}");
        }
        None => {
            if let Ok(path) = dotenvy::dotenv() {
                debug!("Loaded Spotify credentials from {path:?}");
            }
        }
    }
    Ok(())
}

/// Client credentials flow against the Spotify accounts service
pub struct SpotifyTokenProvider {
    spotify: ClientCredsSpotify,
    token_cache: PathBuf,
}

impl SpotifyTokenProvider {
    // Create a provider from the credentials file or raise a configuration error
    pub fn try_from_config(config: &Config) -> Result<Self> {
        load_credentials_file(config.credentials.as_deref())?;
        let creds = Credentials::from_env().ok_or_else(|| {
            Error::ConfigurationError(
                "You missed something in credentials: RSPOTIFY_CLIENT_ID and RSPOTIFY_CLIENT_SECRET are required.".into(),
            )
        })?;

        let spotify = ClientCredsSpotify::with_config(
            creds,
            rspotify::Config {
                token_cached: true,
                cache_path: config.token_cache.clone(),
                ..Default::default()
            },
        );
        Ok(Self {
            spotify,
            token_cache: config.token_cache.clone(),
        })
    }

    fn cached_token(&self) -> Option<Token> {
        match Token::from_cache(&self.token_cache) {
            Ok(token) if !token.is_expired() => Some(token),
            Ok(_) => {
                debug!("Cached Spotify access token has expired");
                None
            }
            Err(e) => {
                debug!("No cached Spotify access token: {e}");
                None
            }
        }
    }
}

impl TokenProvider for SpotifyTokenProvider {
    async fn token(&self) -> Result<String> {
        let slot = self.spotify.get_token();
        if let Some(token) = self.cached_token() {
            debug!("Loaded Spotify access token from cache");
            *slot
                .lock()
                .await
                .map_err(|_| Error::TokenError("token lock is poisoned".into()))? = Some(token);
        } else {
            debug!("Requesting Spotify access token ...");
            self.spotify.request_token().await?;
        }

        let token = slot
            .lock()
            .await
            .map_err(|_| Error::TokenError("token lock is poisoned".into()))?;
        token
            .as_ref()
            .map(|t| t.access_token.clone())
            .ok_or_else(|| Error::TokenError("Spotify did not issue an access token".into()))
    }
}
