use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use log::debug;

use crate::clients::{
    errors::{Error, Result},
    spotify::SPOTIFY_API_BASE,
};

const DEFAULT_CONCURRENCY: usize = 1;
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_DOWNLOADER: &str = "yt-dlp";

/// Run configuration, built once at startup and passed by reference
#[derive(Debug, Clone)]
pub struct Config {
    /// Dotenv file holding `RSPOTIFY_CLIENT_ID` and `RSPOTIFY_CLIENT_SECRET`
    pub credentials: Option<PathBuf>,
    /// YouTube cookies file for account authentication
    pub cookies: Option<PathBuf>,
    /// Absolute directory where tracks are stored
    pub destination: PathBuf,
    /// File with one Spotify url per line. Urls are read from stdin if absent.
    pub urls: Option<PathBuf>,
    /// Root of the catalog API
    pub api_base: String,
    /// Number of references resolved at the same time
    pub concurrency: usize,
    /// Timeout of a single catalog request
    pub fetch_timeout: Duration,
    /// Attempts per catalog request, first one included
    pub max_attempts: u32,
    /// Where the Spotify access token is cached between runs
    pub token_cache: PathBuf,
    /// `yt-dlp` executable
    pub downloader: PathBuf,
    /// Print the queries instead of downloading
    pub dry_run: bool,
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    credentials: Option<PathBuf>,
    cookies: Option<PathBuf>,
    destination: Option<PathBuf>,
    urls: Option<PathBuf>,
    api_base: Option<String>,
    concurrency: Option<usize>,
    fetch_timeout: Option<Duration>,
    max_attempts: Option<u32>,
    token_cache: Option<PathBuf>,
    downloader: Option<PathBuf>,
    dry_run: bool,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn credentials(mut self, path: Option<PathBuf>) -> Self {
        self.credentials = path;
        self
    }

    #[must_use]
    pub fn cookies(mut self, path: Option<PathBuf>) -> Self {
        self.cookies = path;
        self
    }

    #[must_use]
    pub fn destination(mut self, dir: Option<PathBuf>) -> Self {
        self.destination = dir;
        self
    }

    #[must_use]
    pub fn urls(mut self, path: Option<PathBuf>) -> Self {
        self.urls = path;
        self
    }

    #[must_use]
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = Some(url.into());
        self
    }

    #[must_use]
    pub fn concurrency(mut self, concurrency: Option<usize>) -> Self {
        self.concurrency = concurrency;
        self
    }

    #[must_use]
    pub fn fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    #[must_use]
    pub fn max_attempts(mut self, attempts: Option<u32>) -> Self {
        self.max_attempts = attempts;
        self
    }

    #[must_use]
    pub fn token_cache(mut self, path: PathBuf) -> Self {
        self.token_cache = Some(path);
        self
    }

    #[must_use]
    pub fn downloader(mut self, path: Option<PathBuf>) -> Self {
        self.downloader = path;
        self
    }

    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Applies defaults and validates the paths. The destination folder is
    /// created when it does not exist yet.
    pub fn build(self) -> Result<Config> {
        if let Some(cookies) = &self.cookies {
            ensure_file(cookies)?;
        }
        if let Some(urls) = &self.urls {
            ensure_file(urls)?;
        }
        let destination = prepare_destination(self.destination)?;

        let token_cache = self.token_cache.unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp")) // Fallback to /tmp if cache directory can't be determined
                .join(".youtify_token_cache")
        });

        Ok(Config {
            credentials: self.credentials,
            cookies: self.cookies,
            destination,
            urls: self.urls,
            api_base: self
                .api_base
                .unwrap_or_else(|| SPOTIFY_API_BASE.to_string()),
            concurrency: self.concurrency.unwrap_or(DEFAULT_CONCURRENCY).max(1),
            fetch_timeout: self.fetch_timeout.unwrap_or(DEFAULT_FETCH_TIMEOUT),
            max_attempts: self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS).max(1),
            token_cache,
            downloader: self
                .downloader
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOADER)),
            dry_run: self.dry_run,
        })
    }
}

fn ensure_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(Error::ConfigurationError(format!(
            "{} isn't a file.",
            path.display()
        )))
    }
}

fn prepare_destination(dir: Option<PathBuf>) -> Result<PathBuf> {
    let dir = match dir {
        Some(dir) => dir,
        None => return current_dir(),
    };
    if dir.is_file() {
        return Err(Error::ConfigurationError(format!(
            "Destination can't be a file: {}.",
            dir.display()
        )));
    }
    if !dir.is_dir() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            Error::ConfigurationError(format!("Can't create {}: {e}", dir.display()))
        })?;
        debug!("Created destination folder {}", dir.display());
    }
    // Resolves symlinks too
    dir.canonicalize()
        .map_err(|e| Error::ConfigurationError(format!("Can't resolve {}: {e}", dir.display())))
}

fn current_dir() -> Result<PathBuf> {
    std::env::current_dir()
        .map_err(|e| Error::ConfigurationError(format!("Can't read current directory: {e}")))
}
