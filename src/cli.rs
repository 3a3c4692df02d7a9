use std::{
    fs::OpenOptions,
    io::{Stderr, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use clap::Parser;
use log::{LevelFilter, info};
use youtify::{
    Config, ConfigBuilder, Pipeline,
    clients::{
        Downloader, DryRunDownloader, SpotifyTokenProvider, TokenProvider, YtDlpDownloader,
        errors::{Error, Result},
    },
    input::{references_from_file, references_from_stdin},
};

#[derive(Parser, Debug)]
#[command(name = "youtify")]
#[command(version, about = "Downloads Spotify tracks through Youtube.", long_about = None)]
struct Cli {
    /// Youtube cookies file for account authentication.
    #[arg(short, long, value_name = "FILE")]
    cookies: Option<PathBuf>,

    /// File containing Spotify urls (Blank lines are skipped).
    #[arg(short, long, value_name = "FILE")]
    urls: Option<PathBuf>,

    /// Directory where tracks'll be stored.
    #[arg(short, long, value_name = "DIR")]
    folder: Option<PathBuf>,

    /// Outputs further information: level 1 (default) shows execution info
    /// and errors, level 2 more technical elements.
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        num_args = 0..=1,
        default_missing_value = "1",
        value_parser = clap::value_parser!(u8).range(1..=2)
    )]
    debugging: Option<u8>,

    /// Also appends log output to this file.
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Dotenv file with RSPOTIFY_CLIENT_ID and RSPOTIFY_CLIENT_SECRET.
    #[arg(long, value_name = "FILE")]
    credentials: Option<PathBuf>,

    /// Number of urls resolved at the same time.
    #[arg(short = 'j', long, value_name = "N")]
    concurrency: Option<usize>,

    /// Timeout of a single Spotify request, in seconds.
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Attempts per Spotify request on transient failures.
    #[arg(long, value_name = "N")]
    retries: Option<u32>,

    /// yt-dlp executable.
    #[arg(long, value_name = "PATH")]
    downloader: Option<PathBuf>,

    /// Print the search queries instead of downloading.
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn config(&self) -> Result<Config> {
        ConfigBuilder::new()
            .credentials(self.credentials.clone())
            .cookies(self.cookies.clone())
            .destination(self.folder.clone())
            .urls(self.urls.clone())
            .concurrency(self.concurrency)
            .fetch_timeout(self.timeout.map(Duration::from_secs))
            .max_attempts(self.retries)
            .downloader(self.downloader.clone())
            .dry_run(self.dry_run)
            .build()
    }
}

// Log writer copying every record to stderr and to the log file
struct Tee<W> {
    stderr: Stderr,
    file: W,
}

impl<W: Write> Write for Tee<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.stderr.write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.stderr.flush()?;
        self.file.flush()
    }
}

fn init_logging(level: Option<u8>, log_file: Option<&Path>) -> Result<()> {
    let filter = match level {
        None => LevelFilter::Warn,
        Some(1) => LevelFilter::Info,
        Some(_) => LevelFilter::Debug,
    };
    let mut builder = env_logger::Builder::new();
    builder.filter_level(filter).parse_default_env();
    if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| Error::ConfigurationError(format!("{}: {e}", path.display())))?;
        builder.target(env_logger::Target::Pipe(Box::new(Tee {
            stderr: std::io::stderr(),
            file,
        })));
    }
    builder
        .try_init()
        .map_err(|e| Error::ConfigurationError(e.to_string()))
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debugging, cli.log_file.as_deref())?;
    let config = cli.config()?;
    download_tracks(&config).await
}

async fn download_tracks(config: &Config) -> Result<()> {
    info!("Requesting Spotify access token ...");
    let token = SpotifyTokenProvider::try_from_config(config)?.token().await?;

    let urls = match &config.urls {
        Some(path) => references_from_file(path).await?,
        None => references_from_stdin().await?,
    };

    let pipeline = Pipeline::try_from_config(config)?;
    let queries = pipeline.run(urls, &token).await?;

    if config.dry_run {
        DryRunDownloader.download(&queries).await
    } else {
        YtDlpDownloader::from_config(config).download(&queries).await
    }
}
