use std::{
    collections::HashSet,
    ffi::OsString,
    future::Future,
    path::PathBuf,
};

use log::{debug, info};
use tokio::{io::AsyncWriteExt, process::Command};

use crate::{
    clients::{
        entities::Query,
        errors::{Error, Result},
    },
    config::Config,
};

/// Consumer of the final query set
pub trait Downloader {
    /// Hands the whole query set over at once.
    fn download(&self, queries: &HashSet<Query>) -> impl Future<Output = Result<()>> + Send;
}

/// Downloads the best audio of the first YouTube search hit of every query
/// through an external `yt-dlp` process and converts it to mp3.
pub struct YtDlpDownloader {
    program: PathBuf,
    destination: PathBuf,
    cookies: Option<PathBuf>,
}

impl YtDlpDownloader {
    pub fn new(program: PathBuf, destination: PathBuf, cookies: Option<PathBuf>) -> Self {
        YtDlpDownloader {
            program,
            destination,
            cookies,
        }
    }

    /// Downloader using the `yt-dlp` binary, destination and cookies of `config`
    pub fn from_config(config: &Config) -> Self {
        YtDlpDownloader::new(
            config.downloader.clone(),
            config.destination.clone(),
            config.cookies.clone(),
        )
    }

    /// Command line arguments for one invocation over all queries
    pub fn args(&self, queries: &HashSet<Query>) -> Vec<OsString> {
        let mut output = self.destination.clone().into_os_string();
        output.push(std::path::MAIN_SEPARATOR_STR);
        output.push("%(title)s.%(ext)s");

        let mut args: Vec<OsString> = [
            "--format",
            "bestaudio/best",
            "--extract-audio",
            "--audio-format",
            "mp3",
            "--audio-quality",
            "192K",
            "--no-playlist",
            "--output",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push(output);
        if let Some(cookies) = &self.cookies {
            args.push("--cookies".into());
            args.push(cookies.clone().into_os_string());
        }
        // Sorted for a reproducible download order
        let mut queries: Vec<_> = queries.iter().collect();
        queries.sort_unstable();
        args.push("--".into());
        args.extend(queries.into_iter().map(|q| youtube_search(q).into()));
        args
    }
}

// yt-dlp search syntax for the first hit
fn youtube_search(query: &Query) -> String {
    format!("ytsearch1:{}", query.terms())
}

impl Downloader for YtDlpDownloader {
    async fn download(&self, queries: &HashSet<Query>) -> Result<()> {
        let args = self.args(queries);
        debug!("Running {} {args:?}", self.program.display());
        info!("Downloading {} track(s) into {}", queries.len(), self.destination.display());

        let status = Command::new(&self.program)
            .args(&args)
            .status()
            .await
            .map_err(|e| {
                Error::DownloadError(format!(
                    "Can't run {}: {e}. Is yt-dlp installed?",
                    self.program.display()
                ))
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::DownloadError(format!(
                "{} exited with {status}",
                self.program.display()
            )))
        }
    }
}

/// Prints the queries instead of downloading anything
pub struct DryRunDownloader;

impl Downloader for DryRunDownloader {
    async fn download(&self, queries: &HashSet<Query>) -> Result<()> {
        let mut queries: Vec<_> = queries.iter().map(Query::as_str).collect();
        queries.sort_unstable();
        let mut out = String::new();
        for query in queries {
            out.push_str(query);
            out.push('\n');
        }

        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(out.as_bytes())
            .await
            .map_err(|e| Error::DownloadError(e.to_string()))?;
        stdout
            .flush()
            .await
            .map_err(|e| Error::DownloadError(e.to_string()))
    }
}
