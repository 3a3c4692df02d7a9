use std::path::Path;

use log::debug;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::clients::errors::{Error, Result};

/// How lines are read from the reference source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Read until EOF, blank lines are skipped
    File,
    /// Read until the first blank line
    Interactive,
}

/// Reads one reference per line. Line terminators are stripped.
pub async fn read_references<R>(reader: R, mode: InputMode) -> std::io::Result<Vec<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut urls = Vec::new();
    while let Some(line) = lines.next_line().await? {
        if line.is_empty() {
            match mode {
                InputMode::File => continue,
                InputMode::Interactive => break,
            }
        }
        urls.push(line);
    }
    Ok(urls)
}

pub async fn references_from_file(path: &Path) -> Result<Vec<String>> {
    let input_error = |source| Error::InputError {
        path: path.to_path_buf(),
        source,
    };
    let file = tokio::fs::File::open(path).await.map_err(input_error)?;
    let urls = read_references(BufReader::new(file), InputMode::File)
        .await
        .map_err(input_error)?;
    debug!("Read {} url(s) from {}", urls.len(), path.display());
    Ok(urls)
}

/// Prompts for urls on stdout and reads them from stdin until a blank line
pub async fn references_from_stdin() -> Result<Vec<String>> {
    let input_error = |source| Error::InputError {
        path: "<stdin>".into(),
        source,
    };
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(b"> Write below line by line the Spotify url(s):\n")
        .await
        .map_err(input_error)?;
    stdout.flush().await.map_err(input_error)?;

    read_references(BufReader::new(tokio::io::stdin()), InputMode::Interactive)
        .await
        .map_err(input_error)
}
