use std::{cell::RefCell, collections::HashMap, sync::Mutex};

use log::{LevelFilter, Log, Metadata, Record};
use serde_json::{Value, json};

use crate::clients::{errors::FetchError, spotify::ResourceFetcher};

pub const API_BASE: &str = "https://api.test/v1";

/// In-memory catalog answering a fixed set of urls. Unknown urls get a 404.
#[derive(Default)]
pub struct ScriptedFetcher {
    responses: HashMap<String, Result<Value, FetchError>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, url: impl Into<String>, content: Value) -> Self {
        self.responses.insert(url.into(), Ok(content));
        self
    }

    pub fn fail(mut self, url: impl Into<String>, err: FetchError) -> Self {
        self.responses.insert(url.into(), Err(err));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ResourceFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str, _token: &str) -> Result<Value, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.responses.get(url).cloned().unwrap_or_else(|| {
            Err(FetchError::Status {
                status: 404,
                message: "Non existing id".into(),
            })
        })
    }
}

pub fn track_json(name: &str, artists: &[&str]) -> Value {
    json!({
        "name": name,
        "artists": artists.iter().map(|a| json!({"name": a})).collect::<Vec<_>>(),
        "external_urls": {"spotify": format!("https://open.spotify.com/track/{}", name.len())},
    })
}

pub fn album_url(id: &str) -> String {
    format!("{API_BASE}/albums/{id}/tracks?limit=50")
}

pub fn playlist_url(id: &str) -> String {
    format!(
        "{API_BASE}/playlists/{id}/tracks?fields=items(track(artists.name,external_urls.spotify,name)),next"
    )
}

pub fn track_url(id: &str) -> String {
    format!("{API_BASE}/tracks/{id}")
}

pub fn page(items: Vec<Value>, next: Option<&str>) -> Value {
    json!({"items": items, "next": next})
}

thread_local! {
    static CAPTURED: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

// Records messages per thread, so tests running in parallel don't mix logs
struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        CAPTURED.with(|logs| logs.borrow_mut().push(record.args().to_string()));
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;

/// Starts capturing log messages emitted on the current thread
pub fn capture_logs() {
    // Fails when another test already installed it
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(LevelFilter::Debug);
    CAPTURED.with(|logs| logs.borrow_mut().clear());
}

pub fn captured_logs() -> Vec<String> {
    CAPTURED.with(|logs| logs.borrow().clone())
}
