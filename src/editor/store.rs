use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

pub const STORE_FILE_NAME: &str = "crossline_state.json";
pub const LINE_KEY: &str = "line";
pub const PARAMS_KEY: &str = "params";
const APP_DIR_NAME: &str = "crossline";

/// Picks the configured path, else the platform data dir, else the working
/// directory.
pub fn resolve_store_path(configured: Option<&str>) -> PathBuf {
    if let Some(path) = configured.filter(|p| !p.trim().is_empty()) {
        return PathBuf::from(path);
    }
    match dirs_next::data_dir() {
        Some(dir) => dir.join(APP_DIR_NAME).join(STORE_FILE_NAME),
        None => PathBuf::from(STORE_FILE_NAME),
    }
}

/// Durable key-value store backed by a single JSON object file.
///
/// Entries are independent: an entry that no longer deserializes is reported
/// as absent without affecting the others.
#[derive(Debug, Clone, PartialEq)]
pub struct StateStore {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl StateStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match load_entries(&path) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(?err, path = %path.display(), "ignoring unreadable state store");
                Map::new()
            }
        };
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.entries.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                tracing::warn!(%err, key, "ignoring unparsable state entry");
                None
            }
        }
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)
            .with_context(|| format!("serialize state entry {key}"))?;
        self.entries.insert(key.to_string(), value);
        self.flush()
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create state store folder {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.entries).context("serialize state store")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("write state store {}", self.path.display()))
    }
}

fn load_entries(path: &Path) -> Result<Map<String, Value>> {
    if !path.exists() {
        return Ok(Map::new());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read state store {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(Map::new());
    }
    serde_json::from_str(&content)
        .with_context(|| format!("deserialize state store {}", path.display()))
}
