//! Timestamped history snapshots.
//!
//! Every save writes a new `{prefix}-{YYYYmmddHHMMSSfff}.json` file; existing
//! snapshots are never modified. Loading picks the lexicographically greatest
//! file name with the prefix, which is the most recent one.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};

use examgen_core::history::History;

use crate::error::IoError;

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S%3f";

/// A directory of history snapshots sharing a file name prefix.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    dir: PathBuf,
    prefix: String,
}

impl HistoryStore {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn is_snapshot(&self, name: &str) -> bool {
        name.strip_prefix(&self.prefix)
            .and_then(|rest| rest.strip_prefix('-'))
            .is_some_and(|rest| rest.ends_with(".json"))
    }

    /// Every snapshot path, oldest first.
    pub fn snapshots(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let entries = std::fs::read_dir(&self.dir).map_err(|source| IoError::UnreadableHistoryDir {
            path: self.dir.clone(),
            source,
        })?;

        let mut names: Vec<String> = Vec::new();
        for entry in entries {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                if self.is_snapshot(name) && entry.path().is_file() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names.into_iter().map(|n| self.dir.join(n)).collect())
    }

    pub fn latest(&self) -> Result<Option<PathBuf>> {
        Ok(self.snapshots()?.pop())
    }

    /// Load the most recent snapshot, or an empty history if there is none.
    pub fn load_latest(&self) -> Result<History> {
        match self.latest()? {
            Some(path) => {
                let history = load_snapshot(&path)?;
                tracing::info!(
                    path = %path.display(),
                    exams = history.len(),
                    "read exam history"
                );
                Ok(history)
            }
            None => {
                tracing::info!(dir = %self.dir.display(), "no exam history yet; starting fresh");
                Ok(History::new())
            }
        }
    }

    /// Write a new snapshot stamped with the current local time.
    pub fn save(&self, history: &History) -> Result<PathBuf> {
        self.save_at(history, Local::now().naive_local())
    }

    /// Write a new snapshot with an explicit timestamp.
    pub fn save_at(&self, history: &History, at: NaiveDateTime) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create history directory: {}", self.dir.display()))?;

        let path = self
            .dir
            .join(format!("{}-{}.json", self.prefix, at.format(TIMESTAMP_FORMAT)));
        let json = serde_json::to_string_pretty(history).context("failed to serialize history")?;

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(IoError::SnapshotExists { path }.into());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to create snapshot: {}", path.display()));
            }
        };
        file.write_all(json.as_bytes())
            .with_context(|| format!("failed to write snapshot: {}", path.display()))?;

        tracing::info!(path = %path.display(), exams = history.len(), "recorded exam history");
        Ok(path)
    }
}

/// Read one snapshot file.
pub fn load_snapshot(path: &Path) -> Result<History> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse snapshot: {}", path.display()))
}
