//! Tool settings (`examgen.toml`): where bank files, output and history live.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::snapshot::HistoryStore;

/// Top-level examgen settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamgenSettings {
    /// Directory that question bank and signup paths are relative to.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Directory rendered documents are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Directory holding history snapshots.
    #[serde(default = "default_history_dir")]
    pub history_dir: PathBuf,
    /// File name prefix shared by history snapshots.
    #[serde(default = "default_history_prefix")]
    pub history_prefix: String,
    /// Image path prefix used in rendered `\includegraphics` commands.
    #[serde(default = "default_images_dir")]
    pub images_dir: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}
fn default_history_dir() -> PathBuf {
    PathBuf::from("./history")
}
fn default_history_prefix() -> String {
    "existingexams".to_string()
}
fn default_images_dir() -> String {
    "../images".to_string()
}

impl Default for ExamgenSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            output_dir: default_output_dir(),
            history_dir: default_history_dir(),
            history_prefix: default_history_prefix(),
            images_dir: default_images_dir(),
        }
    }
}

impl ExamgenSettings {
    pub fn history_store(&self) -> HistoryStore {
        HistoryStore::new(&self.history_dir, &self.history_prefix)
    }

    /// Resolve a plan-relative file name against the data directory.
    pub fn data_path(&self, name: &str) -> PathBuf {
        let p = Path::new(name);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.data_dir.join(p)
        }
    }

    fn resolve_env(self) -> Self {
        Self {
            data_dir: resolve_env_vars(&self.data_dir.to_string_lossy()).into(),
            output_dir: resolve_env_vars(&self.output_dir.to_string_lossy()).into(),
            history_dir: resolve_env_vars(&self.history_dir.to_string_lossy()).into(),
            history_prefix: self.history_prefix,
            images_dir: resolve_env_vars(&self.images_dir),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
    }
    result
}

/// Load settings from well-known paths.
///
/// Search order:
/// 1. `examgen.toml` in the current directory
/// 2. `~/.config/examgen/config.toml`
///
/// `EXAMGEN_HISTORY_DIR` overrides `history_dir`.
pub fn load_settings() -> Result<ExamgenSettings> {
    load_settings_from(None)
}

/// Load settings from an explicit path, or search the default locations.
pub fn load_settings_from(path: Option<&Path>) -> Result<ExamgenSettings> {
    let settings_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("settings file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("examgen.toml");
            if local.exists() {
                Some(local)
            } else {
                config_dir()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let settings = match settings_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed = toml::from_str::<ExamgenSettings>(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded settings");
            parsed
        }
        None => ExamgenSettings::default(),
    };

    let mut settings = settings.resolve_env();
    if let Ok(dir) = std::env::var("EXAMGEN_HISTORY_DIR") {
        if !dir.is_empty() {
            settings.history_dir = PathBuf::from(dir);
        }
    }
    Ok(settings)
}

fn config_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examgen"))
}
