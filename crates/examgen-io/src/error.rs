//! I/O error types.

use std::path::PathBuf;

use thiserror::Error;

/// Structural problems with input files or the history directory.
///
/// Bad individual rows are not errors; loaders skip them.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("{path}: missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("{path}: no header row")]
    MissingHeader { path: PathBuf },

    #[error("history directory {path} is not readable")]
    UnreadableHistoryDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("refusing to overwrite existing snapshot {path}")]
    SnapshotExists { path: PathBuf },
}

impl IoError {
    /// Whether the problem is with a file's layout rather than the filesystem.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            IoError::MissingColumn { .. } | IoError::MissingHeader { .. }
        )
    }
}
