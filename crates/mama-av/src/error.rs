//! Error types for mama-av.

use std::path::PathBuf;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a frame could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The extraction program could not be started.
    #[error("{tool} is not installed or not on PATH")]
    ToolNotFound { tool: String },

    /// The extraction program exited unsuccessfully.
    #[error("{tool} exited with {}: {stderr}", status.map_or_else(|| "a signal".to_string(), |c| format!("status {c}")))]
    ToolFailed {
        tool: String,
        status: Option<i32>,
        stderr: String,
    },

    /// The video to read from does not exist.
    #[error("video not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// The video ended before the requested frame.
    #[error("{} has no frame {frame}", path.display())]
    NoFrame { path: PathBuf, frame: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }
}
