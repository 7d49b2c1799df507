//! The error type shared by request handling code.
//!
//! Each variant maps onto one HTTP status class so the server can report
//! failures without inspecting messages.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Nothing exists at the requested path.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request names something that cannot be acted on.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn is_missing(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Io(e) => e.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// HTTP status for this error. I/O errors about missing files are 404.
    pub fn http_status(&self) -> u16 {
        if self.is_missing() {
            return 404;
        }
        match self {
            Self::InvalidInput(_) => 400,
            _ => 500,
        }
    }

    /// Stable machine-readable name reported to clients.
    pub fn code(&self) -> &'static str {
        if self.is_missing() {
            return "not_found";
        }
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Io(_) => "io_error",
            _ => "internal_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
