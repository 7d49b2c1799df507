//! Persistent store of transform artifacts.
//!
//! Artifacts are flat files named by their cache key. An artifact that exists
//! is valid; nothing is ever evicted, a forced recompute overwrites in place.

use std::io;
use std::path::{Path, PathBuf};

use super::error::{Result, TransformError};
use super::source::LoadedSource;

/// Directory of transform artifacts.
#[derive(Debug, Clone)]
pub struct TransformCache {
    dir: PathBuf,
}

impl TransformCache {
    /// Open the cache at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    /// Read the artifact for `key`. Any failure is a miss.
    pub fn load(&self, key: &str) -> Option<LoadedSource> {
        let path = self.path_for(key);
        match read_artifact(&path) {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!("Unreadable cache artifact {:?}: {}", path, e);
                }
                None
            }
        }
    }

    /// Persist `bytes` as the artifact for `key`, replacing any existing one.
    pub fn store(&self, key: &str, bytes: &[u8]) -> Result<PathBuf> {
        if bytes.is_empty() {
            return Err(TransformError::EmptyResult);
        }

        // The directory may have been deleted through the file routes.
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        std::fs::write(&path, bytes)?;
        tracing::debug!("Stored {} bytes at {:?}", bytes.len(), path);
        Ok(path)
    }
}

fn read_artifact(path: &Path) -> io::Result<LoadedSource> {
    let modified = std::fs::metadata(path)?.modified()?;
    let bytes = std::fs::read(path)?.into();
    Ok(LoadedSource { bytes, modified })
}
