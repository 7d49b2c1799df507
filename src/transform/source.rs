//! The file a transform request is about.
//!
//! Both the request parser (which may need the source mime type to pick an
//! output format) and the executor read the source. It is loaded at most once,
//! on first access, and shared from then on.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use parking_lot::Mutex;

use crate::mime::{sniff_mime, MimeCache};

/// Contents and metadata of a loaded source file.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub bytes: Bytes,
    pub modified: SystemTime,
}

impl LoadedSource {
    /// Modification time as unix seconds.
    pub fn mtime(&self) -> i64 {
        unix_seconds(self.modified)
    }
}

/// Lazily loaded source file.
#[derive(Debug)]
pub struct SourceFile {
    path: PathBuf,
    loaded: Mutex<Option<Arc<LoadedSource>>>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            loaded: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name component of the path, empty for a bare root.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Read the file on first call; later calls return the same contents.
    ///
    /// A failed read is not remembered, so the next call tries again.
    pub fn load(&self) -> io::Result<Arc<LoadedSource>> {
        let mut loaded = self.loaded.lock();
        if let Some(source) = loaded.as_ref() {
            return Ok(Arc::clone(source));
        }

        let modified = std::fs::metadata(&self.path)?.modified()?;
        let bytes = Bytes::from(std::fs::read(&self.path)?);
        tracing::debug!("Loaded source {:?} ({} bytes)", self.path, bytes.len());

        let source = Arc::new(LoadedSource { bytes, modified });
        *loaded = Some(Arc::clone(&source));
        Ok(source)
    }

    /// Whether the contents have been read yet.
    pub fn is_loaded(&self) -> bool {
        self.loaded.lock().is_some()
    }

    /// Sniffed mime type of the contents, memoized in `cache`.
    pub fn mime_type(&self, cache: &MimeCache) -> io::Result<String> {
        let source = self.load()?;
        Ok(cache.lookup_with(&self.path, source.mtime(), || {
            Ok(sniff_mime(&source.bytes))
        }))
    }
}

pub(crate) fn unix_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}
