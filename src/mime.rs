//! Content sniffing and the per-file mime memo.
//!
//! Listings report a sniffed mime type for every file. Sniffing means opening
//! the file, so results are memoized per (path, modification time): a file
//! that is rewritten gets a new entry, an unchanged one is never re-read.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// How many leading bytes are inspected when sniffing a file.
pub const SNIFF_LEN: u64 = 3072;

const OCTET_STREAM: &str = "application/octet-stream";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Sniff the mime type of `bytes` from their magic numbers.
///
/// Unrecognised UTF-8 content is reported as plain text, anything else as
/// `application/octet-stream`.
pub fn sniff_mime(bytes: &[u8]) -> String {
    if let Some(kind) = infer::get(bytes) {
        return kind.mime_type().to_string();
    }

    if bytes.is_empty() || looks_like_text(bytes) {
        TEXT_PLAIN.to_string()
    } else {
        OCTET_STREAM.to_string()
    }
}

fn looks_like_text(bytes: &[u8]) -> bool {
    match std::str::from_utf8(bytes) {
        Ok(s) => !s.contains('\0'),
        // A multi-byte sequence may be cut off at the sniff boundary.
        Err(e) => e.error_len().is_none() && !bytes[..e.valid_up_to()].contains(&0),
    }
}

/// Sniff the mime type of the file at `path` from its first [`SNIFF_LEN`] bytes.
pub fn sniff_file(path: &Path) -> std::io::Result<String> {
    let mut head = Vec::with_capacity(SNIFF_LEN as usize);
    File::open(path)?.take(SNIFF_LEN).read_to_end(&mut head)?;
    Ok(sniff_mime(&head))
}

/// Memo of sniffed mime types keyed by path and modification time.
///
/// A single lock covers both the lookup and the insert, so two concurrent
/// lookups of the same file never sniff it twice.
#[derive(Debug, Default)]
pub struct MimeCache {
    entries: Mutex<HashMap<(PathBuf, i64), String>>,
}

impl MimeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mime type of `path` as of modification time `mtime` (unix seconds).
    ///
    /// Returns an empty string when the file cannot be sniffed; failures are
    /// not memoized.
    pub fn lookup(&self, path: &Path, mtime: i64) -> String {
        self.lookup_with(path, mtime, || sniff_file(path))
    }

    /// Like [`lookup`](Self::lookup), with a caller-provided sniffer used on
    /// a miss.
    pub fn lookup_with<F>(&self, path: &Path, mtime: i64, sniff: F) -> String
    where
        F: FnOnce() -> std::io::Result<String>,
    {
        let key = (path.to_path_buf(), mtime);
        let mut entries = self.entries.lock();

        if let Some(mime) = entries.get(&key) {
            return mime.clone();
        }

        match sniff() {
            Ok(mime) => {
                entries.insert(key, mime.clone());
                mime
            }
            Err(e) => {
                tracing::debug!("Failed to sniff mime type of {:?}: {}", path, e);
                String::new()
            }
        }
    }

    /// Number of memoized entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if the memo is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn test_sniff_mime() {
        assert_eq!(sniff_mime(PNG_MAGIC), "image/png");
        assert_eq!(sniff_mime(b"\xFF\xD8\xFF\xE0\0\x10JFIF\0"), "image/jpeg");
        assert_eq!(sniff_mime(b"GIF89a\x01\0\x01\0"), "image/gif");
        assert_eq!(sniff_mime(b"hello world"), TEXT_PLAIN);
        assert_eq!(sniff_mime(b""), TEXT_PLAIN);
        assert_eq!(sniff_mime(&[0x00, 0x9f, 0x92, 0x96, 0x00]), OCTET_STREAM);
    }

    #[test]
    fn test_truncated_utf8_is_text() {
        // "é" cut in half at the end of the sniff window.
        assert_eq!(sniff_mime(b"caf\xC3"), TEXT_PLAIN);
    }

    #[test]
    fn test_lookup_memoizes_per_mtime() {
        let cache = MimeCache::new();
        let path = Path::new("/virtual/a.png");
        let calls = Cell::new(0);
        let sniff = || {
            calls.set(calls.get() + 1);
            Ok("image/png".to_string())
        };

        assert_eq!(cache.lookup_with(path, 100, sniff), "image/png");
        assert_eq!(cache.lookup_with(path, 100, sniff), "image/png");
        assert_eq!(calls.get(), 1);

        // Rewritten file: new mtime, sniffed again.
        assert_eq!(cache.lookup_with(path, 200, sniff), "image/png");
        assert_eq!(calls.get(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_lookup_failure_not_memoized() {
        let cache = MimeCache::new();
        let mime = cache.lookup(Path::new("/definitely/not/here"), 1);
        assert_eq!(mime, "");
        assert!(cache.is_empty());
    }

    #[test]
    fn test_lookup_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.bin");
        std::fs::write(&path, PNG_MAGIC).unwrap();

        let cache = MimeCache::new();
        assert_eq!(cache.lookup(&path, 42), "image/png");
        assert_eq!(cache.len(), 1);
    }
}
