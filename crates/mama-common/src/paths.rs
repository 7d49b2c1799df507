//! Path utilities for the served directory tree.
//!
//! Every request path is resolved beneath the configured root before it
//! touches the filesystem. Resolution is purely lexical: `..` segments are
//! popped against the segments seen so far and can never climb above the
//! root itself.

use std::path::{Component, Path, PathBuf};

/// Characters that may not appear in an uploaded file name.
const FORBIDDEN_NAME_CHARS: &[char] = &['\\', '/', ':', '*', '<', '>', '|'];

/// Resolve a slash-separated request path beneath `root`.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use mama_common::paths::resolve_under_root;
///
/// let root = Path::new("/srv/files");
/// assert_eq!(resolve_under_root(root, "a/b.png"), Path::new("/srv/files/a/b.png"));
/// assert_eq!(resolve_under_root(root, "/a/../../b.png"), Path::new("/srv/files/b.png"));
/// assert_eq!(resolve_under_root(root, ""), Path::new("/srv/files"));
/// ```
pub fn resolve_under_root(root: &Path, request_path: &str) -> PathBuf {
    let mut segments: Vec<&str> = Vec::new();
    for segment in request_path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let mut resolved = root.to_path_buf();
    resolved.extend(segments);
    resolved
}

/// Path of `path` relative to `root`, joined with `/`.
///
/// The root itself maps to the empty string. A path outside the root is
/// returned as-is.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use mama_common::paths::relative_to_root;
///
/// let root = Path::new("/srv/files");
/// assert_eq!(relative_to_root(root, Path::new("/srv/files/a/b.png")), "a/b.png");
/// assert_eq!(relative_to_root(root, Path::new("/srv/files")), "");
/// ```
pub fn relative_to_root(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) => rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path.to_string_lossy().into_owned(),
    }
}

/// Check whether a client-supplied file name is acceptable for storage.
///
/// # Examples
///
/// ```
/// use mama_common::paths::is_valid_file_name;
///
/// assert!(is_valid_file_name("holiday photo.jpg"));
/// assert!(!is_valid_file_name("../etc/passwd"));
/// assert!(!is_valid_file_name("a|b"));
/// ```
pub fn is_valid_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(FORBIDDEN_NAME_CHARS)
}
