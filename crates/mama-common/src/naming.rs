//! Hash-tagged file names.
//!
//! Uploaded files are stored as `<base>.<tag><ext>`, where the tag embeds a
//! short prefix of the content hash. Browsers and proxies can then cache a
//! file URL forever: new content produces a new name. The tag is built as
//!
//! ```text
//! <i><hash[..i]><salt><hash[i..]>
//! ```
//!
//! with `i` a random single decimal digit, which lets [`decode`] recognise a
//! tag by finding the salt at position `i + 1` and recover the original name.

use rand::Rng;

/// Number of hash characters embedded in a tag.
pub const HASH_TAG_LEN: usize = 8;

/// Marker that identifies a tag.
pub const HASH_TAG_SALT: &str = "mm";

/// Upper bound (exclusive) for the salt insertion index.
const MAX_SALT_INDEX: usize = 10;

/// Split a file name into `(base, ext)` where `ext` starts at the last dot.
///
/// `ext` keeps its leading `.` and is empty when the name has no dot.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) => name.split_at(idx),
        None => (name, ""),
    }
}

/// Build the stored name for `original_name` with content hash `content_hash`.
///
/// The salt position is random, so two calls with the same arguments usually
/// yield different names.
///
/// # Examples
///
/// ```
/// use mama_common::naming::{decode, encode};
///
/// let stored = encode("report.pdf", "9f86d081884c7d65");
/// assert!(stored.starts_with("report."));
/// assert!(stored.ends_with(".pdf"));
/// assert_eq!(decode(&stored), "report.pdf");
/// ```
pub fn encode(original_name: &str, content_hash: &str) -> String {
    let prefix = hash_prefix(content_hash);
    let max_index = prefix.len().min(MAX_SALT_INDEX);
    let index = if max_index == 0 {
        0
    } else {
        rand::thread_rng().gen_range(0..max_index)
    };
    encode_with_index(original_name, content_hash, index)
}

/// Deterministic variant of [`encode`] with a caller-chosen salt index.
///
/// `index` is clamped to the usable range.
pub fn encode_with_index(original_name: &str, content_hash: &str, index: usize) -> String {
    let prefix = hash_prefix(content_hash);
    let index = index.min(prefix.len().min(MAX_SALT_INDEX).saturating_sub(1));
    let (head, tail) = prefix.split_at(index);
    let tag = format!("{index}{head}{HASH_TAG_SALT}{tail}");

    let (base, ext) = split_extension(original_name);
    format!("{base}.{tag}{ext}")
}

/// Recover the display base name (without extension) from a stored name.
///
/// Names without a recognisable tag are returned with only their extension
/// removed.
///
/// # Examples
///
/// ```
/// use mama_common::naming::decode_base;
///
/// assert_eq!(decode_base("cat.3a1bmm2c9d0.png"), "cat");
/// assert_eq!(decode_base("cat.png"), "cat");
/// assert_eq!(decode_base("cat.v2.png"), "cat.v2");
/// ```
pub fn decode_base(stored_name: &str) -> &str {
    let (base, ext) = split_extension(stored_name);

    if let Some((name, tag)) = base.rsplit_once('.') {
        if is_tag(tag) {
            return name;
        }
    }

    // A name that had no extension before tagging ends in `.tag`.
    if ext.len() > 1 && is_tag(&ext[1..]) {
        return base;
    }

    base
}

/// Recover the full original name (with extension) from a stored name.
///
/// # Examples
///
/// ```
/// use mama_common::naming::decode;
///
/// assert_eq!(decode("cat.3a1bmm2c9d0.png"), "cat.png");
/// assert_eq!(decode("notes.0mm12345678"), "notes");
/// assert_eq!(decode("plain.txt"), "plain.txt");
/// ```
pub fn decode(stored_name: &str) -> String {
    let (base, ext) = split_extension(stored_name);

    if let Some((name, tag)) = base.rsplit_once('.') {
        if is_tag(tag) {
            return format!("{name}{ext}");
        }
    }

    if ext.len() > 1 && is_tag(&ext[1..]) {
        return base.to_string();
    }

    stored_name.to_string()
}

/// Whether `candidate` has the shape of a tag produced by [`encode`].
pub fn is_tag(candidate: &str) -> bool {
    let bytes = candidate.as_bytes();
    let Some(first) = bytes.first() else {
        return false;
    };
    if !first.is_ascii_digit() {
        return false;
    }

    let start = usize::from(first - b'0') + 1;
    let end = start + HASH_TAG_SALT.len();
    bytes.get(start..end) == Some(HASH_TAG_SALT.as_bytes())
}

fn hash_prefix(content_hash: &str) -> &str {
    match content_hash.char_indices().nth(HASH_TAG_LEN) {
        Some((idx, _)) => &content_hash[..idx],
        None => content_hash,
    }
}
