//! Mama-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across mama:
//!
//! - **Filename codec**: Reversible hash-tagged names for cache-busting
//! - **Path Utilities**: Sandboxed path resolution and upload name checks
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use mama_common::naming;
//! use mama_common::paths::resolve_under_root;
//! use mama_common::{Error, Result};
//! use std::path::Path;
//!
//! // Tag a name with a content hash and recover it again
//! let stored = naming::encode("photo.jpg", "3fa9c2e1d0b4a7f6");
//! assert_eq!(naming::decode(&stored), "photo.jpg");
//!
//! // Request paths never escape the served root
//! let path = resolve_under_root(Path::new("/srv"), "../../etc/passwd");
//! assert_eq!(path, Path::new("/srv/etc/passwd"));
//!
//! // Use common error types
//! fn example() -> Result<()> {
//!     Err(Error::not_found("photo.jpg"))
//! }
//! ```

pub mod error;
pub mod naming;
pub mod paths;

pub use error::{Error, Result};
