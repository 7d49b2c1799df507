//! File and directory descriptions for `?info` requests.

use std::fs::Metadata;
use std::io;
use std::path::Path;

use mama_common::naming;
use mama_common::paths::relative_to_root;
use serde::Serialize;

use crate::config::FrontendConfig;
use crate::transform::source::unix_seconds;
use crate::APP_NAME;

use super::AppContext;

/// One entry of a listing. Directories carry their children.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    /// Display name: the decoded base name, or the app name for the root.
    pub name: String,
    /// Name on disk.
    pub file_name: String,
    pub file_ext: String,
    /// Path relative to the served root.
    pub path: String,
    pub is_dir: bool,
    pub mime_type: String,
    pub size: u64,
    pub mtime: i64,
    pub frontend: FrontendConfig,
    pub dirs: Vec<FileInfo>,
    pub files: Vec<FileInfo>,
}

impl FileInfo {
    /// Describe `path` without looking at its children.
    pub fn describe(ctx: &AppContext, path: &Path, meta: &Metadata) -> Self {
        let rel = relative_to_root(&ctx.root, path);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut info = FileInfo {
            name: file_name.clone(),
            file_name,
            file_ext: String::new(),
            path: rel,
            is_dir: meta.is_dir(),
            mime_type: String::new(),
            size: 0,
            mtime: 0,
            frontend: ctx.config.frontend.clone(),
            dirs: Vec::new(),
            files: Vec::new(),
        };

        if info.is_dir {
            if info.path.is_empty() {
                info.name = APP_NAME.to_string();
                info.file_name = APP_NAME.to_string();
            }
        } else {
            let original = naming::decode(&info.file_name);
            info.file_ext = naming::split_extension(&original).1.to_string();
            info.name = naming::decode_base(&info.file_name).to_string();
            info.size = meta.len();
            info.mtime = meta.modified().map(unix_seconds).unwrap_or(0);
            info.mime_type = ctx.mime.lookup(path, info.mtime);
        }

        info
    }

    /// Describe `path` and, for a directory, its immediate children.
    ///
    /// Subdirectories are sorted by name and exclude the transform cache;
    /// files are sorted oldest first.
    pub fn list(ctx: &AppContext, path: &Path, meta: &Metadata) -> io::Result<Self> {
        let mut info = Self::describe(ctx, path, meta);
        if !info.is_dir {
            return Ok(info);
        }

        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let child_path = entry.path();
            let child_meta = entry.metadata()?;
            let child = Self::describe(ctx, &child_path, &child_meta);

            if child.is_dir {
                if child.path != ctx.config.storage.cache_dir {
                    info.dirs.push(child);
                }
            } else {
                info.files.push(child);
            }
        }

        info.dirs.sort_by(|a, b| a.name.cmp(&b.name));
        info.files.sort_by_key(|f| f.mtime);

        Ok(info)
    }
}
