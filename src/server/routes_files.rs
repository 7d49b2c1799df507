//! Read, upload and delete handlers for `<base>/-/*path`.

use std::collections::HashMap;
use std::io;
use std::path::{Path as FsPath, PathBuf};

use axum::{
    extract::{multipart::Field, Multipart, Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use mama_common::paths::{is_valid_file_name, relative_to_root, resolve_under_root};
use mama_common::{naming, Error};
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;

use super::listing::FileInfo;
use super::serve::serve_content;
use super::{AppContext, AppError};
use crate::buffer_pool::PooledBuffer;
use crate::transform::request::QUERY_KEY;

const SUCCESS: &str = "Success";

/// Query flag asking for a JSON description instead of the content.
const INFO_KEY: &str = "info";

fn request_path(path: Option<Path<String>>) -> String {
    path.map(|Path(p)| p).unwrap_or_default()
}

async fn join_blocking<T>(task: tokio::task::JoinHandle<T>) -> Result<T, Error> {
    task.await
        .map_err(|e| Error::internal(format!("blocking task failed: {e}")))
}

/// `GET`: file content (optionally transformed), or a listing with `?info`.
pub async fn read_file(
    State(ctx): State<AppContext>,
    path: Option<Path<String>>,
    Query(mut params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let req_path = request_path(path);
    let full = resolve_under_root(&ctx.root, &req_path);

    let meta = match tokio::fs::metadata(&full).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::not_found("file not found").into());
        }
        Err(e) => return Err(e.into()),
    };

    if params.contains_key(INFO_KEY) {
        let list_ctx = ctx.clone();
        let info = join_blocking(tokio::task::spawn_blocking(move || {
            FileInfo::list(&list_ctx, &full, &meta)
        }))
        .await??;
        return Ok(Json(info).into_response());
    }

    if meta.is_dir() {
        let target = format!("{}/{}", ctx.base_path(), req_path.trim_start_matches('/'));
        return Ok(Redirect::temporary(&target).into_response());
    }

    let rel_path = relative_to_root(&ctx.root, &full);
    let param = params.remove(QUERY_KEY);
    let transformer = ctx.transformer.clone();
    let served = join_blocking(tokio::task::spawn_blocking(move || {
        transformer.serve(full, &rel_path, param.as_deref())
    }))
    .await??;

    tracing::debug!("Serving {} ({:?})", req_path, served.origin);
    Ok(serve_content(&headers, served))
}

/// `POST`: create the directory, then store an optional `file` part under
/// its hash-tagged name.
pub async fn write_file(
    State(ctx): State<AppContext>,
    path: Option<Path<String>>,
    multipart: Option<Multipart>,
) -> Result<&'static str, AppError> {
    let dir = resolve_under_root(&ctx.root, &request_path(path));

    if !tokio::fs::try_exists(&dir).await.unwrap_or(false) {
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            Error::internal(format!("Error creating directory {}: {e}", dir.display()))
        })?;
        tracing::info!("Created directory {:?}", dir);
    }

    let Some(mut multipart) = multipart else {
        return Ok(SUCCESS);
    };

    let mut upload: Option<Upload> = None;
    let mut name_field: Option<String> = None;

    loop {
        let mut field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                discard(upload.take()).await;
                return Err(Error::invalid_input(format!("malformed multipart body: {e}")).into());
            }
        };

        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") if upload.is_none() => {
                let file_name = field.file_name().map(str::to_string);
                let mut buf = ctx.buffers.get();
                let stored = receive(&dir, &mut field, &mut buf).await;
                upload = Some(stored.map(|(temp, hash)| Upload {
                    temp,
                    hash,
                    file_name,
                })?);
            }
            Some("filename") => match field.text().await {
                Ok(text) => name_field = Some(text),
                Err(e) => {
                    discard(upload.take()).await;
                    return Err(Error::invalid_input(format!("unreadable filename: {e}")).into());
                }
            },
            _ => {}
        }
    }

    let Some(upload) = upload else {
        return Ok(SUCCESS);
    };

    let name = name_field
        .filter(|n| !n.is_empty())
        .or_else(|| upload.file_name.clone())
        .unwrap_or_default();
    if !is_valid_file_name(&name) {
        discard(Some(upload)).await;
        return Err(Error::invalid_input(format!("invalid file name {name:?}")).into());
    }

    let stored_name = naming::encode(&name, &upload.hash);
    let target = dir.join(&stored_name);
    if let Err(e) = tokio::fs::rename(&upload.temp, &target).await {
        discard(Some(upload)).await;
        return Err(Error::internal(format!("failed to store {stored_name}: {e}")).into());
    }

    tracing::info!("Stored upload {:?} as {:?}", name, target);
    Ok(SUCCESS)
}

/// `DELETE`: remove a file or a directory tree. The root itself is refused.
pub async fn delete_file(
    State(ctx): State<AppContext>,
    path: Option<Path<String>>,
) -> Result<&'static str, AppError> {
    let target = resolve_under_root(&ctx.root, &request_path(path));
    if target == ctx.root {
        return Err(Error::invalid_input("refusing to delete the root directory").into());
    }

    let result = match tokio::fs::symlink_metadata(&target).await {
        Ok(meta) if meta.is_dir() => tokio::fs::remove_dir_all(&target).await,
        Ok(_) => tokio::fs::remove_file(&target).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => tracing::info!("Deleted {:?}", target),
        // Already gone.
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    Ok(SUCCESS)
}

/// An upload written to a temporary file, not yet renamed.
struct Upload {
    temp: PathBuf,
    hash: String,
    file_name: Option<String>,
}

async fn discard(upload: Option<Upload>) {
    if let Some(upload) = upload {
        if let Err(e) = tokio::fs::remove_file(&upload.temp).await {
            tracing::warn!("Failed to remove partial upload {:?}: {}", upload.temp, e);
        }
    }
}

/// Stream `field` into a temporary file in `dir`, returning its path and the
/// SHA-256 of the content. The partial file is removed on failure.
async fn receive(
    dir: &FsPath,
    field: &mut Field<'_>,
    buf: &mut PooledBuffer,
) -> Result<(PathBuf, String), Error> {
    let temp = dir.join(format!(".upload-{}", uuid::Uuid::new_v4()));
    let mut file = tokio::fs::File::create(&temp).await?;

    match copy_field(field, &mut file, buf).await {
        Ok(hash) => Ok((temp, hash)),
        Err(e) => {
            drop(file);
            if let Err(rm) = tokio::fs::remove_file(&temp).await {
                tracing::warn!("Failed to remove partial upload {:?}: {}", temp, rm);
            }
            Err(Error::internal(format!("upload failed: {e}")))
        }
    }
}

/// Copy through `buf`, writing only whole buffers until the final flush.
async fn copy_field(
    field: &mut Field<'_>,
    file: &mut tokio::fs::File,
    buf: &mut PooledBuffer,
) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut filled = 0;

    while let Some(chunk) = field.chunk().await.map_err(io::Error::other)? {
        hasher.update(&chunk);

        let mut rest = &chunk[..];
        while !rest.is_empty() {
            let n = rest.len().min(buf.len() - filled);
            buf[filled..filled + n].copy_from_slice(&rest[..n]);
            filled += n;
            rest = &rest[n..];

            if filled == buf.len() {
                file.write_all(&buf[..filled]).await?;
                filled = 0;
            }
        }
    }

    if filled > 0 {
        file.write_all(&buf[..filled]).await?;
    }
    file.flush().await?;

    Ok(hex::encode(hasher.finalize()))
}
