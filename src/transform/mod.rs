//! On-demand transforms of served files.
//!
//! A read with a `?t=` query goes through [`Transformer::serve`]:
//!
//! 1. parse the query into a [`TransformRequest`] and its cache key
//! 2. unless forced, serve an existing artifact for the key
//! 3. otherwise run the pipeline, persist the result and serve the artifact
//! 4. on any failure along the way, serve the untransformed source
//!
//! Only a source that cannot be read is an error.

pub mod cache;
pub mod error;
pub mod executor;
pub mod format;
pub mod imaging;
pub mod operation;
pub mod request;
pub mod source;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use bytes::Bytes;
use mama_av::FrameExtractor;

pub use cache::TransformCache;
pub use error::TransformError;
pub use executor::{Executor, PipelineRun, PipelineState};
pub use format::ImageFormat;
pub use operation::{OperationKind, TransformOperation};
pub use request::TransformRequest;
pub use source::{LoadedSource, SourceFile};

use crate::mime::MimeCache;

/// Where a served body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// An existing artifact.
    Cache,
    /// An artifact computed by this request.
    Fresh,
    /// The untransformed source.
    Source,
}

/// Body and metadata for a file response.
#[derive(Debug, Clone)]
pub struct Served {
    pub body: Bytes,
    /// Name used to pick the content type. Artifacts are named by their
    /// cache key, which has no extension, so their type is sniffed.
    pub name: String,
    pub modified: SystemTime,
    pub origin: Origin,
}

impl Served {
    fn from_source(source: &SourceFile, loaded: &LoadedSource) -> Self {
        Self {
            body: loaded.bytes.clone(),
            name: source.name(),
            modified: loaded.modified,
            origin: Origin::Source,
        }
    }
}

/// Orchestrates parse, cache lookup, execution, persistence and fallback.
#[derive(Clone)]
pub struct Transformer {
    cache: TransformCache,
    executor: Executor,
    mime: Arc<MimeCache>,
}

impl Transformer {
    pub fn new(cache: TransformCache, frames: Arc<dyn FrameExtractor>, mime: Arc<MimeCache>) -> Self {
        Self {
            cache,
            executor: Executor::new(frames),
            mime,
        }
    }

    pub fn cache(&self) -> &TransformCache {
        &self.cache
    }

    /// Produce the response body for `path` (relative form `rel_path`) with
    /// transform query `param`.
    pub fn serve(
        &self,
        path: impl Into<PathBuf>,
        rel_path: &str,
        param: Option<&str>,
    ) -> std::io::Result<Served> {
        let source = SourceFile::new(path);

        let Some(request) = TransformRequest::parse(rel_path, param, &source, &self.mime) else {
            let loaded = source.load()?;
            return Ok(Served::from_source(&source, &loaded));
        };

        match self.transform(&source, &request) {
            Some(served) => Ok(served),
            None => {
                tracing::warn!("Serving untransformed {} for key {}", rel_path, request.cache_key);
                let loaded = source.load()?;
                Ok(Served::from_source(&source, &loaded))
            }
        }
    }

    /// Cached or freshly computed artifact; `None` means fall back.
    fn transform(&self, source: &SourceFile, request: &TransformRequest) -> Option<Served> {
        let key = &request.cache_key;

        if !request.force {
            if let Some(artifact) = self.cache.load(key) {
                tracing::info!("Cache hit for {} ({})", request.source_path, key);
                return Some(served(key, artifact, Origin::Cache));
            }
            tracing::info!("Cache miss for {} ({})", request.source_path, key);
        } else {
            tracing::info!("Forced transform of {} ({})", request.source_path, key);
        }

        let result = match self.executor.run(source, &request.operations) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Transform of {} failed: {}", request.source_path, e);
                return None;
            }
        };

        if let Err(e) = self.cache.store(key, &result) {
            tracing::warn!("Failed to store artifact {}: {}", key, e);
            return None;
        }

        // Serve what was written, so a hit and a miss answer identically.
        let artifact = self.cache.load(key)?;
        Some(served(key, artifact, Origin::Fresh))
    }
}

fn served(key: &str, artifact: LoadedSource, origin: Origin) -> Served {
    Served {
        body: artifact.bytes,
        name: key.to_string(),
        modified: artifact.modified,
        origin,
    }
}
