//! Parsing of the `?t=` transform query.
//!
//! ```text
//! t=<stage>[|<stage>...]
//! stage = key=value[,key=value...]
//! keys  = op, w, h, q, fmt, framenum, force
//! ```
//!
//! Parsing never fails. Stages without a known `op` are dropped, unknown keys
//! are ignored and numbers that do not parse keep their default.

use md5::{Digest, Md5};

use super::format::ImageFormat;
use super::operation::{OperationKind, TransformOperation};
use super::source::SourceFile;
use crate::mime::MimeCache;

/// Name of the query parameter holding the pipeline.
pub const QUERY_KEY: &str = "t";

const STAGE_SEP: char = '|';
const FIELD_SEP: char = ',';

/// A parsed, non-empty transform pipeline for one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformRequest {
    /// Source path relative to the served root.
    pub source_path: String,
    pub operations: Vec<TransformOperation>,
    /// Skip the cache lookup and overwrite any existing artifact.
    pub force: bool,
    pub cache_key: String,
}

impl TransformRequest {
    /// Parse the value of the `t` query parameter for `source_path`.
    ///
    /// The source mime type is consulted (loading the file) only for stages
    /// without an explicit `fmt`. Returns `None` when no stage survives, in
    /// which case the file is served as is.
    pub fn parse(
        source_path: &str,
        param: Option<&str>,
        source: &SourceFile,
        mime: &MimeCache,
    ) -> Option<Self> {
        let param = param.filter(|p| !p.is_empty())?;
        tracing::debug!("Parsing transform {:?} for {}", param, source_path);

        let mut force = false;
        let mut operations = Vec::new();

        for stage in param.split(STAGE_SEP) {
            let parsed = parse_stage(stage);
            force |= parsed.force;

            let Some(kind) = parsed.kind else {
                tracing::debug!("Skipping stage {:?}: no known op", stage);
                continue;
            };

            let mut op = TransformOperation::new(kind);
            op.width = parsed.width.unwrap_or(0);
            op.height = parsed.height.unwrap_or(0);
            op.quality = parsed.quality.unwrap_or(op.quality);
            op.frame_number = parsed.frame_number.unwrap_or(0);
            op.format = match parsed.format {
                Some(format) => format,
                None => sniffed_format(source, mime).unwrap_or_default(),
            };
            if kind == OperationKind::Snapshot {
                op.frame_number = op.frame_number.max(1);
            }

            tracing::debug!("Added stage {}", op.descriptor());
            operations.push(op);
        }

        if operations.is_empty() {
            return None;
        }

        let cache_key = cache_key(source_path, &operations);
        Some(Self {
            source_path: source_path.to_string(),
            operations,
            force,
            cache_key,
        })
    }
}

/// Cache key of a pipeline over `source_path`: lowercase hex MD5 of
/// `<source_path>?t=<descriptor>|<descriptor>...`.
pub fn cache_key(source_path: &str, operations: &[TransformOperation]) -> String {
    let descriptors = operations
        .iter()
        .map(TransformOperation::descriptor)
        .collect::<Vec<_>>()
        .join("|");
    let digest = Md5::digest(format!("{source_path}?{QUERY_KEY}={descriptors}").as_bytes());
    hex::encode(digest)
}

#[derive(Debug, Default)]
struct ParsedStage {
    kind: Option<OperationKind>,
    width: Option<u32>,
    height: Option<u32>,
    quality: Option<u32>,
    format: Option<ImageFormat>,
    frame_number: Option<u32>,
    force: bool,
}

fn parse_stage(stage: &str) -> ParsedStage {
    let mut parsed = ParsedStage::default();

    for field in stage.split(FIELD_SEP) {
        let (key, value) = field.split_once('=').unwrap_or((field, ""));
        match key {
            "op" => parsed.kind = OperationKind::from_name(value),
            "w" => parsed.width = value.parse().ok().or(parsed.width),
            "h" => parsed.height = value.parse().ok().or(parsed.height),
            "q" => parsed.quality = value.parse().ok().or(parsed.quality),
            "fmt" => parsed.format = ImageFormat::from_param(value).or(parsed.format),
            "framenum" => parsed.frame_number = value.parse().ok().or(parsed.frame_number),
            "force" => parsed.force |= value != "false",
            _ => {}
        }
    }

    parsed
}

fn sniffed_format(source: &SourceFile, mime: &MimeCache) -> Option<ImageFormat> {
    let mime_type = match source.mime_type(mime) {
        Ok(m) => m,
        Err(e) => {
            tracing::debug!("Cannot sniff {:?}: {}", source.path(), e);
            return None;
        }
    };
    let format = ImageFormat::from_mime(&mime_type);
    if let Some(format) = format {
        tracing::debug!("Using format {} from mime type {}", format, mime_type);
    }
    format
}
