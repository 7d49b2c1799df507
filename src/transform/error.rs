//! Transform pipeline errors.
//!
//! None of these reach a client: the transformer absorbs them and serves the
//! untransformed source instead.

use thiserror::Error;

use super::format::ImageFormat;

/// Failure of a single pipeline stage or of the cache.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode {format}: {source}")]
    Encode {
        format: ImageFormat,
        #[source]
        source: image::ImageError,
    },

    #[error("encoding to {0} is not supported")]
    Unsupported(ImageFormat),

    #[error("frame extraction failed: {0}")]
    Frame(#[from] mama_av::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transform produced no output")]
    EmptyResult,
}

pub type Result<T> = std::result::Result<T, TransformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            TransformError::Unsupported(ImageFormat::Webp).to_string(),
            "encoding to webp is not supported"
        );
        assert_eq!(
            TransformError::EmptyResult.to_string(),
            "transform produced no output"
        );
    }

    #[test]
    fn test_from_av_error() {
        let err: TransformError = mama_av::Error::tool_not_found("ffmpeg").into();
        assert!(matches!(err, TransformError::Frame(_)));
    }
}
