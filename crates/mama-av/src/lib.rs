//! # mama-av
//!
//! Video helpers for the mama transform pipeline.
//!
//! This crate provides functionality for:
//! - Extracting a single still frame from a video file ([`FrameExtractor`])
//! - Detecting the external tools that extraction relies on
//!
//! ## Features
//!
//! - `tracing` - Enable tracing support
//!
//! ## Example
//!
//! ```no_run
//! use mama_av::{FfmpegFrameExtractor, FrameExtractor};
//! use std::path::Path;
//!
//! let extractor = FfmpegFrameExtractor::new();
//! let jpeg = extractor.extract_frame(Path::new("/path/to/video.mp4"), 1)?;
//! println!("frame is {} bytes", jpeg.len());
//! # Ok::<(), mama_av::Error>(())
//! ```

mod error;
pub mod frame;
pub mod tools;

// Re-exports
pub use error::{Error, Result};
pub use frame::{FfmpegFrameExtractor, FrameExtractor};
pub use tools::{check_tool, check_tools, ToolInfo, SNAPSHOT_TOOLS};
