//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which serves a fresh temporary directory through
//! a full [`AppContext`]. Snapshots use [`StubFrames`] instead of ffmpeg. The
//! [`TestHarness::with_server`] constructor starts Axum on a random port for
//! HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use parking_lot::Mutex;

use mama::config::Config;
use mama::server::{create_router, AppContext};
use mama_av::FrameExtractor;

/// Frame source returning a fixed image and recording every request.
pub struct StubFrames {
    pub frame: Vec<u8>,
    pub calls: Mutex<Vec<(PathBuf, u32)>>,
}

impl StubFrames {
    pub fn new(frame: Vec<u8>) -> Self {
        Self {
            frame,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FrameExtractor for StubFrames {
    fn extract_frame(&self, path: &Path, frame_number: u32) -> mama_av::Result<Vec<u8>> {
        self.calls.lock().push((path.to_path_buf(), frame_number));
        Ok(self.frame.clone())
    }
}

/// Test harness wrapping a fully-constructed [`AppContext`] over a temporary
/// root directory.
pub struct TestHarness {
    pub ctx: AppContext,
    pub root: tempfile::TempDir,
    pub frames: Arc<StubFrames>,
}

impl TestHarness {
    /// Create a new harness with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new harness with a custom configuration. The storage root is
    /// always replaced by a fresh temporary directory.
    pub fn with_config(mut config: Config) -> Self {
        let root = tempfile::tempdir().expect("failed to create temp root");
        config.storage.root = root.path().to_path_buf();

        let frames = Arc::new(StubFrames::new(png_bytes(32, 16)));
        let ctx = AppContext::with_frame_extractor(config, frames.clone())
            .expect("failed to build app context");

        Self { ctx, root, frames }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::with_server_config(Config::default()).await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        let harness = Self::with_config(config);
        let app = create_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    /// Absolute path of `rel` under the served root.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.ctx.root.join(rel)
    }

    /// Write `bytes` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, bytes: &[u8]) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent dir");
        }
        std::fs::write(&path, bytes).expect("failed to write test file");
        path
    }

    /// Names of the entries in the transform cache directory.
    pub fn cache_entries(&self) -> Vec<String> {
        let dir = self.ctx.transformer.cache().dir();
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .expect("cache dir missing")
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Names of the entries directly under `rel`.
    pub fn entries(&self, rel: &str) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.path(rel))
            .expect("dir missing")
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// A solid-colour PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(&solid(width, height), ImageFormat::Png)
}

pub fn solid(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 3 % 256) as u8, 90])
    }))
}

pub fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, format).expect("failed to encode test image");
    buf.into_inner()
}
