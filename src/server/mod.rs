use crate::buffer_pool::BufferPool;
use crate::config::Config;
use crate::mime::MimeCache;
use crate::transform::{TransformCache, Transformer};
use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    middleware,
    routing::get,
    Router,
};
use mama_av::{FfmpegFrameExtractor, FrameExtractor};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

pub mod auth;
pub mod error;
pub mod listing;
pub mod routes_files;
pub mod serve;

pub use error::AppError;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    /// Canonical served root
    pub root: PathBuf,
    pub transformer: Transformer,
    /// Sniffed mime types for listings, shared with the transformer
    pub mime: Arc<MimeCache>,
    /// Upload copy buffers
    pub buffers: BufferPool,
}

impl AppContext {
    /// Build the context with ffmpeg-backed snapshots.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_frame_extractor(config, Arc::new(FfmpegFrameExtractor::new()))
    }

    /// Build the context with a specific frame source.
    ///
    /// Creates the served root and the cache directory if they are missing.
    pub fn with_frame_extractor(config: Config, frames: Arc<dyn FrameExtractor>) -> Result<Self> {
        let root = &config.storage.root;
        if !root.exists() {
            tracing::warn!("Storage root {:?} does not exist, creating it", root);
        }
        std::fs::create_dir_all(root)
            .with_context(|| format!("Failed to create root directory: {}", root.display()))?;
        let root = root
            .canonicalize()
            .with_context(|| format!("Failed to resolve root directory: {}", root.display()))?;

        let cache_dir = root.join(&config.storage.cache_dir);
        let cache = TransformCache::new(&cache_dir).with_context(|| {
            format!("Failed to create cache directory: {}", cache_dir.display())
        })?;

        let mime = Arc::new(MimeCache::new());
        let transformer = Transformer::new(cache, frames, Arc::clone(&mime));

        Ok(Self {
            config: Arc::new(config),
            root,
            transformer,
            mime,
            buffers: BufferPool::new(),
        })
    }

    /// Configured base path without a trailing slash.
    pub fn base_path(&self) -> &str {
        self.config.server.base_path.trim_end_matches('/')
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::RANGE]);

    let mut files = Router::new()
        .route(
            "/-/",
            get(routes_files::read_file)
                .post(routes_files::write_file)
                .delete(routes_files::delete_file),
        )
        .route(
            "/-/*path",
            get(routes_files::read_file)
                .post(routes_files::write_file)
                .delete(routes_files::delete_file),
        );

    // Serve the frontend with SPA fallback: index.html for any route that
    // doesn't match a file
    if let Some(dir) = &ctx.config.server.static_dir {
        if dir.exists() {
            tracing::info!("Serving static files from {:?}", dir);
            let index_path = dir.join("index.html");
            files = files.fallback_service(
                ServeDir::new(dir)
                    .append_index_html_on_directories(true)
                    .not_found_service(ServeFile::new(index_path)),
            );
        } else {
            tracing::warn!("Static directory {:?} does not exist, not serving it", dir);
        }
    }

    let files = files
        .layer(middleware::from_fn_with_state(
            ctx.clone(),
            auth::basic_auth_middleware,
        ))
        .with_state(ctx.clone());

    let app = match ctx.base_path() {
        "" => files,
        base => Router::new().nest(base, files),
    };

    app.layer(DefaultBodyLimit::disable())
        .layer(CompressionLayer::new().gzip(true))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server and run until a shutdown signal.
pub async fn start_server(config: Config) -> Result<()> {
    let ctx = AppContext::new(config)?;
    let shutdown = CancellationToken::new();

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_token.cancel();
    });

    serve(ctx, shutdown).await
}

/// Serve `ctx` until `shutdown` is cancelled, then wait for in-flight
/// requests for at most the configured grace period.
pub async fn serve(ctx: AppContext, shutdown: CancellationToken) -> Result<()> {
    let server = &ctx.config.server;
    let addr: SocketAddr = format!("{}:{}", server.host, server.port)
        .parse()
        .context("Invalid server address")?;
    let grace = Duration::from_secs(server.shutdown_grace_secs);

    tracing::info!(
        "Serving {:?} on {} (base path {:?})",
        ctx.root,
        addr,
        ctx.base_path()
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    let app = create_router(ctx);

    let graceful = shutdown.clone();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move { graceful.cancelled().await });
    let mut server = std::pin::pin!(server.into_future());

    tokio::select! {
        result = &mut server => result.context("Server error")?,
        _ = shutdown.cancelled() => {
            match tokio::time::timeout(grace, &mut server).await {
                Ok(result) => result.context("Server error")?,
                Err(_) => tracing::warn!(
                    "In-flight requests still running after {}s, shutting down anyway",
                    grace.as_secs()
                ),
            }
        }
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
