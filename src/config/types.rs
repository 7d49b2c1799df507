use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default log filter when `RUST_LOG` is not set (e.g. "info", "debug")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub frontend: FrontendConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            storage: StorageConfig::default(),
            frontend: FrontendConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Prefix all routes are mounted under (e.g. "/files")
    #[serde(default)]
    pub base_path: String,

    /// Directory containing the built web UI
    #[serde(default)]
    pub static_dir: Option<PathBuf>,

    /// Seconds to wait for in-flight requests after a shutdown signal
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_shutdown_grace() -> u64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_path: String::new(),
            static_dir: None,
            shutdown_grace_secs: default_shutdown_grace(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Accounts allowed to upload and delete, as "user:password".
    /// Empty means writes are open to everyone.
    #[serde(default)]
    pub users: Vec<String>,
}

impl AuthConfig {
    pub fn enabled(&self) -> bool {
        !self.users.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root of the served directory tree
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Transform cache directory name, relative to `root`
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
}

fn default_root() -> PathBuf {
    PathBuf::from("./")
}
fn default_cache_dir() -> String {
    ".cache".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            cache_dir: default_cache_dir(),
        }
    }
}

/// Settings handed through to the web UI with every listing.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FrontendConfig {
    #[serde(default)]
    pub welcome: WelcomeConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct WelcomeConfig {
    #[serde(default)]
    pub enable: bool,

    #[serde(default)]
    pub header: String,

    #[serde(default)]
    pub background_image_file: String,

    #[serde(default)]
    pub avatar_image_file: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub sub_title: String,

    #[serde(default)]
    pub introduction: String,

    #[serde(default)]
    pub enter_text: String,
}
