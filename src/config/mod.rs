mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./config.toml",
        "./mama.toml",
        "~/.config/mama/config.toml",
        "/etc/mama/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    // Return default config if no file found
    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    // Validate server config
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if !config.server.base_path.is_empty() && !config.server.base_path.starts_with('/') {
        anyhow::bail!(
            "Server base_path must start with '/': {:?}",
            config.server.base_path
        );
    }

    // Validate storage; a missing root is created when the server starts
    let cache_dir = &config.storage.cache_dir;
    if cache_dir.is_empty() || cache_dir.contains(['/', '\\']) || cache_dir == ".." {
        anyhow::bail!("Storage cache_dir must be a plain directory name: {:?}", cache_dir);
    }

    // Validate users
    for user in &config.auth.users {
        if !user.contains(':') {
            anyhow::bail!("Auth user entry must be 'user:password', got {:?}", user);
        }
    }

    Ok(())
}
