mod cli;

use mama::{config, server};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use mama_common::naming;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config: config::Config,
) -> Result<()> {
    let mut config = config;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting mama server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    server::start_server(config).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config is loaded before logging so its log_level can seed the filter
    let loaded = config::load_config_or_default(cli.config.as_deref());
    let log_level = loaded
        .as_ref()
        .map(|c| c.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "mama=trace,mama_av=debug,mama_common=debug,tower_http=debug".to_string()
        } else {
            format!("mama={log_level},mama_av={log_level},tower_http={log_level}")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let config = loaded?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, config))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::CheckTools => check_tools(),
        Commands::Tag { file } => tag_file(&file),
        Commands::Untag { name } => {
            println!("{}", naming::decode(&name));
            Ok(())
        }
        Commands::Version => {
            println!("mama {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn check_tools() -> Result<()> {
    println!("Checking external tools...\n");

    let tools = mama_av::check_tools();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All tools are available!");
    } else {
        println!("Some tools are missing. Video snapshots will fall back to the original file.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Base path: {:?}", config.server.base_path);
            println!("  Root: {}", config.storage.root.display());
            println!("  Cache dir: {}", config.storage.cache_dir);
            println!("  Auth enabled: {}", config.auth.enabled());
            println!("  Users: {}", config.auth.users.len());
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Root: {}", config.storage.root.display());
        }
    }

    Ok(())
}

fn tag_file(file: &Path) -> Result<()> {
    let mut reader = std::fs::File::open(file)
        .with_context(|| format!("Failed to open {}", file.display()))?;

    let mut hasher = Sha256::new();
    let mut buf = [0u8; 32 * 1024];
    loop {
        let n = reader
            .read(&mut buf)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .context("Path has no file name")?;
    println!("{}", naming::encode(&name, &hex::encode(hasher.finalize())));
    Ok(())
}
