//! Telwarden daemon binary entry point.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use telwarden_core::config::WardenConfig;
use telwarden_daemon::Daemon;

/// Telwarden - behavioral anomaly detector for device telemetry.
#[derive(Parser, Debug)]
#[command(name = "telwarden", version, about)]
struct Args {
    /// Path to configuration file.
    #[arg(short, long, default_value = "~/.config/telwarden/config.toml")]
    config: String,

    /// Override the listen address from the config file.
    #[arg(long)]
    bind: Option<String>,

    /// Override the authorization service base URL from the config file.
    #[arg(long)]
    auth_service_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let env_filter = EnvFilter::try_from_env("TELWARDEN_LOG")
        .unwrap_or_else(|_| EnvFilter::from_default_env());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config_path = expand_tilde(&args.config);
    tracing::info!(config = %config_path.display(), "telwarden starting");

    let mut config = WardenConfig::load(&config_path).context("loading configuration")?;
    if let Some(bind) = args.bind {
        config.server.bind_addr = bind;
    }
    if let Some(url) = args.auth_service_url {
        config.auth_service.base_url = url;
    }

    Daemon::new(config).run().await
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
        return PathBuf::from("/tmp").join(rest);
    }
    PathBuf::from(path)
}
