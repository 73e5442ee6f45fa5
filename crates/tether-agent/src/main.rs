//! # tether-agent
//!
//! Long-lived agent binary: loads the YAML config, acquires an identity,
//! and keeps the control channel to the remote service alive until SIGINT.

#![deny(unsafe_code)]

mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;

use tether_core::BotConfig;
use tether_ident::{IdentClient, IdentityStore};
use tether_link::{Registries, Supervisor};

/// Tether control-channel agent.
#[derive(Parser, Debug)]
#[command(name = "tether-agent", about = "Tether control-channel agent")]
struct Cli {
    /// Path to the YAML config file.
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let config = BotConfig::load(&args.config)
        .with_context(|| format!("failed to load config from {}", args.config.display()))?;

    let _log_guard = logging::init(&config.log.dir).context("failed to initialize logging")?;

    // Root cancellation: SIGINT cancels everything downstream.
    let root = CancellationToken::new();
    {
        let root = root.clone();
        let _ = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, shutting down");
                root.cancel();
            }
        });
    }

    let store = Arc::new(IdentityStore::new(&config.storage.dir));
    let client = IdentClient::new(config.service.api.clone());
    let registries = Arc::new(Registries::new(store.clone()));

    let supervisor = Supervisor::new(config.service.websocket.clone(), store, client, registries);
    supervisor.run(root).await;

    tracing::info!("shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_default_config_path() {
        let cli = Cli::parse_from(["tether-agent"]);
        assert_eq!(cli.config, PathBuf::from("config.yaml"));
    }

    #[test]
    fn cli_custom_config_path() {
        let cli = Cli::parse_from(["tether-agent", "--config", "/etc/tether/bot.yaml"]);
        assert_eq!(cli.config, PathBuf::from("/etc/tether/bot.yaml"));
    }

    #[test]
    fn cli_rejects_unknown_flags() {
        assert!(Cli::try_parse_from(["tether-agent", "--nope"]).is_err());
    }
}
