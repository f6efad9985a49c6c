#[macro_use]
extern crate log;

use std::{str::FromStr, sync::Arc};

use anyhow::{Context, Result};
use qb_mcp::{Config, QbClient, Server, Tools};
#[cfg(unix)]
use tokio::signal::unix as signal;

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info,rustls=warn,reqwest=warn");
    }
    pretty_env_logger::init_timed();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let path = std::path::PathBuf::from_str(&config_path)?;
    let config = Config::load(&path).await?;

    let qb_client = QbClient::new(
        config.qb.base_url.clone(),
        &config.qb.username,
        &config.qb.password,
        config.timeout(),
    )
    .context("cannot build http client")?;
    let qb_client = Arc::new(qb_client);
    let server = Server::new(Tools::new(qb_client.clone(), config.search.clone()));
    info!("serving qBittorrent at {} over stdio", qb_client.base_url());

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    let interrupted = tokio::select! {
        r = server.serve(stdin, stdout) => {
            r?;
            false
        }
        r = signal() => {
            r?;
            true
        }
    };

    if let Err(e) = qb_client.logout().await {
        warn!("client logout failed: {e}");
    }
    if interrupted {
        // the blocking stdin read would keep the runtime alive until the client closes the pipe
        std::process::exit(0);
    }
    Ok(())
}

#[cfg(unix)]
async fn signal() -> Result<()> {
    let mut sig_term = signal::signal(signal::SignalKind::terminate())?;

    tokio::select! {
        _ = sig_term.recv() => {
            info!("received signterm, exiting");
            Ok(())
        }
        _ = tokio::signal::ctrl_c() => {
            info!("ctrl-c received, stopping");
            Ok(())
        }
    }
}

#[cfg(not(unix))]
async fn signal() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    info!("ctrl-c received, stopping");
    Ok(())
}
