//! cilium-net daemon.
//!
//! Loads the config, builds the control-plane state and serves the ops
//! endpoints until Ctrl-C.

use std::net::SocketAddr;

use tracing_subscriber::{fmt, EnvFilter};

use cilium_net_common::error::{Error, Result};
use cilium_net_daemon::{config, router, Daemon};

const DEFAULT_CONFIG: &str = "cilium-net.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg
        .daemon
        .ops_listen
        .parse()
        .map_err(|e| Error::InvalidConfig(format!("daemon.ops_listen: {e}")))?;

    let daemon = Daemon::new(cfg)?;
    let app = router::build_ops_router(daemon.clone());

    tracing::info!(%listen, config = %path, "cilium-net daemon starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| Error::Internal(format!("bind {listen} failed: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            daemon.set_draining();
            tracing::info!("draining");
        })
        .await
        .map_err(|e| Error::Internal(format!("ops server failed: {e}")))
}
