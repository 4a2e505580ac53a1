//! Axum router for the ops listener.

use axum::{routing::get, Router};

use crate::{daemon::Daemon, ops};

pub fn build_ops_router(daemon: Daemon) -> Router {
    Router::new()
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .with_state(daemon)
}
