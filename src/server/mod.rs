//! Liveness HTTP endpoint
//!
//! Hosting platforms probe the bot over HTTP to decide whether it is alive.
//! The endpoint carries no bot state beyond uptime.

use axum::{extract::State, response::Json, routing::get, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::watch;

use crate::config::ServerConfig;

/// Body of `GET /`
pub const LIVENESS_BANNER: &str = "I AM AN ALOT! HEAR ME ROAR!";

/// Server error types
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid listen address {0}")]
    InvalidAddress(String),

    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Health check response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Copy)]
struct LivenessState {
    started_at: Instant,
}

/// Routes served by the liveness endpoint
pub fn liveness_router() -> Router {
    Router::new()
        .route("/", get(banner_handler))
        .route("/health", get(health_handler))
        .with_state(LivenessState {
            started_at: Instant::now(),
        })
}

async fn banner_handler() -> &'static str {
    LIVENESS_BANNER
}

async fn health_handler(State(state): State<LivenessState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}

/// Parse the configured bind address
pub fn listen_addr(config: &ServerConfig) -> Result<SocketAddr, ServerError> {
    let raw = format!("{}:{}", config.bind, config.port);
    raw.parse::<SocketAddr>()
        .map_err(|_| ServerError::InvalidAddress(raw))
}

/// Serve the liveness endpoint until `shutdown` flips to `true`
pub async fn serve_liveness(
    config: &ServerConfig,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), ServerError> {
    let addr = listen_addr(config)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(address = %addr, "Starting liveness endpoint");

    axum::serve(listener, liveness_router())
        .with_graceful_shutdown(async move {
            while !*shutdown.borrow_and_update() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
        })
        .await?;

    tracing::info!("Liveness endpoint stopped");
    Ok(())
}
