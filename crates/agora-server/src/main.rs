//! # agora-server
//!
//! HTTP API for the Agora social feed.
//!
//! This binary provides:
//! - **Document store API** (axum) over one SQLite database: collections of
//!   JSON documents with atomic array operations and write batches
//! - **Session issuance** at `/auth/sign-in`, as Ed25519-signed bearer tokens
//! - **Per-IP rate limiting** to protect the single database connection

mod api;
mod config;
mod error;
mod rate_limit;
mod sessions;

use std::time::Duration;

use agora_shared::session::SessionSigner;
use agora_store::LocalStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,agora_server=debug")),
        )
        .init();

    info!("Starting Agora server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------
    let store = LocalStore::open_at(&config.database_path)?;
    info!(path = %config.database_path.display(), "Document store opened");

    let signer = match config.session_signing_key {
        Some(secret) => SessionSigner::from_secret_bytes(&secret),
        None => {
            warn!("SESSION_SIGNING_KEY not set, sessions will not survive a restart");
            SessionSigner::generate()
        }
    };
    info!(issuer = %hex::encode(signer.public_key_bytes()), "Session signer ready");

    let http_addr = config.http_addr;
    let app_state = AppState::new(store, signer, config);

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Rate limiter cleanup (every 5 minutes, evict buckets idle >10 min)
    let rl = app_state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            let purged = rl.purge_idle(Duration::from_secs(600)).await;
            if purged > 0 {
                tracing::debug!(purged, "Purged idle rate-limit buckets");
            }
        }
    });

    // Session cache cleanup (every 10 minutes)
    let verifier = app_state.verifier.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(600));
        loop {
            interval.tick().await;
            verifier.purge_expired().await;
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server until it fails or Ctrl+C arrives
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
