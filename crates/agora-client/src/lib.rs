//! # agora-client
//!
//! Application core of the Agora social feed: the views (feed, post cards,
//! composer, profile, stories, sidebars, auth gate), the identity providers,
//! the HTTP-backed document store and the refresh signal that ties the views
//! together. The `agora` binary drives it from the command line.

pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod refresh;
pub mod remote;
pub mod state;
pub mod views;

#[cfg(test)]
mod testing;

use tracing_subscriber::{fmt, EnvFilter};

pub use error::{ClientError, Result};

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("agora_client=info,agora_store=warn,warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
