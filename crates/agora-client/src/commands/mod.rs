//! Command handlers behind the `agora` CLI.
//!
//! Each handler takes the shared [`AppState`](crate::state::AppState), runs
//! one user action through the views and returns the text to print.

pub mod discover;
pub mod identity;
pub mod posts;
pub mod profile;
