//! Core domain for the MIRA assistant client.
//!
//! Holds the typed response model, the conversation log with its
//! reconciliation rules, the tutorial context cache and the session
//! lifecycle. Nothing here performs I/O directly; the backend and the
//! per-tab pointer store are reached through traits.

pub mod audio;
pub mod client_state;
pub mod config;
pub mod conversation;
pub mod error;
pub mod response;
pub mod session;
pub mod state;
pub mod tutorial;

pub use client_state::ClientState;
pub use error::{MiraError, Result};
