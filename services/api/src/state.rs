//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the shared,
//! clonable resources every connection needs: the oracle client and the
//! system instruction. Transcripts, sessions, and progress are deliberately
//! not here; they are owned per WebSocket connection and die with it.

use crate::config::Config;
use certprep_core::oracle::ChatClient;
use std::sync::Arc;

/// The shared application state, created once at startup.
#[derive(Clone)]
pub struct AppState {
    pub chat_client: Arc<dyn ChatClient>,
    pub system_prompt: Arc<str>,
    pub config: Arc<Config>,
}
