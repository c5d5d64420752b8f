//! WebSocket Application Session
//!
//! This module contains the logic for running one browser's application
//! session over a WebSocket. It is structured into submodules:
//!
//! - `protocol`: the JSON message format for client-server communication.
//! - `session`: the connection lifecycle and the explicit screen state
//!   machine (exam selection, dashboard, chat).
//! - `chat`: the chat screen itself, bridging client messages to the core
//!   turn controller.

mod chat;
pub mod protocol;
pub mod session;

pub use session::ws_handler;
