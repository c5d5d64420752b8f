//! Study Companion API Library Crate
//!
//! This library contains all the logic for the study companion web service:
//! configuration, the REST catalog endpoints, the WebSocket application
//! session, and routing. The `api` binary is a thin wrapper around it.

pub mod config;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;
pub mod ws;
