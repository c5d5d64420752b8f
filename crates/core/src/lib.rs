//! Core logic for the certification study companion.
//!
//! This crate owns everything below the transport layer: the exam track and
//! module catalog, the reply classifier that detects multiple-choice
//! questions, the transcript store, the oracle-backed session manager, the
//! turn controller that drives one request/response cycle, and the module
//! progress tracker. The API service in `services/api` is a thin wrapper
//! that exposes these pieces to a browser client.

pub mod catalog;
pub mod classifier;
pub mod controller;
pub mod oracle;
pub mod progress;
pub mod prompt;
pub mod session;
pub mod transcript;
