//! # Connector Layer
//!
//! External integrations implementing application ports:
//! - Completion (OpenAI-compatible HTTP client, in-process mock)
//! - Settings (JSON config file)
//! - Terminal UI

pub mod adapter;
pub mod config;
pub mod tui;

pub use adapter::*;
pub use config::*;
