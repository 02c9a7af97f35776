//! # Domain Layer
//!
//! Conversation models, the error taxonomy, and pure text services.
//! This layer is independent of the HTTP client and the terminal UI.

pub mod error;
pub mod models;
pub mod services;

pub use error::*;
pub use models::*;
pub use services::*;
