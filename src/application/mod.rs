//! # Application Layer
//!
//! Ports and use cases coordinating the domain with the connector layer.

pub mod interfaces;
pub mod use_cases;

pub use interfaces::*;
pub use use_cases::*;
