//! Pure domain services.

mod code_spans;

pub use code_spans::*;
