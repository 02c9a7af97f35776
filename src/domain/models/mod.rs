mod api_key;
mod code_span;
mod conversation;
mod turn;

pub use api_key::*;
pub use code_span::*;
pub use conversation::*;
pub use turn::*;
