mod completion_client;
mod settings_store;

pub use completion_client::*;
pub use settings_store::*;
