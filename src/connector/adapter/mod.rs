mod json_settings_store;
mod mock_completion;
mod openai_client;

pub use json_settings_store::*;
pub use mock_completion::*;
pub use openai_client::*;
