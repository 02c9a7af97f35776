mod turn_orchestrator;
mod update_api_key;

pub use turn_orchestrator::*;
pub use update_api_key::*;
