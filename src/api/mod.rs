//! Topmost fundamental APIs. Callers must initialize the runtime before loading any
//! rules, via one of:
//!
//!  1. `init_default()`, using default config to initialize.
//!  2. `init_with_config(config_entity: config::Entity)`, using customized config Entity to initialize.
//!  3. `init_with_config_file(config_path: String)`, using yaml file to initialize.

mod api;
mod init;
mod slot_chain;

pub use api::*;
pub use init::*;
pub use slot_chain::*;
