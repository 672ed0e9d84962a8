pub mod config;
pub mod enrich;
pub mod tip;
pub mod utils;

pub use config::{handle_config_command, ConfigCommands};
pub use enrich::run_enrich;
pub use tip::run_tip;
