pub mod config;
pub mod run;

pub use config::{handle_config_command, ConfigCommand};
pub use run::{run, RunOptions};
