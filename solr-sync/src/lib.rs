pub mod cli;
pub mod load_config;

pub use cli::{run, schema_command, Cli, Commands};
