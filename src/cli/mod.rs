//! Command-line interface.

mod args;
mod commands;

pub use args::{Args, Command};
pub use commands::{handle_config_action, list_filters, run_stream};
