//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, signal handling,
//! logging setup and the subcommand runners.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod logging;
pub mod presenter;
pub mod signals;

// Re-export commonly used types
pub use app::{
    run_notify, run_register, run_return, run_watch, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR,
};
pub use args::{Cli, Commands, ConfigAction, NotifierArgs, WatchArgs};
pub use presenter::Presenter;
