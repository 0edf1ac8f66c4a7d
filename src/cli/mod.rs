//! Command-line interface for the `nbody` binary.
//!
//! Parsing, command handlers and output formatting live here so they can be
//! tested without spawning the binary. `main.rs` only parses arguments,
//! installs logging and calls [`run_cli`].

mod args;
mod commands;
mod output;

pub use args::{Cli, Command, RunArgs, ScenarioArgs, ScenarioChoice};
pub use commands::{launch_viewer, reap_viewer, resolve_config, run_cli, DEFAULT_VIEWER_COMMANDS};
pub use output::{
    display_system_state, format_progress, format_summary, format_system_state, print_summary,
};
