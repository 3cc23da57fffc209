//! Command-line interface components
//!
//! This module contains CLI-specific code for the rdams client, including
//! argument parsing, command handlers and progress display.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{Cli, Commands, DatasetArgs, GlobalArgs};
pub use commands::{execute, load_config, CommandContext, Output};
pub use progress::{render_progress, spinner, ConsoleProgress};
