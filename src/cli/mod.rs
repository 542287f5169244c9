//! CLI module for ringlog
//!
//! - serve: run the ingestion server
//! - config: print the effective configuration

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{effective_config, run, run_command, serve, show_config};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_response, write_stdout_response};
