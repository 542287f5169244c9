//! CLI argument definitions using clap
//!
//! Commands:
//! - ringlog serve [--config <path>] [--port <port>] [--backend device|file]
//! - ringlog config [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Backend;

/// ringlog - a bounded, newline-delimited log service
#[derive(Parser, Debug)]
#[command(name = "ringlog")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the ingestion server until SIGINT/SIGTERM
    Serve {
        /// Path to configuration file (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,

        /// Override the configured backend
        #[arg(long)]
        backend: Option<Backend>,
    },

    /// Print the effective configuration as JSON and exit
    Config {
        /// Path to configuration file (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
