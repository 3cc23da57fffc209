//! Command-line argument parsing for the RDA client
//!
//! This module defines the CLI structure using clap derive macros. Dataset
//! identifiers and request indices are taken as plain strings and validated by
//! the command handlers so invalid input is reported the same way as every
//! other error.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::AuthMode;

/// rdams - Query and download data from the NCAR Research Data Archive
#[derive(Parser, Debug)]
#[command(
    name = "rdams",
    version,
    about = "Command-line client for the NCAR Research Data Archive (RDA) REST API",
    long_about = "Look up dataset metadata, submit subset requests, check their status and
download the resulting files from the NCAR Research Data Archive."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Do not print the JSON response
    #[arg(short = 'n', long, global = true)]
    pub no_print: bool,

    /// Read credentials from the netrc file
    #[arg(long, global = true)]
    pub use_netrc: bool,

    /// Authentication strategy for API calls
    #[arg(long, global = true, value_enum, value_name = "MODE")]
    pub auth_mode: Option<AuthMode>,

    /// Credentials file path
    #[arg(long, global = true, value_name = "FILE")]
    pub credentials_file: Option<PathBuf>,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Get a summary of a dataset
    Summary {
        /// Dataset identifier, e.g. ds083.2 or 083.2
        #[arg(value_name = "DATASET")]
        dataset: String,
    },

    /// Get the full metadata of a dataset
    Metadata(DatasetArgs),

    /// Get the parameter summary of a dataset
    ParamSummary(DatasetArgs),

    /// Submit a subset request from a control file
    Submit {
        /// Control file (key=value lines) or JSON file
        #[arg(value_name = "CONTROL_FILE")]
        control_file: PathBuf,
    },

    /// Get the status of one request, or of all open requests
    Status {
        /// Request index
        #[arg(value_name = "INDEX")]
        index: Option<String>,
    },

    /// Download the files of a completed request
    Download {
        /// Request index
        #[arg(value_name = "INDEX")]
        index: String,

        /// Output directory (default: rda_request_<INDEX>)
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Start a Globus transfer for a completed request
    GlobusDownload {
        /// Request index
        #[arg(value_name = "INDEX")]
        index: String,
    },

    /// Write a control file template for a dataset
    ControlFileTemplate {
        /// Dataset identifier
        #[arg(value_name = "DATASET")]
        dataset: String,

        /// Directory the template is written to
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        output_dir: PathBuf,
    },

    /// Purge a request from the server
    Purge {
        /// Request index
        #[arg(value_name = "INDEX")]
        index: String,
    },
}

/// Arguments for dataset lookups with an optional formatted layout
#[derive(Args, Debug, Clone)]
pub struct DatasetArgs {
    /// Dataset identifier, e.g. ds083.2 or 083.2
    #[arg(value_name = "DATASET")]
    pub dataset: String,

    /// Ask the server for its formatted layout
    #[arg(short, long)]
    pub formatted: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on global arguments
    pub fn log_level(&self) -> tracing::Level {
        if self.global.quiet {
            tracing::Level::ERROR
        } else if self.global.very_verbose {
            tracing::Level::DEBUG
        } else if self.global.verbose {
            tracing::Level::INFO
        } else {
            tracing::Level::WARN
        }
    }

    /// True when any verbosity flag was given
    pub fn has_verbosity_flag(&self) -> bool {
        self.global.quiet || self.global.verbose || self.global.very_verbose
    }
}
