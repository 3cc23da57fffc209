//! rdams CLI application
//!
//! Command-line client for the NCAR Research Data Archive REST API: dataset
//! lookups, subset request submission, status checks, purges and request
//! downloads.

use std::process;

use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use rdams_client::cli::{execute, load_config, Cli, CommandContext, Output};
use rdams_client::errors::Result;

#[tokio::main]
async fn main() {
    // Initialize program
    let result = run().await;

    // Handle any errors that occurred
    if let Err(e) = result {
        debug!("Command failed ({}): {:?}", e.category(), e);
        eprintln!("Error: {}", e.report());
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    // Parse command line arguments
    let cli = Cli::parse_args();

    let config = load_config(&cli.global).await;

    // Initialize logging; the config file level applies only without flags
    let level = match &config {
        Ok(config) if !cli.has_verbosity_flag() => config.logging.level.clone(),
        _ => cli.log_level().to_string().to_lowercase(),
    };
    init_logging(&level, cli.global.very_verbose);

    let config = config?;
    info!("rdams v{} starting", env!("CARGO_PKG_VERSION"));

    let mut ctx = CommandContext::new(&config, Output::from_args(&cli.global))?;
    execute(cli.command, &mut ctx).await
}

/// Initialize logging at the given level
fn init_logging(level: &str, show_levels: bool) {
    // Create environment filter covering the library and this binary
    let mut filter = EnvFilter::from_default_env();
    for target in ["rdams_client", "rdams"] {
        match format!("{}={}", target, level).parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => eprintln!("Ignoring invalid log level '{}': {}", level, e),
        }
    }

    // Initialize subscriber
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(show_levels) // Show levels only in very verbose mode
        .init();
}
