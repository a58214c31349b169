#![cfg(not(tarpaulin_include))]

use enrollment_report::app;
use enrollment_report::config::ServerConfig;
use env_logger::Env;

/// Main entry point for the report web application
///
/// Initializes logging from `RUST_LOG` (defaulting to `info`) and serves the
/// upload page and report endpoints with the default configuration.
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    app::run(ServerConfig::default()).await
}
