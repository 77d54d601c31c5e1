//! Hookwire CLI entry point.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use hookwire_core::config::logging::LoggingConfig;

mod commands;
mod output;
mod template;

use commands::Cli;

fn main() {
    let cli = Cli::parse();

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            output::print_error(&format!("Failed to load config: {e}"));
            std::process::exit(1);
        }
    };

    init_logging(&config.logging);

    if let Err(e) = cli.execute(&config) {
        output::print_error(&e.to_string());
        std::process::exit(1);
    }
}

/// Initialize tracing; `RUST_LOG` overrides the configured level.
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        "compact" => {
            fmt()
                .compact()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
