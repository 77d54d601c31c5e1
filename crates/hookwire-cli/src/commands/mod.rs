//! CLI command definitions and dispatch.

pub mod attrs;
pub mod config;
pub mod text;

use std::io::Read;
use std::path::Path;
use std::rc::Rc;

use clap::{Parser, Subcommand};

use hookwire_core::config::HookwireConfig;
use hookwire_core::error::{AppError, ErrorKind};
use hookwire_hooks::{HookDispatcher, HookRegistry};
use hookwire_shortcode::ShortcodeEngine;

use crate::output::OutputFormat;
use crate::template;

/// Hookwire shortcode expansion and inspection
#[derive(Debug, Parser)]
#[command(name = "hookwire", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Expand template shortcodes in a file or stdin
    Expand(text::InputArgs),
    /// Remove template shortcodes from a file or stdin
    Strip(text::InputArgs),
    /// Check whether the input contains a shortcode
    Has(text::HasArgs),
    /// Parse a shortcode attribute string
    Attrs(attrs::AttrsArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Load the configuration named by `--config`
    pub fn load_config(&self) -> Result<HookwireConfig, AppError> {
        HookwireConfig::load(&self.config)
    }

    /// Execute the CLI command
    pub fn execute(&self, config: &HookwireConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Expand(args) => text::expand(args, config, self.format),
            Commands::Strip(args) => text::strip(args, config, self.format),
            Commands::Has(args) => text::has(args, config, self.format),
            Commands::Attrs(args) => attrs::execute(args, self.format),
            Commands::Config(args) => config::execute(args, config, self.format),
        }
    }
}

/// Helper: build an engine with the configured template shortcodes
pub fn build_engine(config: &HookwireConfig) -> ShortcodeEngine {
    let registry = Rc::new(HookRegistry::new());
    let dispatcher = Rc::new(HookDispatcher::with_config(registry, config.hooks.clone()));
    let engine = ShortcodeEngine::with_config(dispatcher, config.shortcode.clone());
    template::register_all(&engine, &config.shortcode.templates);
    engine
}

/// Helper: read `path`, or stdin when absent or `-`
pub fn read_input(path: Option<&Path>) -> Result<String, AppError> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path).map_err(|e| {
            AppError::with_source(
                ErrorKind::Io,
                format!("Failed to read '{}': {e}", path.display()),
                e,
            )
        }),
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}
