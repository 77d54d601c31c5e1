//! Text processing commands: expand, strip, has.

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::output::{self, OutputFormat};
use hookwire_core::config::HookwireConfig;
use hookwire_core::error::AppError;

/// Arguments for expand and strip
#[derive(Debug, Args)]
pub struct InputArgs {
    /// Input file; reads stdin when omitted or `-`
    pub input: Option<PathBuf>,
}

/// Arguments for has
#[derive(Debug, Args)]
pub struct HasArgs {
    /// Shortcode tag to look for
    #[arg(short, long)]
    pub tag: String,

    /// Input file; reads stdin when omitted or `-`
    pub input: Option<PathBuf>,
}

/// Expand template shortcodes
pub fn expand(
    args: &InputArgs,
    config: &HookwireConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let content = super::read_input(args.input.as_deref())?;
    let engine = super::build_engine(config);
    info!(shortcodes = engine.tags().len(), "Expanding input");

    output::print_text(&engine.expand(&content), format);
    Ok(())
}

/// Strip template shortcodes
pub fn strip(
    args: &InputArgs,
    config: &HookwireConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let content = super::read_input(args.input.as_deref())?;
    let engine = super::build_engine(config);

    output::print_text(&engine.strip(&content), format);
    Ok(())
}

/// Report whether the input contains a shortcode
pub fn has(args: &HasArgs, config: &HookwireConfig, format: OutputFormat) -> Result<(), AppError> {
    let content = super::read_input(args.input.as_deref())?;
    let engine = super::build_engine(config);
    if !engine.exists(&args.tag) {
        return Err(AppError::not_found(format!(
            "Shortcode '{}' is not configured",
            args.tag
        )));
    }

    let found = engine.has(&content, &args.tag);
    match format {
        OutputFormat::Text => println!("{found}"),
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "tag": args.tag, "found": found }));
        }
    }
    Ok(())
}
