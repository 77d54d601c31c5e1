//! Attribute parsing command.

use clap::Args;

use crate::output::{self, OutputFormat};
use hookwire_core::error::AppError;
use hookwire_shortcode::{ShortcodeAttrs, parse_attrs};

/// Arguments for attrs
#[derive(Debug, Args)]
pub struct AttrsArgs {
    /// Attribute text, e.g. `id=42 title="Hello world" hidden`
    pub text: String,
}

/// Parse and print an attribute string
pub fn execute(args: &AttrsArgs, format: OutputFormat) -> Result<(), AppError> {
    let attrs = parse_attrs(&args.text);

    match (format, &attrs) {
        (OutputFormat::Json, _) => {
            println!("{}", serde_json::to_string_pretty(&attrs.to_json())?);
        }
        (OutputFormat::Text, ShortcodeAttrs::Parsed(map)) => {
            for (key, value) in map.iter() {
                output::print_kv(&key.to_string(), value);
            }
        }
        (OutputFormat::Text, ShortcodeAttrs::Raw(raw)) => {
            println!("(no attributes) {raw}");
        }
    }
    Ok(())
}
