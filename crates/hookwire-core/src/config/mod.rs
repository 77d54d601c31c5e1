//! Configuration schemas.
//!
//! All configuration structs are deserialized from an optional TOML file
//! merged with `HOOKWIRE__`-prefixed environment variables via the
//! `config` crate. Every field has a default, so an empty source yields
//! [`HookwireConfig::default`].

pub mod hooks;
pub mod logging;
pub mod shortcode;

use std::path::Path;

use serde::{Deserialize, Serialize};

use self::hooks::HooksConfig;
use self::logging::LoggingConfig;
use self::shortcode::ShortcodeConfig;

use crate::error::AppError;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookwireConfig {
    /// Hook registry and dispatcher settings.
    pub hooks: HooksConfig,
    /// Shortcode engine settings.
    pub shortcode: ShortcodeConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl HookwireConfig {
    /// Load configuration from a TOML file and the environment.
    ///
    /// A missing file is not an error. Environment variables use the form
    /// `HOOKWIRE__HOOKS__DEFAULT_PRIORITY=10`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let config = config::Config::builder()
            .add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix("HOOKWIRE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Render this configuration as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, AppError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = HookwireConfig::load(dir.path().join("absent.toml")).expect("load");
        assert_eq!(config.hooks.default_priority, hooks::DEFAULT_PRIORITY);
        assert_eq!(config.hooks.wildcard_tag, "all");
        assert_eq!(config.shortcode.attrs_filter_prefix, "shortcodeAttrs_");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("tempfile");
        writeln!(
            file,
            r#"
[hooks]
default_priority = 10

[shortcode.templates]
b = "<b>{{content}}</b>"
"#
        )
        .expect("write");

        let config = HookwireConfig::load(file.path()).expect("load");
        assert_eq!(config.hooks.default_priority, 10);
        assert_eq!(config.hooks.wildcard_tag, "all");
        assert_eq!(
            config.shortcode.templates.get("b").map(String::as_str),
            Some("<b>{content}</b>")
        );
    }

    #[test]
    fn test_malformed_file_is_configuration_error() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("tempfile");
        writeln!(file, "[hooks\ndefault_priority = ").expect("write");

        let err = HookwireConfig::load(file.path()).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Configuration);
    }
}
