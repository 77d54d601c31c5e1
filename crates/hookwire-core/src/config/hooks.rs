//! Hook registry and dispatcher configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Priority used when a handler is added without an explicit one.
pub const DEFAULT_PRIORITY: i32 = 50;

/// Tag whose handlers run before every other fired tag.
pub const WILDCARD_TAG: &str = "all";

/// Hook engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HooksConfig {
    /// Priority assigned by `add_filter` / `add_action`.
    pub default_priority: i32,
    /// Tag fired before every other tag.
    pub wildcard_tag: String,
    /// Base directory for relative handler include paths.
    pub include_root: Option<PathBuf>,
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            default_priority: DEFAULT_PRIORITY,
            wildcard_tag: WILDCARD_TAG.to_string(),
            include_root: None,
        }
    }
}
