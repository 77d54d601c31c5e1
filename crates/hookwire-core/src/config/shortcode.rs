//! Shortcode engine configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Prefix of the filter fired when resolving a named shortcode's attributes.
pub const ATTRS_FILTER_PREFIX: &str = "shortcodeAttrs_";

/// Backtracking steps the shortcode matcher may take per search.
pub const DEFAULT_BACKTRACK_LIMIT: usize = 50_000_000;

/// Shortcode engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortcodeConfig {
    /// Prefix of the attribute filter tag (`<prefix><shortcode>`).
    pub attrs_filter_prefix: String,
    /// Backtracking budget of the shortcode matcher. Content that exceeds
    /// it is returned unexpanded.
    pub backtrack_limit: usize,
    /// Template shortcodes registered by the CLI, keyed by tag name.
    ///
    /// Templates may reference `{content}`, `{tag}` and `{attr.NAME}`.
    pub templates: BTreeMap<String, String>,
}

impl Default for ShortcodeConfig {
    fn default() -> Self {
        Self {
            attrs_filter_prefix: ATTRS_FILTER_PREFIX.to_string(),
            backtrack_limit: DEFAULT_BACKTRACK_LIMIT,
            templates: BTreeMap::new(),
        }
    }
}
