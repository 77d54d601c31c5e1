//! # hookwire-shortcode
//!
//! Bracketed-tag text processing on top of the hook dispatcher:
//!
//! - [`ShortcodePattern`]: one matcher for every registered tag, yielding
//!   structured [`ShortcodeMatch`]es
//! - [`parse_attrs`]: attribute tokenizer
//! - [`ShortcodeEngine`]: handler registry, `expand`, `strip`, `has` and
//!   filtered attribute resolution

pub mod attrs;
pub mod engine;
pub mod pattern;

pub use attrs::{AttrKey, AttrMap, ShortcodeAttrs, merge_attrs, parse_attrs, unescape};
pub use engine::{ShortcodeEngine, ShortcodeFn};
pub use pattern::{ShortcodeMatch, ShortcodePattern};
