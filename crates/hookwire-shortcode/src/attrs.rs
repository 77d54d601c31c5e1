//! Shortcode attribute parsing and default resolution.
//!
//! Attribute text is tokenized left to right; each token is the first of
//! these forms that matches:
//!
//! | form | result |
//! |---|---|
//! | `name="value"` | named |
//! | `name='value'` | named |
//! | `name=value` | named |
//! | `"value"` | positional (dropped when empty) |
//! | `value` | positional |
//!
//! Names are lower-cased and values are C-style unescaped. Text with no
//! token at all parses to [`ShortcodeAttrs::Raw`] holding the left-trimmed
//! input.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

static ATTR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"([A-Za-z0-9_]+)\s*=\s*"([^"]*)"(?:\s|$)"#,
        r#"|([A-Za-z0-9_]+)\s*=\s*'([^']*)'(?:\s|$)"#,
        r#"|([A-Za-z0-9_]+)\s*=\s*([^\s'"]+)(?:\s|$)"#,
        r#"|"([^"]*)"(?:\s|$)"#,
        r#"|(\S+)(?:\s|$)"#,
    ))
    .expect("attribute pattern is valid")
});

static SPECIAL_SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[\u{00a0}\u{200b}]+").expect("space pattern is valid"));

/// Key of a parsed attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttrKey {
    /// `name=value` forms.
    Named(String),
    /// Bare values, numbered from zero in order of appearance.
    Positional(usize),
}

impl fmt::Display for AttrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::Positional(index) => write!(f, "{index}"),
        }
    }
}

/// Named and positional attributes in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttrMap {
    entries: Vec<(AttrKey, String)>,
    positional: usize,
}

impl AttrMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a named attribute; a repeated name keeps its first position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let key = AttrKey::Named(name.into());
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Appends a positional value and returns its index.
    pub fn push(&mut self, value: impl Into<String>) -> usize {
        let index = self.positional;
        self.entries.push((AttrKey::Positional(index), value.into()));
        self.positional += 1;
        index
    }

    /// Returns the named attribute `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.iter().find_map(|(key, value)| match key {
            AttrKey::Named(n) if n == name => Some(value.as_str()),
            _ => None,
        })
    }

    /// Returns the positional value at `index`.
    pub fn positional(&self, index: usize) -> Option<&str> {
        self.entries.iter().find_map(|(key, value)| match key {
            AttrKey::Positional(i) if *i == index => Some(value.as_str()),
            _ => None,
        })
    }

    /// Whether a named attribute `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates over all attributes in order.
    pub fn iter(&self) -> impl Iterator<Item = (&AttrKey, &str)> {
        self.entries.iter().map(|(key, value)| (key, value.as_str()))
    }

    /// Number of attributes, named and positional.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// JSON object view; positional keys become `"0"`, `"1"`, ...
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(key, value)| (key.to_string(), Value::String(value.clone())))
                .collect(),
        )
    }
}

/// Result of parsing a shortcode's attribute text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortcodeAttrs {
    /// At least one attribute token was found.
    Parsed(AttrMap),
    /// No token was found; holds the left-trimmed input.
    Raw(String),
}

impl ShortcodeAttrs {
    /// Returns the named attribute `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.as_map().and_then(|map| map.get(name))
    }

    /// Returns the positional value at `index`.
    pub fn positional(&self, index: usize) -> Option<&str> {
        self.as_map().and_then(|map| map.positional(index))
    }

    /// The parsed attributes, if any token was found.
    pub fn as_map(&self) -> Option<&AttrMap> {
        match self {
            Self::Parsed(map) => Some(map),
            Self::Raw(_) => None,
        }
    }

    /// The raw text, if no token was found.
    pub fn raw(&self) -> Option<&str> {
        match self {
            Self::Parsed(_) => None,
            Self::Raw(text) => Some(text),
        }
    }

    /// JSON view: an object for parsed attributes, a string otherwise.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Parsed(map) => map.to_json(),
            Self::Raw(text) => Value::String(text.clone()),
        }
    }
}

/// Parses the attribute text of a shortcode.
pub fn parse_attrs(text: &str) -> ShortcodeAttrs {
    let text = SPECIAL_SPACES.replace_all(text, " ");
    let mut map = AttrMap::new();
    let mut matched = false;

    for caps in ATTR_PATTERN.captures_iter(&text) {
        matched = true;
        let group = |i| caps.get(i).map(|m| m.as_str());

        if let (Some(name), Some(value)) = (group(1), group(2)) {
            map.insert(name.to_ascii_lowercase(), unescape(value));
        } else if let (Some(name), Some(value)) = (group(3), group(4)) {
            map.insert(name.to_ascii_lowercase(), unescape(value));
        } else if let (Some(name), Some(value)) = (group(5), group(6)) {
            map.insert(name.to_ascii_lowercase(), unescape(value));
        } else if let Some(value) = group(7).filter(|v| !v.is_empty()) {
            map.push(unescape(value));
        } else if let Some(value) = group(8) {
            map.push(unescape(value));
        }
    }

    if matched {
        ShortcodeAttrs::Parsed(map)
    } else {
        ShortcodeAttrs::Raw(text.trim_start().to_string())
    }
}

/// Combines supported attributes and their defaults with supplied ones.
///
/// The result has exactly the keys of `pairs`, in that order, taking the
/// supplied value where the name was given. Unsupported supplied names are
/// dropped.
pub fn merge_attrs(pairs: &Map<String, Value>, supplied: &ShortcodeAttrs) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(name, default)| {
            let value = supplied
                .get(name)
                .map(|v| Value::String(v.to_string()))
                .unwrap_or_else(|| default.clone());
            (name.clone(), value)
        })
        .collect()
}

/// C-style unescaping of an attribute value.
///
/// Handles `\n \t \r \a \v \b \f`, octal (`\101`) and hex (`\x41`) escapes;
/// any other escaped character stands for itself and a trailing backslash
/// is kept.
pub fn unescape(value: &str) -> String {
    if !value.contains('\\') {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };

        match next {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\x07'),
            'v' => out.push('\x0B'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0C'),
            'x' if chars.peek().is_some_and(|c| c.is_ascii_hexdigit()) => {
                let mut code = 0u32;
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(16)) {
                        Some(digit) => {
                            code = code * 16 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(byte_char(code));
            }
            '0'..='7' => {
                let mut code = next.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(digit) => {
                            code = code * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(byte_char(code));
            }
            other => out.push(other),
        }
    }

    out
}

/// Numeric escapes address single bytes; values above 0x7f map to Latin-1.
fn byte_char(code: u32) -> char {
    char::from((code & 0xff) as u8)
}
