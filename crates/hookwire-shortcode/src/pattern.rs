//! Shortcode pattern: one matcher recognizing every registered tag.
//!
//! A match has six parts:
//!
//! 1. an optional extra `[` for the `[[tag]]` escape,
//! 2. the tag name, not followed by a word character or `-`,
//! 3. the raw attribute text up to `]` or `/]`,
//! 4. the self-closing `/`,
//! 5. the enclosed body of a `[tag]...[/tag]` pair,
//! 6. an optional extra `]` for the `[[tag]]` escape.
//!
//! The grammar needs a back-reference (the closing tag must repeat the
//! opening name) and look-ahead, so it is compiled with `fancy-regex`.

use std::ops::Range;

use fancy_regex::{Captures, CaptureMatches, Regex, RegexBuilder};

use hookwire_core::config::shortcode::DEFAULT_BACKTRACK_LIMIT;
use hookwire_core::error::AppError;
use hookwire_core::result::AppResult;

/// A compiled matcher for a fixed set of tag names.
#[derive(Debug, Clone)]
pub struct ShortcodePattern {
    regex: Regex,
}

impl ShortcodePattern {
    /// Compiles a matcher for `tags`, tried in the given order.
    pub fn build<'a, I>(tags: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self::build_with_limit(tags, DEFAULT_BACKTRACK_LIMIT)
    }

    /// Like [`build`](Self::build), allowing at most `backtrack_limit`
    /// backtracking steps per search.
    pub fn build_with_limit<'a, I>(tags: I, backtrack_limit: usize) -> AppResult<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let alternation = tags
            .into_iter()
            .map(|tag| fancy_regex::escape(tag).into_owned())
            .collect::<Vec<_>>()
            .join("|");
        if alternation.is_empty() {
            return Err(AppError::validation("no shortcode tags to match"));
        }

        let source = format!(
            concat!(
                r"\[",
                r"(\[?)",
                r"({})",
                r"(?![\w-])",
                r"([^\]/]*(?:/(?!\])[^\]/]*)*?)",
                r"(?:",
                r"(/)\]",
                r"|\](?:([^\[]*+(?:\[(?!/\2\])[^\[]*+)*+)\[/\2\])?",
                r")",
                r"(\]?)",
            ),
            alternation
        );

        let regex = RegexBuilder::new(&source)
            .backtrack_limit(backtrack_limit)
            .build()?;

        Ok(Self { regex })
    }

    /// Returns the pattern text.
    pub fn source(&self) -> &str {
        self.regex.as_str()
    }

    /// Iterates over non-overlapping matches in `text`.
    pub fn find_iter<'r, 't>(&'r self, text: &'t str) -> Matches<'r, 't> {
        Matches {
            inner: self.regex.captures_iter(text),
        }
    }

    /// Replaces every match in `text` with the output of `replace`.
    ///
    /// Fails if the matcher exceeds its backtracking limit; the partial
    /// output is discarded.
    pub fn replace_with<F>(&self, text: &str, mut replace: F) -> AppResult<String>
    where
        F: FnMut(&ShortcodeMatch<'_>) -> String,
    {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        for found in self.find_iter(text) {
            let found = found?;
            out.push_str(&text[last..found.span.start]);
            out.push_str(&replace(&found));
            last = found.span.end;
        }
        out.push_str(&text[last..]);

        Ok(out)
    }
}

/// One shortcode occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcodeMatch<'t> {
    /// Byte range of the whole match.
    pub span: Range<usize>,
    /// The whole matched text.
    pub text: &'t str,
    /// `"["` when the match starts with a doubled bracket, else `""`.
    pub open_escape: &'t str,
    /// The tag name.
    pub tag: &'t str,
    /// Raw attribute text between the name and the closing bracket.
    pub attrs: &'t str,
    /// Whether the tag closed with `/]`.
    pub self_closing: bool,
    /// Enclosed content of a `[tag]...[/tag]` pair.
    pub body: Option<&'t str>,
    /// `"]"` when the match ends with a doubled bracket, else `""`.
    pub close_escape: &'t str,
}

impl<'t> ShortcodeMatch<'t> {
    fn from_captures(caps: &Captures<'t>) -> Option<Self> {
        let whole = caps.get(0)?;
        let text_of = |i| caps.get(i).map(|m| m.as_str()).unwrap_or_default();

        Some(Self {
            span: whole.start()..whole.end(),
            text: whole.as_str(),
            open_escape: text_of(1),
            tag: caps.get(2)?.as_str(),
            attrs: text_of(3),
            self_closing: caps.get(4).is_some(),
            body: caps.get(5).map(|m| m.as_str()),
            close_escape: text_of(6),
        })
    }

    /// Whether this is the `[[tag]]` escape form.
    pub fn is_escaped(&self) -> bool {
        self.open_escape == "[" && self.close_escape == "]"
    }

    /// The match with one layer of brackets removed.
    pub fn unescaped(&self) -> &'t str {
        &self.text[1..self.text.len() - 1]
    }
}

/// Iterator returned by [`ShortcodePattern::find_iter`].
pub struct Matches<'r, 't> {
    inner: CaptureMatches<'r, 't>,
}

impl<'t> Iterator for Matches<'_, 't> {
    type Item = AppResult<ShortcodeMatch<'t>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(caps) => {
                    if let Some(found) = ShortcodeMatch::from_captures(&caps) {
                        return Some(Ok(found));
                    }
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first<'t>(pattern: &ShortcodePattern, text: &'t str) -> ShortcodeMatch<'t> {
        pattern
            .find_iter(text)
            .next()
            .expect("a match")
            .expect("matcher ok")
    }

    #[test]
    fn test_no_tags_is_rejected() {
        assert!(ShortcodePattern::build(std::iter::empty()).is_err());
    }

    #[test]
    fn test_plain_tag_with_attrs() {
        let pattern = ShortcodePattern::build(["tag"]).expect("build");
        let m = first(&pattern, r#"x [tag attr="v"] y"#);
        assert_eq!(m.span, 2..16);
        assert_eq!(m.tag, "tag");
        assert_eq!(m.attrs, r#" attr="v""#);
        assert!(!m.self_closing);
        assert_eq!(m.body, None);
        assert!(!m.is_escaped());
    }

    #[test]
    fn test_self_closing() {
        let pattern = ShortcodePattern::build(["br"]).expect("build");
        let m = first(&pattern, "[br a=1 /]");
        assert!(m.self_closing);
        assert_eq!(m.attrs, " a=1 ");
        assert_eq!(m.body, None);
    }

    #[test]
    fn test_slash_inside_attrs_is_not_self_closing() {
        let pattern = ShortcodePattern::build(["link"]).expect("build");
        let m = first(&pattern, "[link href=a/b]");
        assert!(!m.self_closing);
        assert_eq!(m.attrs, " href=a/b");
    }

    #[test]
    fn test_enclosing_pair() {
        let pattern = ShortcodePattern::build(["b"]).expect("build");
        let m = first(&pattern, "[b]bold [i]text[/i][/b] after");
        assert_eq!(m.body, Some("bold [i]text[/i]"));
        assert_eq!(m.text, "[b]bold [i]text[/i][/b]");

        let empty = first(&pattern, "[b][/b]");
        assert_eq!(empty.body, Some(""));
    }

    #[test]
    fn test_escaped_form() {
        let pattern = ShortcodePattern::build(["tag"]).expect("build");
        let m = first(&pattern, "[[tag]]");
        assert!(m.is_escaped());
        assert_eq!(m.unescaped(), "[tag]");

        let half = first(&pattern, "[[tag]");
        assert_eq!(half.open_escape, "[");
        assert_eq!(half.close_escape, "");
        assert!(!half.is_escaped());
    }

    #[test]
    fn test_name_must_end_at_non_word() {
        let pattern = ShortcodePattern::build(["a"]).expect("build");
        assert_eq!(pattern.find_iter("[ab] [a-b] [a_b]").count(), 0);
        assert_eq!(pattern.find_iter("[a] [a x]").count(), 2);
    }

    #[test]
    fn test_prefix_names_both_match() {
        let pattern = ShortcodePattern::build(["a", "ab"]).expect("build");
        let tags: Vec<_> = pattern
            .find_iter("[ab] and [a]")
            .map(|m| m.expect("ok").tag)
            .collect();
        assert_eq!(tags, ["ab", "a"]);
    }

    #[test]
    fn test_names_are_escaped() {
        let pattern = ShortcodePattern::build(["c++"]).expect("build");
        assert_eq!(first(&pattern, "[c++ x]").tag, "c++");
        assert_eq!(pattern.find_iter("[cc]").count(), 0);
    }

    #[test]
    fn test_unclosed_body_does_not_exhaust_backtracking() {
        let pattern = ShortcodePattern::build(["b"]).expect("build");
        let text = format!("[b]{}", "[x".repeat(200_000));
        let out = pattern.replace_with(&text, |_| "B".to_string()).expect("replace");
        assert_eq!(out.len(), text.len() - 2);
        assert!(out.starts_with("B[x"));
    }

    #[test]
    fn test_backtrack_limit_is_enforced() {
        let text = format!("[b]{}", "x".repeat(1_000));
        let tight = ShortcodePattern::build_with_limit(["b"], 10).expect("build");
        assert!(tight.replace_with(&text, |_| String::new()).is_err());

        let roomy = ShortcodePattern::build(["b"]).expect("build");
        assert!(roomy.replace_with(&text, |_| String::new()).is_ok());
    }

    #[test]
    fn test_replace_with_keeps_surrounding_text() {
        let pattern = ShortcodePattern::build(["x"]).expect("build");
        let out = pattern
            .replace_with("a[x]b[x]c", |m| m.tag.to_uppercase())
            .expect("replace");
        assert_eq!(out, "aXbXc");
    }
}
