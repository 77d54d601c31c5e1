//! Shortcode engine: tag registry, expansion and stripping.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use hookwire_core::config::shortcode::ShortcodeConfig;
use hookwire_core::result::AppResult;
use hookwire_hooks::HookDispatcher;

use crate::attrs::{ShortcodeAttrs, merge_attrs, parse_attrs};
use crate::pattern::{ShortcodeMatch, ShortcodePattern};

/// Signature of a shortcode handler.
///
/// Receives the engine (for nested expansion), the parsed attributes, the
/// enclosed body of a `[tag]...[/tag]` pair and the tag name.
pub type ShortcodeFn = dyn Fn(&ShortcodeEngine, &ShortcodeAttrs, Option<&str>, &str) -> String;

/// Registry of shortcode handlers and the text processor built on it.
///
/// One handler per tag; registering a tag again replaces its handler but
/// keeps its place in the match order. Single-threaded like the
/// dispatcher it resolves attributes through.
pub struct ShortcodeEngine {
    dispatcher: Rc<HookDispatcher>,
    tags: RefCell<IndexMap<String, Rc<ShortcodeFn>>>,
    /// Compiled pattern for the current tag set, dropped on every change.
    pattern: RefCell<Option<Rc<ShortcodePattern>>>,
    config: ShortcodeConfig,
}

impl ShortcodeEngine {
    /// Creates an engine resolving attribute filters through `dispatcher`.
    pub fn new(dispatcher: Rc<HookDispatcher>) -> Self {
        Self::with_config(dispatcher, ShortcodeConfig::default())
    }

    /// Creates an engine with custom settings.
    pub fn with_config(dispatcher: Rc<HookDispatcher>, config: ShortcodeConfig) -> Self {
        Self {
            dispatcher,
            tags: RefCell::new(IndexMap::new()),
            pattern: RefCell::new(None),
            config,
        }
    }

    /// Returns the dispatcher used for attribute filters.
    pub fn dispatcher(&self) -> &Rc<HookDispatcher> {
        &self.dispatcher
    }

    /// Returns the engine settings.
    pub fn config(&self) -> &ShortcodeConfig {
        &self.config
    }

    /// Registers `handler` for `tag`.
    ///
    /// Any non-empty name is accepted; it is matched literally. Returns
    /// `false` and registers nothing for the empty name.
    pub fn add<F>(&self, tag: &str, handler: F) -> bool
    where
        F: Fn(&ShortcodeEngine, &ShortcodeAttrs, Option<&str>, &str) -> String + 'static,
    {
        if tag.is_empty() {
            warn!("Rejected shortcode with empty name");
            return false;
        }

        self.tags
            .borrow_mut()
            .insert(tag.to_string(), Rc::new(handler));
        self.pattern.borrow_mut().take();

        debug!(shortcode = %tag, "Shortcode registered");
        true
    }

    /// Removes the handler for `tag`. Returns `false` if there was none.
    pub fn remove(&self, tag: &str) -> bool {
        if self.tags.borrow_mut().shift_remove(tag).is_none() {
            return false;
        }
        self.pattern.borrow_mut().take();

        debug!(shortcode = %tag, "Shortcode removed");
        true
    }

    /// Removes every handler. Always returns `true`.
    pub fn remove_all(&self) -> bool {
        self.tags.borrow_mut().clear();
        self.pattern.borrow_mut().take();
        true
    }

    /// Returns whether a handler is registered for `tag`.
    pub fn exists(&self, tag: &str) -> bool {
        self.tags.borrow().contains_key(tag)
    }

    /// Returns the registered tags in match order.
    pub fn tags(&self) -> Vec<String> {
        self.tags.borrow().keys().cloned().collect()
    }

    /// Returns the pattern for the registered tags, or `None` when no tag
    /// is registered.
    ///
    /// The compiled pattern is cached until the tag set changes.
    pub fn pattern(&self) -> AppResult<Option<Rc<ShortcodePattern>>> {
        if let Some(pattern) = self.pattern.borrow().as_ref() {
            return Ok(Some(Rc::clone(pattern)));
        }

        let pattern = {
            let tags = self.tags.borrow();
            if tags.is_empty() {
                return Ok(None);
            }
            Rc::new(ShortcodePattern::build_with_limit(
                tags.keys().map(String::as_str),
                self.config.backtrack_limit,
            )?)
        };
        *self.pattern.borrow_mut() = Some(Rc::clone(&pattern));

        Ok(Some(pattern))
    }

    /// Returns the pattern text for the registered tags.
    pub fn pattern_source(&self) -> Option<String> {
        match self.pattern() {
            Ok(pattern) => pattern.map(|p| p.source().to_string()),
            Err(e) => {
                warn!(error = %e, "Shortcode pattern unavailable");
                None
            }
        }
    }

    /// Returns whether `content` contains the shortcode `tag`, also looking
    /// inside the bodies of other enclosing shortcodes.
    ///
    /// Only registered tags are found.
    pub fn has(&self, content: &str, tag: &str) -> bool {
        if !content.contains('[') || !self.exists(tag) {
            return false;
        }
        let pattern = match self.pattern() {
            Ok(Some(pattern)) => pattern,
            Ok(None) => return false,
            Err(e) => {
                warn!(error = %e, "Shortcode pattern unavailable");
                return false;
            }
        };

        for found in pattern.find_iter(content) {
            let found = match found {
                Ok(found) => found,
                Err(e) => {
                    warn!(shortcode = %tag, error = %e, "Shortcode scan aborted");
                    return false;
                }
            };
            if found.tag == tag {
                return true;
            }
            let nested = found.body.filter(|body| !body.is_empty());
            if nested.is_some_and(|body| self.has(body, tag)) {
                return true;
            }
        }

        false
    }

    /// Replaces every registered shortcode in `content` with its handler's
    /// output. `[[tag]]` produces the literal `[tag]`.
    ///
    /// Content is returned unchanged when no tag is registered or the
    /// pattern cannot be evaluated.
    pub fn expand(&self, content: &str) -> String {
        self.replace(content, |found| self.expand_match(found))
    }

    /// Removes every registered shortcode from `content`, bodies included.
    /// `[[tag]]` produces the literal `[tag]`.
    pub fn strip(&self, content: &str) -> String {
        self.replace(content, |found| {
            if found.is_escaped() {
                found.unescaped().to_string()
            } else {
                format!("{}{}", found.open_escape, found.close_escape)
            }
        })
    }

    /// Combines supported attributes and their defaults with `supplied`.
    ///
    /// The result holds exactly the names of `pairs`, each taking the
    /// supplied value when present. With a non-empty `shortcode` the result
    /// is passed through the `<prefix><shortcode>` filter, which also
    /// receives `pairs` and `supplied`; a filter returning anything but an
    /// object is ignored.
    pub fn resolve_attrs<I, K>(
        &self,
        pairs: I,
        supplied: &ShortcodeAttrs,
        shortcode: &str,
    ) -> Map<String, Value>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let pairs: Map<String, Value> = pairs.into_iter().map(|(k, v)| (k.into(), v)).collect();
        let out = merge_attrs(&pairs, supplied);
        if shortcode.is_empty() {
            return out;
        }

        let filter = format!("{}{shortcode}", self.config.attrs_filter_prefix);
        let filtered = self.dispatcher.apply_filters(
            &filter,
            Value::Object(out.clone()),
            &[Value::Object(pairs), supplied.to_json()],
        );
        match filtered {
            Value::Object(map) => map,
            other => {
                warn!(
                    hook = %filter,
                    result = %other,
                    "Attribute filter returned a non-object; keeping unfiltered attributes"
                );
                out
            }
        }
    }

    fn replace<F>(&self, content: &str, replace: F) -> String
    where
        F: FnMut(&ShortcodeMatch<'_>) -> String,
    {
        let pattern = match self.pattern() {
            Ok(Some(pattern)) => pattern,
            Ok(None) => return content.to_string(),
            Err(e) => {
                warn!(error = %e, "Shortcode pattern unavailable");
                return content.to_string();
            }
        };

        match pattern.replace_with(content, replace) {
            Ok(out) => out,
            Err(e) => {
                warn!(error = %e, "Shortcode processing aborted; content left unchanged");
                content.to_string()
            }
        }
    }

    fn expand_match(&self, found: &ShortcodeMatch<'_>) -> String {
        if found.is_escaped() {
            return found.unescaped().to_string();
        }

        // Looked up per match: an earlier handler may have removed this tag.
        let handler = self.tags.borrow().get(found.tag).cloned();
        let Some(handler) = handler else {
            warn!(shortcode = %found.tag, "Shortcode handler removed during expansion");
            return found.text.to_string();
        };

        let attrs = parse_attrs(found.attrs);
        let output = handler(self, &attrs, found.body, found.tag);

        format!("{}{output}{}", found.open_escape, found.close_escape)
    }
}

impl fmt::Debug for ShortcodeEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShortcodeEngine")
            .field("tags", &self.tags())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use hookwire_hooks::prelude::{Callback, HookRegistry};
    use serde_json::json;

    use super::*;

    fn engine() -> ShortcodeEngine {
        let dispatcher = HookDispatcher::new(Rc::new(HookRegistry::new()));
        ShortcodeEngine::new(Rc::new(dispatcher))
    }

    fn echo_tag(_: &ShortcodeEngine, _: &ShortcodeAttrs, _: Option<&str>, tag: &str) -> String {
        format!("<{tag}>")
    }

    #[test]
    fn test_registry_operations() {
        let engine = engine();
        assert!(engine.add("a", echo_tag));
        assert!(engine.add("b", echo_tag));
        assert!(engine.add("a", echo_tag));
        assert_eq!(engine.tags(), ["a", "b"]);

        assert!(engine.remove("a"));
        assert!(!engine.remove("a"));
        assert!(!engine.exists("a"));
        assert!(engine.exists("b"));

        assert!(engine.remove_all());
        assert!(engine.tags().is_empty());
        assert_eq!(engine.pattern_source(), None);
    }

    #[test]
    fn test_only_empty_name_is_rejected() {
        let engine = engine();
        assert!(!engine.add("", echo_tag));
        assert!(engine.tags().is_empty());

        for name in ["my-tag_2", "a=b", "a b", "<a>", "a&b"] {
            assert!(engine.add(name, echo_tag), "{name:?} rejected");
        }
        assert_eq!(engine.expand("[a=b]"), "<a=b>");
        assert_eq!(engine.expand("[a b x=1]"), "<a b>");
        assert_eq!(engine.expand("[<a>]"), "<<a>>");
        assert_eq!(engine.expand("[a&b]in[/a&b]"), "<a&b>");
    }

    #[test]
    fn test_pattern_is_cached_until_tags_change() {
        let engine = engine();
        engine.add("a", echo_tag);
        let first = engine.pattern().expect("pattern").expect("some");
        let second = engine.pattern().expect("pattern").expect("some");
        assert!(Rc::ptr_eq(&first, &second));

        engine.add("b", echo_tag);
        let third = engine.pattern().expect("pattern").expect("some");
        assert!(!Rc::ptr_eq(&first, &third));
        assert!(third.source().contains("(a|b)"));
    }

    #[test]
    fn test_expand_without_tags_is_identity() {
        let engine = engine();
        let text = "plain [tag] text";
        assert_eq!(engine.expand(text), text);
        assert_eq!(engine.strip(text), text);
    }

    #[test]
    fn test_expand_passes_attrs_body_and_tag() {
        let engine = engine();
        engine.add("box", |_, attrs, body, tag| {
            format!(
                "{tag}:{}:{}",
                attrs.get("color").unwrap_or("none"),
                body.unwrap_or("-")
            )
        });

        assert_eq!(engine.expand("[box color=red]"), "box:red:-");
        assert_eq!(engine.expand("[box/]"), "box:none:-");
        assert_eq!(engine.expand("x [box]in[/box] y"), "x box:none:in y");
    }

    #[test]
    fn test_escaped_and_half_escaped() {
        let engine = engine();
        engine.add("tag", echo_tag);

        assert_eq!(engine.expand("[[tag]]"), "[tag]");
        assert_eq!(engine.expand("[[tag]"), "[<tag>");
        assert_eq!(engine.strip("[[tag]]"), "[tag]");
        assert_eq!(engine.strip("[[tag]"), "[");
    }

    #[test]
    fn test_large_unclosed_enclosing_tag_expands() {
        let engine = engine();
        engine.add("b", |_, _, body, _| format!("<b:{}>", body.is_some()));

        let brackets = format!("[b]{}", "[x".repeat(200_000));
        let out = engine.expand(&brackets);
        assert!(out.starts_with("<b:false>[x[x"));
        assert_eq!(out.len(), brackets.len() - 3 + "<b:false>".len());

        let plain = format!("[b]{}", "x".repeat(1_500_000));
        let out = engine.expand(&plain);
        assert!(out.starts_with("<b:false>xx"));
        assert_eq!(engine.strip(&plain).len(), plain.len() - 3);
    }

    #[test]
    fn test_backtrack_overflow_leaves_content_unchanged() {
        let dispatcher = HookDispatcher::new(Rc::new(HookRegistry::new()));
        let config = ShortcodeConfig {
            backtrack_limit: 10,
            ..ShortcodeConfig::default()
        };
        let engine = ShortcodeEngine::with_config(Rc::new(dispatcher), config);
        engine.add("b", echo_tag);

        let text = format!("[b]{}", "x".repeat(1_000));
        assert_eq!(engine.expand(&text), text);
        assert_eq!(engine.strip(&text), text);
    }

    #[test]
    fn test_strip_drops_tag_and_body() {
        let engine = engine();
        engine.add("testAction", echo_tag);
        assert_eq!(
            engine.strip(r#"foo bar [testAction foo="bar"]content[/testAction]"#),
            "foo bar "
        );
    }

    #[test]
    fn test_unregistered_tags_are_left_alone() {
        let engine = engine();
        engine.add("known", echo_tag);
        assert_eq!(engine.expand("[other] [known]"), "[other] <known>");
    }

    #[test]
    fn test_nested_expansion_through_engine() {
        let engine = engine();
        engine.add("outer", |engine, _, body, _| {
            format!("({})", engine.expand(body.unwrap_or_default()))
        });
        engine.add("inner", echo_tag);

        assert_eq!(engine.expand("[outer]a [inner] b[/outer]"), "(a <inner> b)");
    }

    #[test]
    fn test_handler_removed_mid_expansion() {
        let engine = engine();
        engine.add("first", |engine, _, _, _| {
            engine.remove("second");
            "1".to_string()
        });
        engine.add("second", |_, _, _, _| "2".to_string());

        assert_eq!(engine.expand("[first][second]"), "1[second]");
        assert_eq!(engine.expand("[first][second]"), "1[second]");
    }

    #[test]
    fn test_has_finds_nested_tags() {
        let engine = engine();
        engine.add("outer", echo_tag);
        engine.add("inner", echo_tag);

        assert!(engine.has("a[outer][inner][/outer]b", "inner"));
        assert!(engine.has("[outer]", "outer"));
        assert!(!engine.has("no brackets", "outer"));
        assert!(!engine.has("[outer]", "inner"));
        assert!(!engine.has("[missing]", "missing"));
    }

    #[test]
    fn test_resolve_attrs_without_filter() {
        let engine = engine();
        let supplied = parse_attrs("foo=bar extra=x");
        let out = engine.resolve_attrs([("foo", json!("default"))], &supplied, "");
        assert_eq!(Value::Object(out), json!({"foo": "bar"}));
    }

    #[test]
    fn test_resolve_attrs_runs_named_filter() {
        let engine = engine();
        let seen = Rc::new(Cell::new(0usize));
        let counter = seen.clone();
        engine.dispatcher().add(
            "shortcodeAttrs_video",
            Callback::closure(move |_, args| {
                counter.set(args.len());
                let mut out = args[0].clone();
                if let Some(map) = out.as_object_mut() {
                    map.insert("width".into(), json!(100));
                }
                out
            }),
        );

        let supplied = parse_attrs("width=5 height=7");
        let out = engine.resolve_attrs(
            [("width", json!(640)), ("height", json!(390))],
            &supplied,
            "video",
        );
        assert_eq!(Value::Object(out), json!({"width": 100, "height": "7"}));
        assert_eq!(seen.get(), 3);
    }

    #[test]
    fn test_resolve_attrs_ignores_non_object_filter_result() {
        let engine = engine();
        engine
            .dispatcher()
            .add("shortcodeAttrs_x", Callback::closure(|_, _| json!("oops")));

        let out = engine.resolve_attrs([("a", json!(1))], &parse_attrs(""), "x");
        assert_eq!(Value::Object(out), json!({"a": 1}));
    }

    #[test]
    fn test_youtube_embed() {
        let engine = engine();
        engine.add("youtube", |engine, attrs, _, tag| {
            let attrs = engine.resolve_attrs(
                [
                    ("id", json!("")),
                    ("width", json!(640)),
                    ("height", json!(390)),
                    ("color", json!("red")),
                    ("theme", json!("dark")),
                    ("autoplay", json!(0)),
                    ("controls", json!(1)),
                    ("start", json!(0)),
                ],
                attrs,
                tag,
            );
            let field = |name: &str| match &attrs[name] {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!(
                "<iframe type=\"text/html\" frameborder=0 width={} height={} \
                 src=\"http://www.youtube.com/embed/{}?color={}&theme={}&autoplay={}&controls={}&start={}\" />",
                field("width"),
                field("height"),
                field("id"),
                field("color"),
                field("theme"),
                field("autoplay"),
                field("controls"),
                field("start"),
            )
        });

        assert_eq!(
            engine.expand("[youtube id=iCUV3iv9xOs color=white theme=light]"),
            "<iframe type=\"text/html\" frameborder=0 width=640 height=390 \
             src=\"http://www.youtube.com/embed/iCUV3iv9xOs?color=white&theme=light&autoplay=0&controls=1&start=0\" />"
        );
    }
}
