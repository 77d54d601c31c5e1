//! # hookwire
//!
//! Named-hook callback registry and dispatcher with a shortcode engine on
//! top. [`Hooks`] bundles one registry, one dispatcher and one shortcode
//! engine behind the flat filter / action / shortcode API:
//!
//! ```
//! use hookwire::{Callback, Hooks, json};
//!
//! let hooks = Hooks::new();
//! hooks.add_filter("title", Callback::named("shout", |_, args| {
//!     json!(args[0].as_str().unwrap_or_default().to_uppercase())
//! }), 10);
//! assert_eq!(hooks.apply_filters("title", json!("hello"), &[]), json!("HELLO"));
//!
//! hooks.add_shortcode("year", |_, _, _, _| "2024".to_string());
//! assert_eq!(hooks.do_shortcode("(c) [year]"), "(c) 2024");
//! ```
//!
//! Everything here is single-threaded: the types are `!Send` and `!Sync`
//! and there is no internal locking. Handlers may re-enter the dispatcher
//! and change registrations while a fire is running.

use std::path::PathBuf;
use std::rc::Rc;

use serde_json::{Map, Value};
use tracing::debug;

pub use hookwire_core::config::HookwireConfig;
pub use hookwire_core::error::{AppError, ErrorKind};
pub use hookwire_core::result::AppResult;
pub use hookwire_hooks::{
    Callback, FsIncludeLoader, HandlerId, HookArgs, HookDispatcher, HookEntry, HookRegistry,
    IncludeLoader, InstanceToken, NoopIncludeLoader,
};
pub use hookwire_shortcode::{
    AttrKey, AttrMap, ShortcodeAttrs, ShortcodeEngine, ShortcodeMatch, ShortcodePattern,
};
pub use serde_json::json;

/// Filters, actions and shortcodes sharing one registry.
///
/// Filters and actions live in the same tag namespace: `has_action` sees
/// filters and `remove_filter` removes actions. Shortcodes have their own
/// namespace.
#[derive(Debug)]
pub struct Hooks {
    dispatcher: Rc<HookDispatcher>,
    shortcodes: ShortcodeEngine,
}

impl Default for Hooks {
    fn default() -> Self {
        Self::new()
    }
}

impl Hooks {
    /// Creates an empty instance with default settings.
    pub fn new() -> Self {
        Self::from_config(&HookwireConfig::default())
    }

    /// Creates an empty instance using `config`.
    pub fn from_config(config: &HookwireConfig) -> Self {
        let registry = Rc::new(HookRegistry::new());
        let dispatcher = HookDispatcher::with_config(registry, config.hooks.clone());
        Self::assemble(dispatcher, config)
    }

    /// Creates an empty instance with a custom include loader.
    pub fn with_loader(config: &HookwireConfig, loader: impl IncludeLoader + 'static) -> Self {
        let dispatcher = HookDispatcher::with_loader(
            Rc::new(HookRegistry::new()),
            config.hooks.clone(),
            loader,
        );
        Self::assemble(dispatcher, config)
    }

    fn assemble(dispatcher: HookDispatcher, config: &HookwireConfig) -> Self {
        debug!(
            default_priority = config.hooks.default_priority,
            wildcard = %config.hooks.wildcard_tag,
            "Hooks initialized"
        );
        let dispatcher = Rc::new(dispatcher);
        let shortcodes =
            ShortcodeEngine::with_config(Rc::clone(&dispatcher), config.shortcode.clone());
        Self {
            dispatcher,
            shortcodes,
        }
    }

    /// Returns the dispatcher.
    pub fn dispatcher(&self) -> &Rc<HookDispatcher> {
        &self.dispatcher
    }

    /// Returns the hook registry.
    pub fn registry(&self) -> &Rc<HookRegistry> {
        self.dispatcher.registry()
    }

    /// Returns the shortcode engine.
    pub fn shortcodes(&self) -> &ShortcodeEngine {
        &self.shortcodes
    }

    /// Priority used when none is given.
    pub fn default_priority(&self) -> i32 {
        self.dispatcher.config().default_priority
    }

    // ── Filters ──────────────────────────────────────────────────

    /// Registers `callback` as a filter for `tag`.
    pub fn add_filter(&self, tag: &str, callback: Callback, priority: i32) -> bool {
        self.registry().add(tag, callback, priority, None)
    }

    /// Registers `callback` as a filter for `tag` at the default priority.
    pub fn add_filter_default(&self, tag: &str, callback: Callback) -> bool {
        self.dispatcher.add(tag, callback)
    }

    /// Registers `callback` for `tag`, loading `include_path` before its
    /// first invocation.
    pub fn add_filter_with_include(
        &self,
        tag: &str,
        callback: Callback,
        priority: i32,
        include_path: impl Into<PathBuf>,
    ) -> bool {
        self.registry().add(tag, callback, priority, Some(include_path.into()))
    }

    /// Removes the handler `id` from `tag` at `priority`.
    pub fn remove_filter(&self, tag: &str, id: &HandlerId, priority: i32) -> bool {
        self.registry().remove(tag, id, priority)
    }

    /// Removes all handlers of `tag`, or only those at `priority`.
    pub fn remove_all_filters(&self, tag: &str, priority: Option<i32>) -> bool {
        self.registry().remove_all(tag, priority)
    }

    /// Returns whether `tag` is registered.
    pub fn has_filter(&self, tag: &str) -> bool {
        self.registry().has(tag)
    }

    /// Returns the priority at which `id` is registered for `tag`.
    pub fn filter_priority(&self, tag: &str, id: &HandlerId) -> Option<i32> {
        self.registry().priority_of(tag, id)
    }

    /// Passes `value` through the filters of `tag`.
    pub fn apply_filters(&self, tag: &str, value: Value, extra: &[Value]) -> Value {
        self.dispatcher.apply_filters(tag, value, extra)
    }

    /// Passes `args[0]` through the filters of `tag`, with the rest of
    /// `args` as extra arguments.
    pub fn apply_filters_ref_array(&self, tag: &str, args: Vec<Value>) -> Value {
        self.dispatcher.apply_filters_ref_array(tag, args)
    }

    /// Returns the innermost tag being fired.
    pub fn current_filter(&self) -> Option<String> {
        self.dispatcher.current_tag()
    }

    // ── Actions ──────────────────────────────────────────────────

    /// Registers `callback` as an action for `tag`.
    pub fn add_action(&self, tag: &str, callback: Callback, priority: i32) -> bool {
        self.add_filter(tag, callback, priority)
    }

    /// Registers `callback` as an action for `tag` at the default priority.
    pub fn add_action_default(&self, tag: &str, callback: Callback) -> bool {
        self.add_filter_default(tag, callback)
    }

    /// Registers an action that loads `include_path` before its first
    /// invocation.
    pub fn add_action_with_include(
        &self,
        tag: &str,
        callback: Callback,
        priority: i32,
        include_path: impl Into<PathBuf>,
    ) -> bool {
        self.add_filter_with_include(tag, callback, priority, include_path)
    }

    /// Removes the action `id` from `tag` at `priority`.
    pub fn remove_action(&self, tag: &str, id: &HandlerId, priority: i32) -> bool {
        self.remove_filter(tag, id, priority)
    }

    /// Removes all actions of `tag`, or only those at `priority`.
    pub fn remove_all_actions(&self, tag: &str, priority: Option<i32>) -> bool {
        self.remove_all_filters(tag, priority)
    }

    /// Returns whether `tag` is registered.
    pub fn has_action(&self, tag: &str) -> bool {
        self.has_filter(tag)
    }

    /// Returns the priority at which the action `id` is registered.
    pub fn action_priority(&self, tag: &str, id: &HandlerId) -> Option<i32> {
        self.filter_priority(tag, id)
    }

    /// Fires the actions of `tag`.
    pub fn do_action(&self, tag: &str, arg: Value, extra: &[Value]) -> bool {
        self.dispatcher.do_action(tag, arg, extra)
    }

    /// Fires the actions of `tag` with `args` shared in place.
    pub fn do_action_ref_array(&self, tag: &str, args: &mut [Value]) -> bool {
        self.dispatcher.do_action_ref_array(tag, args)
    }

    /// Returns how often `tag` was fired as an action.
    pub fn did_action(&self, tag: &str) -> u64 {
        self.dispatcher.did_action(tag)
    }

    // ── Shortcodes ───────────────────────────────────────────────

    /// Registers the shortcode `tag`.
    pub fn add_shortcode<F>(&self, tag: &str, handler: F) -> bool
    where
        F: Fn(&ShortcodeEngine, &ShortcodeAttrs, Option<&str>, &str) -> String + 'static,
    {
        self.shortcodes.add(tag, handler)
    }

    /// Removes the shortcode `tag`. Returns `false` if it was not registered.
    pub fn remove_shortcode(&self, tag: &str) -> bool {
        self.shortcodes.remove(tag)
    }

    /// Removes every shortcode.
    pub fn remove_all_shortcodes(&self) -> bool {
        self.shortcodes.remove_all()
    }

    /// Returns whether the shortcode `tag` is registered.
    pub fn shortcode_exists(&self, tag: &str) -> bool {
        self.shortcodes.exists(tag)
    }

    /// Returns whether `content` contains the registered shortcode `tag`.
    pub fn has_shortcode(&self, content: &str, tag: &str) -> bool {
        self.shortcodes.has(content, tag)
    }

    /// Expands every registered shortcode in `content`.
    pub fn do_shortcode(&self, content: &str) -> String {
        self.shortcodes.expand(content)
    }

    /// Removes every registered shortcode from `content`.
    pub fn strip_shortcodes(&self, content: &str) -> String {
        self.shortcodes.strip(content)
    }

    /// Parses shortcode attribute text.
    pub fn shortcode_parse_attrs(&self, text: &str) -> ShortcodeAttrs {
        hookwire_shortcode::parse_attrs(text)
    }

    /// Applies defaults to supplied attributes; see
    /// [`ShortcodeEngine::resolve_attrs`].
    pub fn shortcode_attrs<I, K>(
        &self,
        pairs: I,
        attrs: &ShortcodeAttrs,
        shortcode: &str,
    ) -> Map<String, Value>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.shortcodes.resolve_attrs(pairs, attrs, shortcode)
    }

    /// Returns the pattern text matching the registered shortcodes.
    pub fn shortcode_regex(&self) -> Option<String> {
        self.shortcodes.pattern_source()
    }
}
