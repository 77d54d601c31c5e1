//! Hook dispatcher: fires a tag's handlers in priority order.
//!
//! Filters thread a value through the chain: each handler receives
//! `[value, extra...]` and its return value becomes the next `value`.
//! Actions hand every handler the same argument list and ignore return
//! values; they also count how often each tag was fired.
//!
//! Before any tag fires, handlers registered on the wildcard tag (`"all"`
//! by default) run with the full call arguments `[tag, ...]`. While a tag
//! fires, it sits on top of the current-tag stack.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, trace};

use hookwire_core::config::hooks::HooksConfig;

use super::definitions::{Callback, HandlerId};
use super::registry::{HookEntry, HookRegistry};
use crate::include::{FsIncludeLoader, IncludeLoader, IncludeTracker};

/// Pops the current-tag stack when dropped.
struct TagScope<'a> {
    stack: &'a RefCell<Vec<String>>,
}

impl<'a> TagScope<'a> {
    fn enter(stack: &'a RefCell<Vec<String>>, tag: &str) -> Self {
        stack.borrow_mut().push(tag.to_string());
        Self { stack }
    }
}

impl Drop for TagScope<'_> {
    fn drop(&mut self) {
        self.stack.borrow_mut().pop();
    }
}

/// Fires hooks registered in a [`HookRegistry`].
///
/// Handlers receive `&HookDispatcher` and may fire other tags (or the same
/// one) re-entrantly. Like the registry, the dispatcher is single-threaded
/// state with no internal locking.
#[derive(Debug)]
pub struct HookDispatcher {
    /// Hook registry.
    registry: Rc<HookRegistry>,
    /// Tag → number of action fires.
    fire_counts: RefCell<HashMap<String, u64>>,
    /// Tags currently being fired, innermost last.
    current: RefCell<Vec<String>>,
    includes: IncludeTracker,
    config: HooksConfig,
}

impl HookDispatcher {
    /// Creates a dispatcher over `registry` with default settings.
    pub fn new(registry: Rc<HookRegistry>) -> Self {
        Self::with_config(registry, HooksConfig::default())
    }

    /// Creates a dispatcher using `config`; include paths are checked on
    /// disk relative to `config.include_root`.
    pub fn with_config(registry: Rc<HookRegistry>, config: HooksConfig) -> Self {
        let loader = FsIncludeLoader::new(config.include_root.clone());
        Self::with_loader(registry, config, loader)
    }

    /// Creates a dispatcher with a custom include loader.
    pub fn with_loader(
        registry: Rc<HookRegistry>,
        config: HooksConfig,
        loader: impl IncludeLoader + 'static,
    ) -> Self {
        Self {
            registry,
            fire_counts: RefCell::new(HashMap::new()),
            current: RefCell::new(Vec::new()),
            includes: IncludeTracker::new(Box::new(loader)),
            config,
        }
    }

    /// Returns a reference to the hook registry.
    pub fn registry(&self) -> &Rc<HookRegistry> {
        &self.registry
    }

    /// Returns the dispatcher settings.
    pub fn config(&self) -> &HooksConfig {
        &self.config
    }

    /// Registers `callback` for `tag` at the configured default priority.
    pub fn add(&self, tag: &str, callback: Callback) -> bool {
        self.registry.add(tag, callback, self.config.default_priority, None)
    }

    /// Removes `id` from `tag` at the configured default priority.
    pub fn remove(&self, tag: &str, id: &HandlerId) -> bool {
        self.registry.remove(tag, id, self.config.default_priority)
    }

    /// Passes `value` through every handler of `tag` and returns the result.
    ///
    /// `extra` is appended to every handler's arguments. An unregistered tag
    /// returns `value` unchanged.
    pub fn apply_filters(&self, tag: &str, value: Value, extra: &[Value]) -> Value {
        let scope = self.run_wildcard(tag, || {
            let mut all = Vec::with_capacity(extra.len() + 2);
            all.push(Value::String(tag.to_string()));
            all.push(value.clone());
            all.extend_from_slice(extra);
            all
        });

        let Some(entries) = self.registry.handlers(tag) else {
            return value;
        };
        let _scope = scope.unwrap_or_else(|| TagScope::enter(&self.current, tag));

        let mut args = Vec::with_capacity(extra.len() + 1);
        args.push(value);
        args.extend_from_slice(extra);

        self.run_filters(tag, &entries, args)
    }

    /// Like [`apply_filters`](Self::apply_filters), with the arguments given
    /// as one list whose first element is the filtered value.
    ///
    /// An empty list is treated as `[null]`.
    pub fn apply_filters_ref_array(&self, tag: &str, mut args: Vec<Value>) -> Value {
        if args.is_empty() {
            args.push(Value::Null);
        }

        let scope = self.run_wildcard(tag, || {
            vec![Value::String(tag.to_string()), Value::Array(args.clone())]
        });

        let Some(entries) = self.registry.handlers(tag) else {
            return args.swap_remove(0);
        };
        let _scope = scope.unwrap_or_else(|| TagScope::enter(&self.current, tag));

        self.run_filters(tag, &entries, args)
    }

    /// Invokes every handler of `tag` with `arg` followed by `extra`.
    ///
    /// A one-element array holding an object is unwrapped, so handlers
    /// receive (and can edit in place) the object itself. Returns `false`
    /// when `tag` is not registered. The fire is counted either way.
    pub fn do_action(&self, tag: &str, arg: Value, extra: &[Value]) -> bool {
        self.count_fire(tag);

        let scope = self.run_wildcard(tag, || {
            let mut all = Vec::with_capacity(extra.len() + 2);
            all.push(Value::String(tag.to_string()));
            all.push(arg.clone());
            all.extend_from_slice(extra);
            all
        });

        let Some(entries) = self.registry.handlers(tag) else {
            return false;
        };
        let _scope = scope.unwrap_or_else(|| TagScope::enter(&self.current, tag));

        let mut args = Vec::with_capacity(extra.len() + 1);
        args.push(unwrap_single_object(arg));
        args.extend_from_slice(extra);

        self.run_actions(tag, &entries, &mut args);
        true
    }

    /// Invokes every handler of `tag` with `args`, shared in place.
    ///
    /// Edits a handler makes to `args` are visible to later handlers and to
    /// the caller. Returns `false` when `tag` is not registered.
    pub fn do_action_ref_array(&self, tag: &str, args: &mut [Value]) -> bool {
        self.count_fire(tag);

        let scope = self.run_wildcard(tag, || {
            vec![Value::String(tag.to_string()), Value::Array(args.to_vec())]
        });

        let Some(entries) = self.registry.handlers(tag) else {
            return false;
        };
        let _scope = scope.unwrap_or_else(|| TagScope::enter(&self.current, tag));

        self.run_actions(tag, &entries, args);
        true
    }

    /// Returns how many times `tag` was fired as an action.
    pub fn did_action(&self, tag: &str) -> u64 {
        self.fire_counts.borrow().get(tag).copied().unwrap_or(0)
    }

    /// Returns the innermost tag being fired, if any.
    pub fn current_tag(&self) -> Option<String> {
        self.current.borrow().last().cloned()
    }

    /// Returns whether `tag` is anywhere on the current-tag stack.
    pub fn is_firing(&self, tag: &str) -> bool {
        self.current.borrow().iter().any(|t| t == tag)
    }

    fn count_fire(&self, tag: &str) {
        *self
            .fire_counts
            .borrow_mut()
            .entry(tag.to_string())
            .or_insert(0) += 1;
    }

    /// Runs the wildcard handlers for a fire of `tag`.
    ///
    /// When the wildcard tag is registered, `tag` is pushed first and the
    /// returned scope keeps it there for the rest of the fire.
    fn run_wildcard<F>(&self, tag: &str, all_args: F) -> Option<TagScope<'_>>
    where
        F: FnOnce() -> Vec<Value>,
    {
        let wildcard = self.config.wildcard_tag.as_str();
        if !self.registry.has(wildcard) {
            return None;
        }

        let scope = TagScope::enter(&self.current, tag);
        let mut args = all_args();
        if let Some(entries) = self.registry.handlers(wildcard) {
            trace!(hook = %tag, handler_count = entries.len(), "Running wildcard handlers");
            for entry in &entries {
                self.invoke(entry, &mut args);
            }
        }

        Some(scope)
    }

    fn run_filters(&self, tag: &str, entries: &[HookEntry], mut args: Vec<Value>) -> Value {
        debug!(hook = %tag, handler_count = entries.len(), "Applying filters");

        for entry in entries {
            let value = self.invoke(entry, &mut args);
            args[0] = value;
        }

        args.swap_remove(0)
    }

    fn run_actions(&self, tag: &str, entries: &[HookEntry], args: &mut [Value]) {
        debug!(hook = %tag, handler_count = entries.len(), "Doing action");

        for entry in entries {
            self.invoke(entry, args);
        }
    }

    fn invoke(&self, entry: &HookEntry, args: &mut [Value]) -> Value {
        if let Some(path) = &entry.include_path {
            self.includes.include_once(path);
        }

        trace!(handler = %entry.callback.id(), "Invoking hook handler");
        entry.callback.call(self, args)
    }
}

/// `[object]` becomes `object`; anything else is passed through.
fn unwrap_single_object(arg: Value) -> Value {
    match arg {
        Value::Array(mut items) if items.len() == 1 && items[0].is_object() => items.remove(0),
        other => other,
    }
}
