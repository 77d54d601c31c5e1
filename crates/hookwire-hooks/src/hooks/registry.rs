//! Hook registry: handlers organized by tag, priority and registration order.
//!
//! Each tag maps priorities to buckets; each bucket holds entries keyed by
//! handler identity in insertion order. Priorities are only sorted lazily,
//! right before a fire, and the "sorted" flag is cleared by every add or
//! remove on that tag.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;

use indexmap::IndexMap;
use tracing::debug;

use super::definitions::{Callback, HandlerId};

/// A registered handler.
#[derive(Debug, Clone)]
pub struct HookEntry {
    /// The handler.
    pub callback: Callback,
    /// Resource loaded right before the handler is first invoked.
    pub include_path: Option<PathBuf>,
}

/// Handlers for one tag.
#[derive(Debug, Default)]
struct TagHooks {
    /// Priority → identity key → entry.
    priorities: IndexMap<i32, IndexMap<String, HookEntry>>,
    /// Whether `priorities` is currently sorted ascending.
    sorted: bool,
}

impl TagHooks {
    fn sort(&mut self) {
        if !self.sorted {
            self.priorities.sort_keys();
            self.sorted = true;
        }
    }
}

/// Registry of hook handlers organized by tag.
///
/// Interior mutability lets handlers add or remove registrations while a
/// fire is in progress. The registry is `!Sync`: it assumes one thread of
/// control, and hosts that share it across threads must serialize access
/// themselves.
#[derive(Debug, Default)]
pub struct HookRegistry {
    tags: RefCell<HashMap<String, TagHooks>>,
}

impl HookRegistry {
    /// Creates a new empty hook registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for `tag` at `priority`.
    ///
    /// Re-adding the same identity at the same priority overwrites the
    /// previous entry in place. Always returns `true`.
    pub fn add(
        &self,
        tag: &str,
        callback: Callback,
        priority: i32,
        include_path: Option<PathBuf>,
    ) -> bool {
        let key = callback.id().key();
        debug!(hook = %tag, handler = %callback.id(), priority, "Hook handler registered");

        let mut tags = self.tags.borrow_mut();
        let hooks = tags.entry(tag.to_string()).or_default();
        hooks.priorities.entry(priority).or_default().insert(
            key,
            HookEntry {
                callback,
                include_path,
            },
        );
        hooks.sorted = false;

        true
    }

    /// Removes the handler identified by `id` from `tag` at `priority`.
    ///
    /// An emptied priority bucket is dropped, but the tag itself stays
    /// registered (see [`has`](Self::has)).
    pub fn remove(&self, tag: &str, id: &HandlerId, priority: i32) -> bool {
        let key = id.key();
        let mut tags = self.tags.borrow_mut();
        let Some(hooks) = tags.get_mut(tag) else {
            return false;
        };
        let Some(bucket) = hooks.priorities.get_mut(&priority) else {
            return false;
        };
        if bucket.shift_remove(&key).is_none() {
            return false;
        }
        if bucket.is_empty() {
            hooks.priorities.shift_remove(&priority);
        }
        hooks.sorted = false;

        debug!(hook = %tag, handler = %id, priority, "Hook handler removed");
        true
    }

    /// Removes every handler of `tag`, or only those at `priority`.
    ///
    /// When `priority` is given but has no bucket, the whole tag is dropped.
    /// Always returns `true`.
    pub fn remove_all(&self, tag: &str, priority: Option<i32>) -> bool {
        let mut tags = self.tags.borrow_mut();
        let Some(hooks) = tags.get_mut(tag) else {
            return true;
        };
        hooks.sorted = false;

        let bucket = priority.filter(|p| hooks.priorities.contains_key(p));
        if let Some(priority) = bucket {
            hooks.priorities.shift_remove(&priority);
            debug!(hook = %tag, priority, "Hook priority cleared");
        } else {
            tags.remove(tag);
            debug!(hook = %tag, "Hook cleared");
        }

        true
    }

    /// Returns whether `tag` is registered.
    ///
    /// This is a presence check on the tag: a tag whose handlers were all
    /// removed one by one with [`remove`](Self::remove) is still present.
    pub fn has(&self, tag: &str) -> bool {
        self.tags.borrow().contains_key(tag)
    }

    /// Returns the first priority at which `id` is registered for `tag`.
    ///
    /// Priorities are scanned in their current storage order, which is not
    /// necessarily ascending.
    pub fn priority_of(&self, tag: &str, id: &HandlerId) -> Option<i32> {
        let key = id.key();
        let tags = self.tags.borrow();
        let hooks = tags.get(tag)?;
        hooks
            .priorities
            .iter()
            .find(|(_, bucket)| bucket.contains_key(&key))
            .map(|(priority, _)| *priority)
    }

    /// Returns the handlers of `tag` in execution order, or `None` when the
    /// tag is not registered.
    ///
    /// Sorts the tag's priorities first if an add or remove invalidated the
    /// previous sort. The returned entries are a snapshot; registrations
    /// changed by a running handler apply to the next fire.
    pub fn handlers(&self, tag: &str) -> Option<Vec<HookEntry>> {
        let mut tags = self.tags.borrow_mut();
        let hooks = tags.get_mut(tag)?;
        hooks.sort();

        Some(
            hooks
                .priorities
                .values()
                .flat_map(|bucket| bucket.values().cloned())
                .collect(),
        )
    }

    /// Returns whether the priorities of `tag` are known to be sorted.
    pub fn is_sorted(&self, tag: &str) -> bool {
        self.tags
            .borrow()
            .get(tag)
            .map(|hooks| hooks.sorted)
            .unwrap_or(false)
    }

    /// Returns the number of handlers registered for `tag`.
    pub fn handler_count(&self, tag: &str) -> usize {
        self.tags
            .borrow()
            .get(tag)
            .map(|hooks| hooks.priorities.values().map(IndexMap::len).sum())
            .unwrap_or(0)
    }

    /// Returns all registered tags.
    pub fn tags(&self) -> Vec<String> {
        self.tags.borrow().keys().cloned().collect()
    }

    /// Returns the include path recorded for `id` at (`tag`, `priority`).
    pub fn include_path(&self, tag: &str, id: &HandlerId, priority: i32) -> Option<PathBuf> {
        let key = id.key();
        let tags = self.tags.borrow();
        tags.get(tag)?
            .priorities
            .get(&priority)?
            .get(&key)?
            .include_path
            .clone()
    }
}
