//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde_json::Value;

use hookwire::{Callback, HookwireConfig, Hooks, InstanceToken};

/// Fresh hooks with default settings
pub fn hooks() -> Hooks {
    Hooks::new()
}

/// Load a configuration written to `dir/hookwire.toml`
pub fn config_from(dir: &Path, contents: &str) -> HookwireConfig {
    let path = write_file(dir, "hookwire.toml", contents);
    HookwireConfig::load(&path).expect("Failed to load test config")
}

/// Write `contents` to `dir/name` and return the path
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("Failed to write test file");
    path
}

/// Filter appending `suffix` to the string value
pub fn append(name: &str, suffix: &str) -> Callback {
    let suffix = suffix.to_string();
    Callback::named(name, move |_, args| {
        Value::String(format!("{}{suffix}", args[0].as_str().unwrap_or_default()))
    })
}

/// Object owning a handler token, with a call counter per method
pub struct Recorder {
    pub token: InstanceToken,
    pub log: Rc<RefCell<Vec<String>>>,
    pub calls: Rc<Cell<usize>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            token: InstanceToken::new(),
            log: Rc::new(RefCell::new(Vec::new())),
            calls: Rc::new(Cell::new(0)),
        }
    }

    /// Method handler recording `label` and returning `result`
    pub fn method(&self, method: &str, label: &str, result: Value) -> Callback {
        let log = Rc::clone(&self.log);
        let calls = Rc::clone(&self.calls);
        let label = label.to_string();
        Callback::bound(self.token, method, move |_, _| {
            calls.set(calls.get() + 1);
            log.borrow_mut().push(label.clone());
            result.clone()
        })
    }

    pub fn entries(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}
