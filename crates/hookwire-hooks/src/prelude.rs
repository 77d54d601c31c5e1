//! Prelude for convenient imports.

pub use crate::hooks::definitions::{
    Callback, DEFAULT_PRIORITY, HandlerId, HookArgs, InstanceToken, WILDCARD_TAG,
};
pub use crate::hooks::dispatcher::HookDispatcher;
pub use crate::hooks::registry::HookRegistry;
pub use crate::include::IncludeLoader;
pub use serde_json::{Value, json};
