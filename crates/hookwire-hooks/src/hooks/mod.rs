//! Hook system: registry, dispatcher and handler definitions.

pub mod definitions;
pub mod dispatcher;
pub mod registry;

pub use definitions::{Callback, HandlerId, HookArgs, HookFn, InstanceToken};
pub use dispatcher::HookDispatcher;
pub use registry::{HookEntry, HookRegistry};
