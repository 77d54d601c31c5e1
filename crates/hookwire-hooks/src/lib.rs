//! # hookwire-hooks
//!
//! Named-hook callback registry and dispatcher. Provides:
//!
//! - Hook registry keyed by tag, ordered by priority then registration
//! - Filter dispatch threading a value through the handler chain
//! - Action dispatch with per-tag fire counts
//! - A wildcard tag fired before every other tag
//! - Include-once loading of per-handler resources
//!
//! All state is single-threaded (`!Sync`); handlers may re-enter the
//! dispatcher from inside a fire.

pub mod hooks;
pub mod include;
pub mod prelude;

pub use hooks::definitions::{Callback, HandlerId, HookArgs, InstanceToken};
pub use hooks::dispatcher::HookDispatcher;
pub use hooks::registry::{HookEntry, HookRegistry};
pub use include::{FsIncludeLoader, IncludeLoader, NoopIncludeLoader};
