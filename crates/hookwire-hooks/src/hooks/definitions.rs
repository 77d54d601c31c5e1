//! Handler identity and callback definitions.
//!
//! Every registered handler carries a [`HandlerId`] describing which of the
//! four callable forms it is. The identity key derived from it decides
//! whether two registrations collide (same tag, same priority, same key) and
//! is what [`HookRegistry::remove`](super::registry::HookRegistry::remove)
//! and [`HookRegistry::priority_of`](super::registry::HookRegistry::priority_of)
//! look up.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

use super::dispatcher::HookDispatcher;

pub use hookwire_core::config::hooks::{DEFAULT_PRIORITY, WILDCARD_TAG};

/// Argument list handed to a handler. `args[0]` is the filtered value.
pub type HookArgs = Vec<Value>;

/// Signature of every hook handler.
///
/// The dispatcher is passed in so a handler can fire other tags or change
/// registrations while it runs. For filters the return value replaces
/// `args[0]`; for actions it is discarded.
pub type HookFn = dyn Fn(&HookDispatcher, &mut [Value]) -> Value;

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Process-unique token standing in for an object's identity.
///
/// Host objects that register methods as handlers hold one of these and
/// reuse it for every registration, so `remove` and `priority_of` can find
/// the same entry again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceToken(u64);

impl InstanceToken {
    /// Allocates a fresh token.
    pub fn new() -> Self {
        Self(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for InstanceToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InstanceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// Identity of a handler, one variant per callable form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HandlerId {
    /// A free function referenced by name.
    Named(String),
    /// A method bound to a specific object.
    Bound {
        /// The object's token.
        instance: InstanceToken,
        /// Method name.
        method: String,
    },
    /// A method on a type, with no bound instance.
    Static {
        /// Type name.
        type_name: String,
        /// Method name.
        method: String,
    },
    /// An anonymous closure.
    Closure(InstanceToken),
}

impl HandlerId {
    /// Identity of a named function.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Identity of a method bound to `instance`.
    pub fn bound(instance: InstanceToken, method: impl Into<String>) -> Self {
        Self::Bound {
            instance,
            method: method.into(),
        }
    }

    /// Identity of a method on the type `T`.
    pub fn method_of<T: ?Sized>(method: impl Into<String>) -> Self {
        Self::Static {
            type_name: std::any::type_name::<T>().to_string(),
            method: method.into(),
        }
    }

    /// Identity of a method on a type given by name.
    pub fn static_method(type_name: impl Into<String>, method: impl Into<String>) -> Self {
        Self::Static {
            type_name: type_name.into(),
            method: method.into(),
        }
    }

    /// The deterministic key used for storage and lookup.
    ///
    /// `Named("T::m")` and `Static { T, m }` share a key: both name the
    /// same callable. Bound methods and closures never collide with each
    /// other, even when they share a token.
    pub fn key(&self) -> String {
        match self {
            Self::Named(name) => name.clone(),
            Self::Bound { instance, method } => format!("{instance}->{method}"),
            Self::Static { type_name, method } => format!("{type_name}::{method}"),
            Self::Closure(token) => format!("{token}#closure"),
        }
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::Bound { instance, method } => write!(f, "#{}->{method}", instance.0),
            Self::Static { type_name, method } => write!(f, "{type_name}::{method}"),
            Self::Closure(token) => write!(f, "{{closure#{}}}", token.0),
        }
    }
}

/// A handler together with its identity.
#[derive(Clone)]
pub struct Callback {
    id: HandlerId,
    func: Rc<HookFn>,
}

impl Callback {
    /// Creates a callback with an explicit identity.
    pub fn new<F>(id: HandlerId, func: F) -> Self
    where
        F: Fn(&HookDispatcher, &mut [Value]) -> Value + 'static,
    {
        Self {
            id,
            func: Rc::new(func),
        }
    }

    /// A free function referenced by `name`.
    pub fn named<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&HookDispatcher, &mut [Value]) -> Value + 'static,
    {
        Self::new(HandlerId::named(name), func)
    }

    /// A method bound to the object owning `instance`.
    pub fn bound<F>(instance: InstanceToken, method: impl Into<String>, func: F) -> Self
    where
        F: Fn(&HookDispatcher, &mut [Value]) -> Value + 'static,
    {
        Self::new(HandlerId::bound(instance, method), func)
    }

    /// A method on the type `T`.
    pub fn method_of<T: ?Sized, F>(method: impl Into<String>, func: F) -> Self
    where
        F: Fn(&HookDispatcher, &mut [Value]) -> Value + 'static,
    {
        Self::new(HandlerId::method_of::<T>(method), func)
    }

    /// An anonymous closure with a fresh identity.
    ///
    /// Keep the returned callback (or its [`id`](Self::id)) around if the
    /// closure must be removed later; a second `closure` call never collides
    /// with the first.
    pub fn closure<F>(func: F) -> Self
    where
        F: Fn(&HookDispatcher, &mut [Value]) -> Value + 'static,
    {
        Self::new(HandlerId::Closure(InstanceToken::new()), func)
    }

    /// Returns the handler identity.
    pub fn id(&self) -> &HandlerId {
        &self.id
    }

    pub(crate) fn call(&self, dispatcher: &HookDispatcher, args: &mut [Value]) -> Value {
        (self.func)(dispatcher, args)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Greeter;

    #[test]
    fn test_named_key_is_the_name() {
        assert_eq!(HandlerId::named("time").key(), "time");
    }

    #[test]
    fn test_bound_key_depends_on_instance_and_method() {
        let a = InstanceToken::new();
        let b = InstanceToken::new();
        assert_ne!(a, b);
        assert_eq!(
            HandlerId::bound(a, "run").key(),
            HandlerId::bound(a, "run").key()
        );
        assert_ne!(
            HandlerId::bound(a, "run").key(),
            HandlerId::bound(b, "run").key()
        );
        assert_ne!(
            HandlerId::bound(a, "run").key(),
            HandlerId::bound(a, "stop").key()
        );
    }

    #[test]
    fn test_static_key_uses_type_name() {
        let id = HandlerId::method_of::<Greeter>("greet");
        assert!(id.key().ends_with("Greeter::greet"));
        assert_eq!(
            HandlerId::static_method("Greeter", "greet").key(),
            "Greeter::greet"
        );
    }

    #[test]
    fn test_named_and_static_forms_share_a_key() {
        assert_eq!(
            HandlerId::named("Greeter::greet").key(),
            HandlerId::static_method("Greeter", "greet").key()
        );
    }

    #[test]
    fn test_bound_and_closure_keys_are_distinct() {
        let token = InstanceToken::new();
        assert_ne!(
            HandlerId::bound(token, "").key(),
            HandlerId::Closure(token).key()
        );
        assert_ne!(
            HandlerId::bound(token, "#closure").key(),
            HandlerId::Closure(token).key()
        );
    }

    #[test]
    fn test_closures_never_collide() {
        let a = Callback::closure(|_, _| Value::Null);
        let b = Callback::closure(|_, _| Value::Null);
        assert_ne!(a.id().key(), b.id().key());
        assert_eq!(a.id().key(), a.clone().id().key());
    }
}
