//! Event type identity.

use std::any::Any;

/// Marker for values that can be raised through an [`EventRegistry`].
///
/// Every `'static` type that is `Send + Sync` is an event; the concrete Rust
/// type is the tag, so two distinct types never share a registry.
///
/// [`EventRegistry`]: super::EventRegistry
pub trait Event: Any + Send + Sync {
    /// Human-readable name used in logs and `describe()` output.
    fn event_name() -> &'static str
    where
        Self: Sized,
    {
        std::any::type_name::<Self>()
    }
}

impl<T: Any + Send + Sync> Event for T {}
