//! Subscription handles.
//!
//! An [`EventHandle`] is the user-held side of one registration. It owns the
//! callbacks, knows which registry it belongs to, and exposes the
//! pause/resume/dispose lifecycle. The registry holds the same
//! subscription state through its own `Arc` and keeps the stored index in sync
//! with the subscription's position in the active list.
//!
//! Dropping a handle does not unsubscribe it. Registration ends only through
//! [`EventHandle::pause`] or [`EventHandle::dispose`].

use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use super::event::Event;
use super::listener::{BareListener, Listener};
use super::table::registries;
use crate::types::SharedRegistry;

/// Stored index of a subscription that is not in any active list.
const UNREGISTERED: usize = usize::MAX;

/// Unique identity of a subscription, used in logs and introspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Create a new unique subscription ID
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sub({})", &self.0.to_string()[..8])
    }
}

/// Callback lists, replaced copy-on-write so dispatch can snapshot them.
struct Callbacks<E> {
    payload: Arc<Vec<Listener<E>>>,
    bare: Arc<Vec<BareListener>>,
}

/// Registration state shared between a handle and its registry.
pub(crate) struct Subscription<E> {
    id: SubscriptionId,
    index: AtomicUsize,
    disposed: AtomicBool,
    callbacks: RwLock<Callbacks<E>>,
}

impl<E> Subscription<E> {
    fn new() -> Self {
        Self {
            id: SubscriptionId::new(),
            index: AtomicUsize::new(UNREGISTERED),
            disposed: AtomicBool::new(false),
            callbacks: RwLock::new(Callbacks {
                payload: Arc::new(Vec::new()),
                bare: Arc::new(Vec::new()),
            }),
        }
    }

    /// Unique identity of this subscription.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Position in the owning registry's active list, if registered.
    pub fn index(&self) -> Option<usize> {
        match self.index.load(Ordering::Acquire) {
            UNREGISTERED => None,
            index => Some(index),
        }
    }

    /// Only the registry calls this, while holding its lock.
    pub(crate) fn set_index(&self, index: Option<usize>) {
        self.index
            .store(index.unwrap_or(UNREGISTERED), Ordering::Release);
    }

    pub(crate) fn has_callbacks(&self) -> bool {
        let callbacks = self.callbacks.read();
        !callbacks.payload.is_empty() || !callbacks.bare.is_empty()
    }

    fn listener_count(&self) -> usize {
        let callbacks = self.callbacks.read();
        callbacks.payload.len() + callbacks.bare.len()
    }

    /// Invoke payload callbacks, then payload-less ones.
    ///
    /// The lists are snapshotted first so a callback may edit its own handle.
    pub(crate) fn invoke(&self, event: &E) {
        let (payload, bare) = {
            let callbacks = self.callbacks.read();
            (
                Arc::clone(&callbacks.payload),
                Arc::clone(&callbacks.bare),
            )
        };
        for listener in payload.iter() {
            listener.call(event);
        }
        for listener in bare.iter() {
            listener.call();
        }
    }
}

impl<E> fmt::Debug for Subscription<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("index", &self.index())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// A user-held registration of callbacks for event type `E`.
///
/// Handles are cheap to clone; clones refer to the same registration, which
/// lets a callback capture its own handle (or another one) and pause it.
/// A callback that captures its own handle forms a reference cycle that is
/// broken by [`dispose`](Self::dispose).
pub struct EventHandle<E: Event> {
    subscription: Arc<Subscription<E>>,
    registry: SharedRegistry<E>,
}

impl<E: Event> EventHandle<E> {
    /// Subscribe a payload-accepting callback on the global registry for `E`.
    pub fn subscribe<F>(f: F) -> Self
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        Self::subscribe_in(&registries().registry::<E>(), f)
    }

    /// Subscribe a payload-less callback on the global registry for `E`.
    pub fn subscribe_bare<F>(f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::subscribe_bare_in(&registries().registry::<E>(), f)
    }

    /// Subscribe a payload-accepting callback on an explicit registry.
    pub fn subscribe_in<F>(registry: &SharedRegistry<E>, f: F) -> Self
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let handle = Self::inactive_in(registry);
        handle.add(Listener::new(f));
        handle.resume();
        handle
    }

    /// Subscribe a payload-less callback on an explicit registry.
    pub fn subscribe_bare_in<F>(registry: &SharedRegistry<E>, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let handle = Self::inactive_in(registry);
        handle.add_bare(BareListener::new(f));
        handle.resume();
        handle
    }

    /// Create an unregistered handle with no callbacks.
    ///
    /// Useful when a callback needs to capture its own handle: attach the
    /// callbacks with [`add`](Self::add), then call [`resume`](Self::resume).
    pub fn inactive_in(registry: &SharedRegistry<E>) -> Self {
        Self {
            subscription: Arc::new(Subscription::new()),
            registry: Arc::clone(registry),
        }
    }

    /// Attach another payload-accepting callback without re-registering.
    pub fn add(&self, listener: Listener<E>) {
        if self.is_disposed() {
            tracing::debug!("Ignoring add on disposed {}", self.id());
            return;
        }
        let mut callbacks = self.subscription.callbacks.write();
        Arc::make_mut(&mut callbacks.payload).push(listener);
    }

    /// Detach the first matching payload-accepting callback.
    ///
    /// Returns true if a callback was removed.
    pub fn remove(&self, listener: &Listener<E>) -> bool {
        let mut callbacks = self.subscription.callbacks.write();
        let list = Arc::make_mut(&mut callbacks.payload);
        match list.iter().position(|l| l == listener) {
            Some(pos) => {
                list.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Attach another payload-less callback without re-registering.
    pub fn add_bare(&self, listener: BareListener) {
        if self.is_disposed() {
            tracing::debug!("Ignoring add on disposed {}", self.id());
            return;
        }
        let mut callbacks = self.subscription.callbacks.write();
        Arc::make_mut(&mut callbacks.bare).push(listener);
    }

    /// Detach the first matching payload-less callback.
    pub fn remove_bare(&self, listener: &BareListener) -> bool {
        let mut callbacks = self.subscription.callbacks.write();
        let list = Arc::make_mut(&mut callbacks.bare);
        match list.iter().position(|l| l == listener) {
            Some(pos) => {
                list.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Remove this handle from its registry, keeping its callbacks.
    ///
    /// Idempotent. During a dispatch the removal takes effect once the
    /// outermost raise completes.
    pub fn pause(&self) {
        self.registry.unregister(&self.subscription);
    }

    /// Register this handle with its registry.
    ///
    /// Idempotent. A handle without callbacks, including a disposed one, is
    /// never registered.
    pub fn resume(&self) {
        if self.is_disposed() || !self.subscription.has_callbacks() {
            tracing::trace!("Not registering {} without callbacks", self.id());
            return;
        }
        self.registry.register(&self.subscription);
    }

    /// Pause and release every callback. Terminal.
    pub fn dispose(&self) {
        self.pause();
        self.subscription.disposed.store(true, Ordering::Release);
        let mut callbacks = self.subscription.callbacks.write();
        callbacks.payload = Arc::new(Vec::new());
        callbacks.bare = Arc::new(Vec::new());
        tracing::debug!("Subscription {} disposed", self.id());
    }

    /// True while the handle holds a slot in the registry's active list.
    pub fn is_active(&self) -> bool {
        self.subscription.index().is_some()
    }

    /// True once [`dispose`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.subscription.disposed.load(Ordering::Acquire)
    }

    /// Position in the registry's active list, if registered.
    pub fn index(&self) -> Option<usize> {
        self.subscription.index()
    }

    /// Unique identity of this registration.
    pub fn id(&self) -> SubscriptionId {
        self.subscription.id()
    }

    /// Total number of attached callbacks of both shapes.
    pub fn listener_count(&self) -> usize {
        self.subscription.listener_count()
    }

    /// The registry this handle registers with.
    pub fn registry(&self) -> &SharedRegistry<E> {
        &self.registry
    }
}

impl<E: Event> Clone for EventHandle<E> {
    fn clone(&self) -> Self {
        Self {
            subscription: Arc::clone(&self.subscription),
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<E: Event> fmt::Debug for EventHandle<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandle")
            .field("event", &E::event_name())
            .field("subscription", &self.subscription)
            .finish()
    }
}
