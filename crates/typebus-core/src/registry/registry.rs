//! Per-event-type registry.
//!
//! Holds the active subscriptions for one event type and owns dispatch.
//! Structural changes requested while a dispatch is running are queued and
//! applied, in request order, when the outermost raise on this registry
//! returns. A listener therefore never changes who receives the event
//! currently being raised; its subscribe/unsubscribe is visible from the
//! next raise on.

use parking_lot::ReentrantMutex;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use super::config::RegistryConfig;
use super::event::Event;
use super::handle::{Subscription, SubscriptionId};
use super::one_shot::{OneShot, OneShotList};

/// A structural change queued while a dispatch is in progress.
enum Mutation<E> {
    Register(Arc<Subscription<E>>),
    Unregister(Arc<Subscription<E>>),
}

struct RegistryState<E> {
    active: Vec<Arc<Subscription<E>>>,
    pending: VecDeque<Mutation<E>>,
    depth: usize,
    one_shot: OneShotList<E>,
}

impl<E: Event> RegistryState<E> {
    fn insert(&mut self, subscription: &Arc<Subscription<E>>) {
        if subscription.index().is_some() {
            return;
        }
        let index = self.active.len();
        self.active.push(Arc::clone(subscription));
        subscription.set_index(Some(index));
        tracing::debug!(
            "Subscription {} registered for {} at {}",
            subscription.id(),
            E::event_name(),
            index
        );
    }

    fn remove(&mut self, subscription: &Arc<Subscription<E>>) {
        let Some(index) = self.slot_of(subscription) else {
            return;
        };
        let removed = self.active.swap_remove(index);
        if let Some(moved) = self.active.get(index) {
            moved.set_index(Some(index));
        }
        removed.set_index(None);
        tracing::debug!(
            "Subscription {} unregistered from {}",
            removed.id(),
            E::event_name()
        );
    }

    /// The subscription's slot, if its stored index still points at it.
    fn slot_of(&self, subscription: &Arc<Subscription<E>>) -> Option<usize> {
        let index = subscription.index()?;
        self.active
            .get(index)
            .filter(|held| Arc::ptr_eq(held, subscription))
            .map(|_| index)
    }

    fn drain(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        tracing::trace!(
            "Applying {} deferred mutations for {}",
            self.pending.len(),
            E::event_name()
        );
        while let Some(mutation) = self.pending.pop_front() {
            match mutation {
                Mutation::Register(subscription) => self.insert(&subscription),
                Mutation::Unregister(subscription) => self.remove(&subscription),
            }
        }
    }
}

/// Point-in-time summary of a registry, as returned by `describe()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    /// Event type name.
    pub event: &'static str,
    /// Number of registered subscriptions.
    pub active: usize,
    /// Allocated slots in the active list.
    pub capacity: usize,
    /// Queued one-shot callbacks.
    pub one_shots: usize,
    /// Deferred register/unregister requests.
    pub pending: usize,
    /// Nesting depth of in-progress dispatches.
    pub depth: usize,
}

impl fmt::Display for RegistryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} active (capacity {}), {} one-shot, {} pending, depth {}",
            self.event, self.active, self.capacity, self.one_shots, self.pending, self.depth
        )
    }
}

/// Active subscriptions and dispatch for one event type.
///
/// All operations on one registry are serialized by a reentrant mutex: other
/// threads wait, while the dispatching thread may re-enter from a listener
/// (nested `raise`, `register`, `unregister`, `add_one_shot`, `describe`).
pub struct EventRegistry<E: Event> {
    state: ReentrantMutex<RefCell<RegistryState<E>>>,
    config: RegistryConfig,
}

/// Restores depth on every exit from `raise`, including unwinding.
struct DepthGuard<'a, E: Event> {
    state: &'a RefCell<RegistryState<E>>,
}

impl<E: Event> Drop for DepthGuard<'_, E> {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.depth = state.depth.saturating_sub(1);
        if state.depth == 0 {
            state.drain();
        }
    }
}

impl<E: Event> EventRegistry<E> {
    /// Create a registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            state: ReentrantMutex::new(RefCell::new(RegistryState {
                active: Vec::with_capacity(config.initial_capacity),
                pending: VecDeque::new(),
                depth: 0,
                one_shot: OneShotList::new(),
            })),
            config,
        }
    }

    /// Append a subscription to the active list.
    ///
    /// No-op if it is already registered. During a dispatch the request is
    /// queued unconditionally and the "already registered" check runs when
    /// the queue drains, so `pause(); resume();` inside a listener ends
    /// registered and `resume(); pause();` ends unregistered.
    pub(crate) fn register(&self, subscription: &Arc<Subscription<E>>) {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        if state.depth > 0 {
            tracing::trace!(
                "Deferring register of {} on {}",
                subscription.id(),
                E::event_name()
            );
            state
                .pending
                .push_back(Mutation::Register(Arc::clone(subscription)));
            return;
        }
        state.insert(subscription);
    }

    /// Swap-remove a subscription from the active list.
    ///
    /// A stale or missing index is treated as already unregistered. During a
    /// dispatch the request is queued unconditionally and the stale-index
    /// check runs when the queue drains, against the state left by the
    /// mutations queued before it.
    pub(crate) fn unregister(&self, subscription: &Arc<Subscription<E>>) {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        if state.depth > 0 {
            tracing::trace!(
                "Deferring unregister of {} on {}",
                subscription.id(),
                E::event_name()
            );
            state
                .pending
                .push_back(Mutation::Unregister(Arc::clone(subscription)));
            return;
        }
        state.remove(subscription);
    }

    /// Invoke every registered subscription with `event`, then the one-shots.
    ///
    /// The set of receivers is fixed when the raise starts. A panicking
    /// listener stops the pass and propagates to the caller; depth and the
    /// deferred mutation queue are still restored.
    pub fn raise(&self, event: &E) {
        let guard = self.state.lock();
        let cell: &RefCell<RegistryState<E>> = &guard;

        let (count, outermost) = {
            let mut state = cell.borrow_mut();
            state.depth += 1;
            if state.depth == self.config.depth_warning {
                tracing::warn!(
                    "Dispatch of {} nested {} deep",
                    E::event_name(),
                    state.depth
                );
            }
            (state.active.len(), state.depth == 1)
        };
        tracing::trace!("Raising {} to {} subscriptions", E::event_name(), count);

        let depth_guard = DepthGuard { state: cell };
        for position in 0..count {
            // Only a host reset during dispatch can shrink the list.
            let Some(subscription) = cell.borrow().active.get(position).cloned() else {
                break;
            };
            subscription.invoke(event);
        }
        drop(depth_guard);

        if outermost {
            let batch = cell.borrow_mut().one_shot.take();
            let fired = batch.fire(event);
            if fired > 0 {
                tracing::trace!("Fired {} one-shots for {}", fired, E::event_name());
            }
        }
    }

    /// Raise a default-constructed event.
    pub fn raise_default(&self)
    where
        E: Default,
    {
        self.raise(&E::default());
    }

    /// Queue a callback for the next raise only.
    pub fn add_one_shot<F>(&self, f: F)
    where
        F: FnOnce(&E) + Send + 'static,
    {
        let guard = self.state.lock();
        guard.borrow_mut().one_shot.push(OneShot::Payload(Box::new(f)));
    }

    /// Queue a payload-less callback for the next raise only.
    pub fn add_one_shot_bare<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let guard = self.state.lock();
        guard.borrow_mut().one_shot.push(OneShot::Bare(Box::new(f)));
    }

    /// Snapshot of the registry's current counters.
    pub fn stats(&self) -> RegistryStats {
        let guard = self.state.lock();
        let state = guard.borrow();
        RegistryStats {
            event: E::event_name(),
            active: state.active.len(),
            capacity: state.active.capacity(),
            one_shots: state.one_shot.len(),
            pending: state.pending.len(),
            depth: state.depth,
        }
    }

    /// Human-readable summary of the registry.
    pub fn describe(&self) -> String {
        self.stats().to_string()
    }

    /// Drop every subscription, one-shot and queued mutation.
    ///
    /// Meant for lifecycle boundaries where no dispatch is in flight.
    pub fn reset(&self) {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        if state.depth > 0 {
            tracing::warn!("Resetting {} during dispatch", E::event_name());
        }
        for subscription in state.active.drain(..) {
            subscription.set_index(None);
        }
        state.one_shot.clear();
        state.pending.clear();
        tracing::info!("Registry for {} reset", E::event_name());
    }

    /// Number of registered subscriptions.
    pub fn len(&self) -> usize {
        self.state.lock().borrow().active.len()
    }

    /// True if no subscription is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current dispatch nesting depth; 0 when idle.
    pub fn depth(&self) -> usize {
        self.state.lock().borrow().depth
    }

    /// Ids of registered subscriptions in dispatch order.
    pub fn active_ids(&self) -> Vec<SubscriptionId> {
        self.state
            .lock()
            .borrow()
            .active
            .iter()
            .map(|s| s.id())
            .collect()
    }

    /// Get the current configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}

impl<E: Event> Default for EventRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> fmt::Debug for EventRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("stats", &self.stats())
            .field("config", &self.config)
            .finish()
    }
}
