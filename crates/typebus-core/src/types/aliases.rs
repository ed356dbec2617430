//! Type aliases for the callback shapes used throughout the registry.
//!
//! Subscription callbacks are shared (`Arc`) because dispatch snapshots a
//! handle's callback list and invokes it without holding any lock, while the
//! handle may concurrently be edited with `add`/`remove`. One-shot callbacks
//! run at most once, so they are boxed `FnOnce`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use typebus_core::types::*;
//!
//! let cb: PayloadCallback<Ping> = Arc::new(|ping: &Ping| println!("{}", ping.count));
//! let tick: BareCallback = Arc::new(|| println!("tick"));
//! ```

use std::sync::Arc;

use crate::registry::EventRegistry;

// =============================================================================
// SUBSCRIPTION CALLBACKS
// =============================================================================

/// A callback that receives the raised event by reference.
///
/// Thread-safe, may be invoked from whichever thread raises the event.
pub type PayloadCallback<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// A callback that ignores the event payload.
pub type BareCallback = Arc<dyn Fn() + Send + Sync>;

// =============================================================================
// ONE-SHOT CALLBACKS
// =============================================================================

/// A one-shot callback that receives the raised event.
pub type OneShotCallback<E> = Box<dyn FnOnce(&E) + Send>;

/// A one-shot callback that ignores the event payload.
pub type BareOneShotCallback = Box<dyn FnOnce() + Send>;

// =============================================================================
// REGISTRY TYPES
// =============================================================================

/// A registry shared between the table, handles and callers.
pub type SharedRegistry<E> = Arc<EventRegistry<E>>;
