//! # Event Registry Module
//!
//! Typed, in-process publish/subscribe. Producers raise a value of some event
//! type `E`; every [`EventHandle`] registered with the [`EventRegistry`] for
//! `E` is invoked synchronously, followed by any one-shot callbacks.
//!
//! ## Overview
//!
//! - One registry per event type, held by a [`RegistryTable`] and created on
//!   first use
//! - Subscribe/unsubscribe are O(1) (append and swap-removal)
//! - Listeners may subscribe, unsubscribe and raise again while a dispatch
//!   is running; structural changes are deferred until the outermost raise
//!   on that registry returns
//! - A panicking listener propagates to the caller without leaving the
//!   registry stuck in its dispatching state
//!
//! ## Usage
//!
//! ```rust,ignore
//! use typebus_core::registry::{registries, EventHandle};
//!
//! #[derive(Debug, Default)]
//! struct Ping { count: i32 }
//!
//! let handle = EventHandle::subscribe(|ping: &Ping| {
//!     println!("ping {}", ping.count);
//! });
//!
//! registries().raise(&Ping { count: 5 });
//!
//! handle.dispose();
//! ```

mod config;
mod event;
mod handle;
mod listener;
mod one_shot;
#[allow(clippy::module_inception)]
mod registry;
mod table;

pub use config::RegistryConfig;
pub use event::Event;
pub use handle::{EventHandle, SubscriptionId};
pub use listener::{BareListener, Listener};
pub use registry::{EventRegistry, RegistryStats};
pub use table::{init_registries, registries, ErasedRegistry, RegistryTable};

/// Convenience macro to raise an event on the global registry table
#[macro_export]
macro_rules! raise {
    ($event:expr) => {
        $crate::registry::registries().raise(&$event)
    };
}

/// Convenience macro to subscribe a callback on the global registry table
#[macro_export]
macro_rules! subscribe {
    ($handler:expr) => {
        $crate::registry::EventHandle::subscribe($handler)
    };
}
