//! # TypeBus Core
//!
//! Per-event-type registries, subscription handles and reentrancy-safe
//! synchronous dispatch for TypeBus.

pub mod error;
pub mod registry;
pub mod types;

pub use error::{Error, Result};

pub use registry::{
    init_registries, registries, BareListener, ErasedRegistry, Event, EventHandle,
    EventRegistry, Listener, RegistryConfig, RegistryStats, RegistryTable, SubscriptionId,
};

pub use types::{
    BareCallback, BareOneShotCallback, OneShotCallback, PayloadCallback, SharedRegistry,
};
