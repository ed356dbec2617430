//! Process-wide registry table.
//!
//! Maps each event type to exactly one [`EventRegistry`], created lazily on
//! first use. Alongside the typed registry every entry keeps a type-erased
//! [`ErasedRegistry`] so hosts can raise a payload whose concrete type is
//! only known at runtime, and reset every registry at a lifecycle boundary.

use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use super::config::RegistryConfig;
use super::event::Event;
use super::registry::{EventRegistry, RegistryStats};
use crate::error::{Error, Result};
use crate::types::SharedRegistry;

/// Type-erased view of one registry.
pub trait ErasedRegistry: Send + Sync {
    /// Name of the event type the registry dispatches.
    fn event_name(&self) -> &'static str;

    /// Raise `payload` if it is of the registry's event type.
    fn raise_any(&self, payload: &dyn Any) -> Result<()>;

    /// Snapshot of the registry's counters.
    fn stats(&self) -> RegistryStats;

    /// Drop every subscription and one-shot.
    fn reset(&self);
}

impl<E: Event> ErasedRegistry for EventRegistry<E> {
    fn event_name(&self) -> &'static str {
        E::event_name()
    }

    fn raise_any(&self, payload: &dyn Any) -> Result<()> {
        match payload.downcast_ref::<E>() {
            Some(event) => {
                self.raise(event);
                Ok(())
            }
            None => Err(Error::PayloadTypeMismatch {
                expected: E::event_name(),
                found: format!("{:?}", payload.type_id()),
            }),
        }
    }

    fn stats(&self) -> RegistryStats {
        EventRegistry::stats(self)
    }

    fn reset(&self) {
        EventRegistry::reset(self)
    }
}

struct RegistryEntry {
    typed: Arc<dyn Any + Send + Sync>,
    erased: Arc<dyn ErasedRegistry>,
}

impl RegistryEntry {
    fn new<E: Event>(registry: SharedRegistry<E>) -> Self {
        Self {
            typed: registry.clone(),
            erased: registry,
        }
    }
}

/// One registry per event type, keyed by `TypeId`.
pub struct RegistryTable {
    entries: RwLock<HashMap<TypeId, RegistryEntry>>,
    config: RegistryConfig,
}

impl RegistryTable {
    /// Create an empty table with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty table whose registries use `config`
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Get the registry for `E`, creating it on first access.
    pub fn registry<E: Event>(&self) -> SharedRegistry<E> {
        if let Some(registry) = Self::lookup::<E>(&self.entries.read()) {
            return registry;
        }

        let mut entries = self.entries.write();
        if let Some(registry) = Self::lookup::<E>(&entries) {
            return registry;
        }
        tracing::debug!("Creating registry for {}", E::event_name());
        let registry = Arc::new(EventRegistry::<E>::with_config(self.config.clone()));
        entries.insert(TypeId::of::<E>(), RegistryEntry::new(Arc::clone(&registry)));
        registry
    }

    fn lookup<E: Event>(entries: &HashMap<TypeId, RegistryEntry>) -> Option<SharedRegistry<E>> {
        entries
            .get(&TypeId::of::<E>())
            .and_then(|entry| Arc::clone(&entry.typed).downcast::<EventRegistry<E>>().ok())
    }

    /// True if a registry for `E` has been created.
    pub fn contains<E: Event>(&self) -> bool {
        self.entries.read().contains_key(&TypeId::of::<E>())
    }

    /// Raise `event` on the registry for its type.
    pub fn raise<E: Event>(&self, event: &E) {
        self.registry::<E>().raise(event);
    }

    /// Raise a payload whose concrete type is only known at runtime.
    ///
    /// Fails if no registry exists yet for the payload's type.
    pub fn raise_dyn(&self, payload: &dyn Any) -> Result<()> {
        let key = payload.type_id();
        let registry = self
            .entries
            .read()
            .get(&key)
            .map(|entry| Arc::clone(&entry.erased));
        match registry {
            Some(registry) => registry.raise_any(payload),
            None => Err(Error::UnknownEventType {
                type_id: format!("{:?}", key),
            }),
        }
    }

    /// Reset every registry. Host lifecycle hook; never call mid-dispatch.
    pub fn reset_all(&self) {
        let registries: Vec<_> = self
            .entries
            .read()
            .values()
            .map(|entry| Arc::clone(&entry.erased))
            .collect();
        for registry in &registries {
            registry.reset();
        }
        tracing::info!("Reset {} registries", registries.len());
    }

    /// Stats for every registry, sorted by event name.
    pub fn describe_all(&self) -> Vec<RegistryStats> {
        let registries: Vec<_> = self
            .entries
            .read()
            .values()
            .map(|entry| Arc::clone(&entry.erased))
            .collect();
        let mut stats: Vec<_> = registries.iter().map(|r| r.stats()).collect();
        stats.sort_by(|a, b| a.event.cmp(b.event));
        stats
    }

    /// Number of registries created so far.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True if no registry has been created.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the current configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}

impl Default for RegistryTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RegistryTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryTable")
            .field("registries", &self.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Global registry table
static REGISTRIES: OnceLock<RegistryTable> = OnceLock::new();

/// Get or initialize the global registry table
///
/// This is the single access point for process-wide registries.
pub fn registries() -> &'static RegistryTable {
    REGISTRIES.get_or_init(RegistryTable::new)
}

/// Initialize the global registry table with custom configuration
///
/// Must be called before any calls to `registries()`. Returns the rejected
/// configuration if the table has already been initialized.
pub fn init_registries(config: RegistryConfig) -> std::result::Result<(), RegistryConfig> {
    REGISTRIES
        .set(RegistryTable::with_config(config))
        .map_err(|table| table.config)
}
