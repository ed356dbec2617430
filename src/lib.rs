//! # TypeBus
//!
//! A typed, in-process publish/subscribe registry:
//! - One registry per event type, created lazily on first use
//! - O(1) subscribe/unsubscribe through swap-removal
//! - Listeners may subscribe, unsubscribe and raise again mid-dispatch
//! - One-shot callbacks that fire on the next raise only
//!
//! ## Architecture
//!
//! TypeBus is organized as a workspace:
//!
//! 1. **typebus-core** - Registries, subscription handles, dispatch, errors
//! 2. **typebus** - Re-exports, logging setup and the demo binary

pub use typebus_core::registry;
pub use typebus_core::types;

pub use typebus_core::{
    init_registries, registries, BareListener, ErasedRegistry, Error, Event, EventHandle,
    EventRegistry, Listener, RegistryConfig, RegistryStats, RegistryTable, Result,
    SharedRegistry, SubscriptionId,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
/// - INFO as the default level
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing::Level::INFO.to_string()));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
