//! Registry configuration.

use serde::{Deserialize, Serialize};

/// Configuration shared by every registry a [`RegistryTable`] creates.
///
/// [`RegistryTable`]: super::RegistryTable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Number of subscription slots pre-allocated per registry.
    pub initial_capacity: usize,
    /// Nesting depth at which a warning is logged. Dispatch is unaffected.
    pub depth_warning: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 4,
            depth_warning: 32,
        }
    }
}
