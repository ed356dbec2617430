//! Common type definitions and aliases for TypeBus.
//!
//! This module provides type aliases for the callback shapes stored by
//! subscription handles and one-shot lists.

pub mod aliases;

pub use aliases::*;
