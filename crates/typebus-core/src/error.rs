//! Error handling for TypeBus
//!
//! Registry and handle operations are infallible: stale indices, repeated
//! pause/resume and absent listeners are tolerated silently. Errors only
//! arise at the type-erased boundary, where a payload whose concrete type is
//! known only at runtime has to be matched to its registry.
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for TypeBus
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No registry has been created for the payload's concrete type
    #[error("No registry for event type {type_id}")]
    UnknownEventType {
        /// `TypeId` debug string of the payload that could not be resolved.
        type_id: String,
    },

    /// A type-erased raise was handed a payload of the wrong type
    #[error("Payload type mismatch: registry expects {expected}, got {found}")]
    PayloadTypeMismatch {
        /// Event type the registry dispatches.
        expected: &'static str,
        /// `TypeId` debug string of the payload that was supplied.
        found: String,
    },
}

impl Error {
    /// Check if this is an unknown event type error
    pub fn is_unknown_event_type(&self) -> bool {
        matches!(self, Error::UnknownEventType { .. })
    }

    /// Check if this is a payload mismatch error
    pub fn is_payload_mismatch(&self) -> bool {
        matches!(self, Error::PayloadTypeMismatch { .. })
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
