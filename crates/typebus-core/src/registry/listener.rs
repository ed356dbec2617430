//! Listener wrappers for subscription handles.
//!
//! A handle may carry several callbacks of each shape. `remove` needs to find
//! "the same" callback it was given by `add`, and closures have no equality,
//! so each callback is wrapped in an `Arc` and compared by pointer identity.

use std::fmt;
use std::sync::Arc;

use crate::types::{BareCallback, PayloadCallback};

/// A payload-accepting callback attached to a handle.
pub struct Listener<E> {
    callback: PayloadCallback<E>,
}

impl<E> Listener<E> {
    /// Wrap a closure that receives the raised event.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(f),
        }
    }

    pub(crate) fn call(&self, event: &E) {
        (self.callback)(event)
    }
}

impl<E> Clone for Listener<E> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<E> PartialEq for Listener<E> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.callback, &other.callback)
    }
}

impl<E> Eq for Listener<E> {}

impl<E> fmt::Debug for Listener<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Arc::as_ptr(&self.callback))
    }
}

/// A payload-less callback attached to a handle.
#[derive(Clone)]
pub struct BareListener {
    callback: BareCallback,
}

impl BareListener {
    /// Wrap a closure that ignores the event payload.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(f),
        }
    }

    pub(crate) fn call(&self) {
        (self.callback)()
    }
}

impl PartialEq for BareListener {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.callback, &other.callback)
    }
}

impl Eq for BareListener {}

impl fmt::Debug for BareListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BareListener({:p})", Arc::as_ptr(&self.callback))
    }
}
