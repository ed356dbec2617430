//! One-shot callbacks.
//!
//! One-shots live beside the subscription list, not inside it: they are not
//! handles, they are never deferred, and the whole list is taken and fired
//! once the outermost raise on a registry has drained its pending mutations.

use std::fmt;

use crate::types::{BareOneShotCallback, OneShotCallback};

/// A single pending one-shot callback.
pub(crate) enum OneShot<E> {
    /// Receives the event that triggers it.
    Payload(OneShotCallback<E>),
    /// Ignores the payload.
    Bare(BareOneShotCallback),
}

impl<E> OneShot<E> {
    fn fire(self, event: &E) {
        match self {
            OneShot::Payload(cb) => cb(event),
            OneShot::Bare(cb) => cb(),
        }
    }
}

/// Ordered list of one-shot callbacks waiting for the next raise.
pub(crate) struct OneShotList<E> {
    entries: Vec<OneShot<E>>,
}

impl<E> OneShotList<E> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, entry: OneShot<E>) {
        self.entries.push(entry);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Detach every queued callback, leaving the list empty for new entries.
    pub(crate) fn take(&mut self) -> Batch<E> {
        Batch {
            entries: std::mem::take(&mut self.entries),
        }
    }
}

impl<E> fmt::Debug for OneShotList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OneShotList")
            .field("len", &self.entries.len())
            .finish()
    }
}

/// One-shots detached from their list, ready to fire.
pub(crate) struct Batch<E> {
    entries: Vec<OneShot<E>>,
}

impl<E> Batch<E> {
    /// Fire every callback in insertion order, consuming them.
    pub(crate) fn fire(self, event: &E) -> usize {
        let count = self.entries.len();
        for entry in self.entries {
            entry.fire(event);
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_take_empties_list() {
        let mut list = OneShotList::<u8>::new();
        list.push(OneShot::Bare(Box::new(|| {})));
        list.push(OneShot::Payload(Box::new(|_: &u8| {})));
        assert_eq!(list.len(), 2);

        let batch = list.take();
        assert_eq!(list.len(), 0);
        assert_eq!(batch.fire(&0), 2);
    }

    #[test]
    fn test_fire_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut list = OneShotList::<u8>::new();

        let o = order.clone();
        list.push(OneShot::Payload(Box::new(move |n: &u8| {
            o.lock().unwrap().push(format!("payload {}", n))
        })));
        let o = order.clone();
        list.push(OneShot::Bare(Box::new(move || {
            o.lock().unwrap().push("bare".to_string())
        })));

        list.take().fire(&9);
        assert_eq!(*order.lock().unwrap(), vec!["payload 9", "bare"]);
    }
}
