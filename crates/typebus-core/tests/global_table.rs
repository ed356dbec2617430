use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use typebus_core::{registries, EventHandle};

#[derive(Debug, Default)]
struct GlobalPing {
    count: usize,
}

#[derive(Debug, Default)]
struct GlobalReset;

#[test]
fn test_macros_use_global_table() {
    let total = Arc::new(AtomicUsize::new(0));
    let t = total.clone();
    let handle = typebus_core::subscribe!(move |ping: &GlobalPing| {
        t.fetch_add(ping.count, Ordering::SeqCst);
    });

    typebus_core::raise!(GlobalPing { count: 2 });
    registries().raise(&GlobalPing { count: 3 });
    assert_eq!(total.load(Ordering::SeqCst), 5);
    assert!(registries().contains::<GlobalPing>());

    handle.dispose();
    typebus_core::raise!(GlobalPing { count: 100 });
    assert_eq!(total.load(Ordering::SeqCst), 5);
}

#[test]
fn test_global_raise_dyn() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = calls.clone();
    let handle = EventHandle::<GlobalReset>::subscribe_bare(move || {
        c.fetch_add(1, Ordering::SeqCst);
    });

    registries()
        .raise_dyn(&GlobalReset)
        .expect("registry exists after subscribe");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    registries().registry::<GlobalReset>().reset();
    assert!(!handle.is_active());
}
