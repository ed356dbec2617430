use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use typebus_core::{EventHandle, EventRegistry, Listener, SharedRegistry};

#[derive(Debug, Default, Clone)]
struct Ping {
    count: i32,
}

#[derive(Debug, Default, Clone)]
struct Pong;

fn registry<E: typebus_core::Event>() -> SharedRegistry<E> {
    Arc::new(EventRegistry::new())
}

#[test]
fn test_nested_raise_sees_same_subscriptions() {
    let reg = registry::<Ping>();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let r = reg.clone();
    let s = seen.clone();
    let _h1 = EventHandle::subscribe_in(&reg, move |ping: &Ping| {
        s.lock().unwrap().push(("h1", ping.count, r.depth()));
        if ping.count == 0 {
            r.raise(&Ping { count: 1 });
        }
    });
    let s = seen.clone();
    let _h2 = EventHandle::subscribe_in(&reg, move |ping: &Ping| {
        s.lock().unwrap().push(("h2", ping.count, 0));
    });

    reg.raise(&Ping { count: 0 });

    assert_eq!(
        *seen.lock().unwrap(),
        vec![("h1", 0, 1), ("h1", 1, 2), ("h2", 1, 0), ("h2", 0, 0)]
    );
    assert_eq!(reg.depth(), 0);
}

#[test]
fn test_mutations_wait_for_outermost_raise_in_request_order() {
    let reg = registry::<Ping>();
    let h1 = EventHandle::subscribe_bare_in(&reg, || {});
    let h2 = EventHandle::subscribe_bare_in(&reg, || {});
    let h3 = EventHandle::subscribe_bare_in(&reg, || {});
    let h4 = EventHandle::inactive_in(&reg);
    h4.add_bare(typebus_core::BareListener::new(|| {}));

    let observed_inner = Arc::new(Mutex::new(None));

    let driver = EventHandle::inactive_in(&reg);
    {
        let r = reg.clone();
        let (h1, h4) = (h1.clone(), h4.clone());
        let observed = observed_inner.clone();
        driver.add(Listener::new(move |ping: &Ping| match ping.count {
            0 => {
                r.raise(&Ping { count: 1 });
                // Inner raise returned, but this registry is still dispatching.
                *observed.lock().unwrap() = Some((r.stats().pending, h1.is_active()));
            }
            1 => {
                h1.pause();
                h4.resume();
            }
            _ => {}
        }));
    }
    driver.resume();

    reg.raise(&Ping { count: 0 });

    assert_eq!(*observed_inner.lock().unwrap(), Some((2, true)));
    // h1 is swap-removed (driver takes its slot), then h4 is appended.
    assert!(!h1.is_active());
    assert_eq!(
        reg.active_ids(),
        vec![driver.id(), h2.id(), h3.id(), h4.id()]
    );
}

#[test]
fn test_fifo_drain_order_is_observable() {
    let reg = registry::<Ping>();
    let h1 = EventHandle::subscribe_bare_in(&reg, || {});
    let h2 = EventHandle::subscribe_bare_in(&reg, || {});
    let h4 = EventHandle::inactive_in(&reg);
    h4.add_bare(typebus_core::BareListener::new(|| {}));

    let (a, b) = (h1.clone(), h4.clone());
    let trigger = EventHandle::subscribe_bare_in(&reg, move || {
        a.pause();
        b.resume();
    });

    // active: [h1, h2, trigger]
    reg.raise(&Ping::default());

    // Applied in request order: h1 is swap-removed (trigger takes slot 0),
    // then h4 is appended. Reverse order would leave h4 in slot 0.
    assert_eq!(reg.active_ids(), vec![trigger.id(), h2.id(), h4.id()]);
    assert_eq!(trigger.index(), Some(0));
    assert_eq!(h4.index(), Some(2));
}

/// Registers a driver at slot 0 that runs `during` on every raise, followed
/// by `target`, `h2` and `h3` in slots 1..=3.
fn lifecycle_fixture<F>(
    during: F,
) -> (
    SharedRegistry<Ping>,
    EventHandle<Ping>,
    EventHandle<Ping>,
    EventHandle<Ping>,
    EventHandle<Ping>,
)
where
    F: Fn(&EventHandle<Ping>) + Send + Sync + 'static,
{
    let reg = registry::<Ping>();
    let target = EventHandle::inactive_in(&reg);
    target.add_bare(typebus_core::BareListener::new(|| {}));

    let t = target.clone();
    let driver = EventHandle::subscribe_bare_in(&reg, move || during(&t));
    target.resume();
    let h2 = EventHandle::subscribe_bare_in(&reg, || {});
    let h3 = EventHandle::subscribe_bare_in(&reg, || {});
    assert_eq!(target.index(), Some(1));
    (reg, driver, target, h2, h3)
}

#[test]
fn test_double_pause_inside_listener_removes_once() {
    let (reg, driver, target, h2, h3) = lifecycle_fixture(|t| {
        t.pause();
        t.pause();
    });

    reg.raise(&Ping::default());

    // One swap-removal: h3 takes slot 1, nothing else moves.
    assert_eq!(reg.len(), 3);
    assert_eq!(target.index(), None);
    assert_eq!(driver.index(), Some(0));
    assert_eq!(h3.index(), Some(1));
    assert_eq!(h2.index(), Some(2));
    assert_eq!(reg.active_ids(), vec![driver.id(), h3.id(), h2.id()]);
    assert_eq!(reg.stats().pending, 0);
}

#[test]
fn test_double_resume_inside_listener_registers_once() {
    let reg = registry::<Ping>();
    let fresh = EventHandle::inactive_in(&reg);
    fresh.add_bare(typebus_core::BareListener::new(|| {}));

    let f = fresh.clone();
    let _driver = EventHandle::subscribe_bare_in(&reg, move || {
        f.resume();
        f.resume();
    });

    reg.raise(&Ping::default());
    assert_eq!(reg.len(), 2);
    assert_eq!(fresh.index(), Some(1));

    // Already active: the queued requests are skipped when applied.
    reg.raise(&Ping::default());
    assert_eq!(reg.len(), 2);
    assert_eq!(fresh.index(), Some(1));
}

#[test]
fn test_pause_then_resume_inside_listener_stays_registered() {
    let (reg, driver, target, h2, h3) = lifecycle_fixture(|t| {
        t.pause();
        t.resume();
    });

    reg.raise(&Ping::default());

    // Removed (h3 fills slot 1), then appended again at the end.
    assert!(target.is_active());
    assert_eq!(reg.len(), 4);
    assert_eq!(
        reg.active_ids(),
        vec![driver.id(), h3.id(), h2.id(), target.id()]
    );
    assert_eq!(target.index(), Some(3));
}

#[test]
fn test_resume_then_pause_inside_listener_stays_unregistered() {
    let reg = registry::<Ping>();
    let calls = Arc::new(AtomicUsize::new(0));
    let fresh = EventHandle::inactive_in(&reg);
    let c = calls.clone();
    fresh.add_bare(typebus_core::BareListener::new(move || {
        c.fetch_add(1, Ordering::SeqCst);
    }));

    let f = fresh.clone();
    let driver = EventHandle::subscribe_bare_in(&reg, move || {
        f.resume();
        f.pause();
    });

    reg.raise(&Ping::default());
    assert!(!fresh.is_active());
    assert_eq!(reg.active_ids(), vec![driver.id()]);

    reg.raise(&Ping::default());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!fresh.is_active());
}

#[test]
fn test_cross_registry_nested_raise_defers_on_both() {
    let pings = registry::<Ping>();
    let pongs = registry::<Pong>();

    let victim = EventHandle::subscribe_bare_in(&pings, || {});
    let pong_calls = Arc::new(AtomicUsize::new(0));

    let v = victim.clone();
    let p = pings.clone();
    let c = pong_calls.clone();
    let _pong_listener = EventHandle::subscribe_in(&pongs, move |_: &Pong| {
        c.fetch_add(1, Ordering::SeqCst);
        v.pause();
        assert_eq!(p.stats().pending, 1);
    });

    let q = pongs.clone();
    let _ping_listener = EventHandle::subscribe_in(&pings, move |_: &Ping| {
        q.raise(&Pong);
    });

    pings.raise(&Ping::default());
    assert_eq!(pong_calls.load(Ordering::SeqCst), 1);
    assert!(!victim.is_active());
    assert_eq!(pings.stats().pending, 0);
}

#[test]
fn test_one_shot_fires_once_per_outermost_raise() {
    let reg = registry::<Ping>();
    let fired = Arc::new(Mutex::new(Vec::new()));

    let r = reg.clone();
    let f = fired.clone();
    let _h = EventHandle::subscribe_in(&reg, move |ping: &Ping| {
        if ping.count < 3 {
            let f = f.clone();
            r.add_one_shot(move |p: &Ping| f.lock().unwrap().push(p.count));
            r.raise(&Ping {
                count: ping.count + 1,
            });
        }
    });

    reg.raise(&Ping { count: 0 });

    // All three one-shots fire once, with the outermost payload.
    assert_eq!(*fired.lock().unwrap(), vec![0, 0, 0]);
    assert_eq!(reg.stats().one_shots, 0);
}

#[test]
fn test_panicking_listener_restores_registry() {
    let reg = registry::<Ping>();
    let after_calls = Arc::new(AtomicUsize::new(0));
    let late = EventHandle::inactive_in(&reg);
    late.add_bare(typebus_core::BareListener::new(|| {}));

    let l = late.clone();
    let _first = EventHandle::subscribe_in(&reg, move |_: &Ping| l.resume());
    let _bomb = EventHandle::subscribe_in(&reg, |ping: &Ping| {
        if ping.count == 13 {
            panic!("listener failure");
        }
    });
    let a = after_calls.clone();
    let _after = EventHandle::subscribe_bare_in(&reg, move || {
        a.fetch_add(1, Ordering::SeqCst);
    });
    let one_shot_fired = Arc::new(AtomicBool::new(false));
    let o = one_shot_fired.clone();
    reg.add_one_shot_bare(move || o.store(true, Ordering::SeqCst));

    let result = panic::catch_unwind(AssertUnwindSafe(|| reg.raise(&Ping { count: 13 })));
    assert!(result.is_err());

    // Fail-fast: listeners after the panic are skipped.
    assert_eq!(after_calls.load(Ordering::SeqCst), 0);
    // Cleanup still ran: depth restored and deferred register applied.
    assert_eq!(reg.depth(), 0);
    assert_eq!(reg.stats().pending, 0);
    assert!(late.is_active());
    // One-shots wait for the next successful raise.
    assert!(!one_shot_fired.load(Ordering::SeqCst));

    reg.raise(&Ping { count: 1 });
    assert_eq!(after_calls.load(Ordering::SeqCst), 1);
    assert!(one_shot_fired.load(Ordering::SeqCst));
}

#[test]
fn test_dispatch_is_serialized_across_threads() {
    let reg = registry::<Ping>();
    let busy = Arc::new(AtomicBool::new(false));
    let total = Arc::new(AtomicUsize::new(0));

    let b = busy.clone();
    let t = total.clone();
    let _h = EventHandle::subscribe_in(&reg, move |_: &Ping| {
        assert!(!b.swap(true, Ordering::SeqCst), "overlapping dispatch");
        t.fetch_add(1, Ordering::SeqCst);
        b.store(false, Ordering::SeqCst);
    });

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let reg = reg.clone();
            thread::spawn(move || {
                for i in 0..100 {
                    reg.raise(&Ping { count: i });
                    let extra = EventHandle::subscribe_bare_in(&reg, || {});
                    extra.dispose();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker panicked");
    }

    assert_eq!(total.load(Ordering::SeqCst), 400);
    assert_eq!(reg.len(), 1);
}
