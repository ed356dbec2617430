use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use typebus::{init_logging, registries, EventHandle};

/// Demo event raised by the binary.
#[derive(Debug, Default, Clone)]
struct Ping {
    count: i32,
}

fn main() -> anyhow::Result<()> {
    init_logging()?;
    tracing::info!("TypeBus {} (built {})", typebus::VERSION, typebus::BUILD_DATE);

    let received = Arc::new(AtomicUsize::new(0));

    let second = EventHandle::<Ping>::subscribe_bare(|| tracing::info!("second listener"));
    let target = second.clone();
    let r = received.clone();
    let first = EventHandle::subscribe(move |ping: &Ping| {
        r.fetch_add(1, Ordering::SeqCst);
        tracing::info!("first listener got count={}", ping.count);
        if ping.count == 5 {
            target.pause();
            registries()
                .registry::<Ping>()
                .add_one_shot(|ping: &Ping| tracing::info!("one-shot after count={}", ping.count));
        }
    });

    registries().raise(&Ping { count: 5 });
    tracing::info!("{}", registries().registry::<Ping>().describe());

    registries().raise(&Ping { count: 1 });
    registries().raise_dyn(&Ping { count: 2 })?;

    first.dispose();
    second.dispose();
    for stats in registries().describe_all() {
        tracing::info!("{}", stats);
    }
    tracing::info!("first listener ran {} times", received.load(Ordering::SeqCst));

    registries().reset_all();
    Ok(())
}
