//! Swap-outs that register further graphics while a sweep is running

mod common;

use common::{back_date, bitmap_graphic, TestManagerBuilder};
use gfxswap_cache::{CacheManager, Graphic, ManagedObject, Registration};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

/// Object whose swap-out creates a temporary graphic, as decoding a vector
/// source into a bitmap would
struct SpawningObject {
    size: i64,
    swapped_out: AtomicBool,
    last_used: Instant,
    binding: OnceLock<(CacheManager, gfxswap_cache::GraphicId)>,
    temporaries: Mutex<Vec<Graphic>>,
}

impl SpawningObject {
    fn new(size: i64) -> Arc<Self> {
        let now = Instant::now();
        Arc::new(Self {
            size,
            swapped_out: AtomicBool::new(false),
            last_used: now.checked_sub(Duration::from_secs(120)).unwrap_or(now),
            binding: OnceLock::new(),
            temporaries: Mutex::new(Vec::new()),
        })
    }

    fn register(self: &Arc<Self>, manager: &CacheManager) -> Registration {
        let registration = manager.register(Arc::clone(self) as Arc<dyn ManagedObject>);
        let _ = self.binding.set((manager.clone(), registration.id()));
        registration
    }
}

impl ManagedObject for SpawningObject {
    fn is_swapped_out(&self) -> bool {
        self.swapped_out.load(Ordering::SeqCst)
    }

    fn is_available(&self) -> bool {
        true
    }

    fn size_bytes(&self) -> i64 {
        self.size
    }

    fn swap_out(&self) {
        if self.is_swapped_out() {
            return;
        }
        let Some((manager, id)) = self.binding.get() else {
            return;
        };

        let temporary = bitmap_graphic(manager, 800_000);
        self.temporaries.lock().push(temporary);

        self.swapped_out.store(true, Ordering::SeqCst);
        manager.notify_swapped_out(*id, self.size);
    }

    fn last_used(&self) -> Instant {
        self.last_used
    }

    fn has_active_operation(&self) -> bool {
        false
    }
}

#[test]
fn nested_registration_does_not_recurse() {
    let manager = TestManagerBuilder::new().with_memory_limit(1_000_000).build();
    let spawner = SpawningObject::new(900_000);
    let _registration = spawner.register(&manager);
    let other = bitmap_graphic(&manager, 900_000);
    back_date(&other, Duration::from_secs(120));
    assert_eq!(manager.used_bytes(), 1_800_000);

    manager.reduce_graphic_memory();

    let stats = manager.statistics();
    assert_eq!(stats.sweeps, 1);
    assert_eq!(stats.suppressed_reentries, 1);
    assert!(spawner.is_swapped_out());
    assert_eq!(spawner.temporaries.lock().len(), 1);

    // The temporary was not part of the sweep's snapshot
    let temporary_bytes: i64 = spawner
        .temporaries
        .lock()
        .iter()
        .map(Graphic::size_bytes)
        .sum();
    assert_eq!(temporary_bytes, 800_000);
    assert_eq!(manager.used_bytes(), temporary_bytes + other.size_bytes());
    assert_eq!(manager.derive_true_usage(), manager.used_bytes());

    spawner.temporaries.lock().clear();
}

#[test]
fn no_double_counting_after_recursive_sweep() {
    let manager = TestManagerBuilder::new().with_memory_limit(1_000_000).build();
    let spawners: Vec<_> = (0..3).map(|_| SpawningObject::new(600_000)).collect();
    let _registrations: Vec<_> = spawners.iter().map(|s| s.register(&manager)).collect();

    manager.reduce_graphic_memory();

    let expected: i64 = spawners
        .iter()
        .map(|s| {
            let own = if s.is_swapped_out() { 0 } else { s.size };
            let temporaries: i64 = s.temporaries.lock().iter().map(Graphic::size_bytes).sum();
            own + temporaries
        })
        .sum();
    assert_eq!(manager.used_bytes(), expected);
    assert_eq!(manager.derive_true_usage(), expected);

    for spawner in &spawners {
        spawner.temporaries.lock().clear();
    }
}
