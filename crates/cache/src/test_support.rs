//! Scriptable managed object for unit tests

use crate::config::GraphicCacheConfig;
use crate::manager::{CacheManager, Registration};
use crate::traits::{GraphicId, ManagedObject};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

type SwapHook = Box<dyn Fn() + Send + Sync>;

/// Object whose size, idle age and swap behaviour are set by the test
pub(crate) struct MockObject {
    size: AtomicI64,
    swapped_out: AtomicBool,
    available: AtomicBool,
    active: AtomicBool,
    refuse_swap: AtomicBool,
    last_used: Mutex<Instant>,
    binding: OnceLock<(CacheManager, GraphicId)>,
    on_swap_out: Mutex<Option<SwapHook>>,
    swap_outs: AtomicUsize,
}

impl MockObject {
    pub(crate) fn new(size: i64) -> Arc<Self> {
        Arc::new(Self {
            size: AtomicI64::new(size),
            swapped_out: AtomicBool::new(false),
            available: AtomicBool::new(true),
            active: AtomicBool::new(false),
            refuse_swap: AtomicBool::new(false),
            last_used: Mutex::new(Instant::now()),
            binding: OnceLock::new(),
            on_swap_out: Mutex::new(None),
            swap_outs: AtomicUsize::new(0),
        })
    }

    /// Object last used `idle` ago
    pub(crate) fn idle(size: i64, idle: Duration) -> Arc<Self> {
        let object = Self::new(size);
        object.set_idle(idle);
        object
    }

    pub(crate) fn set_idle(&self, idle: Duration) {
        let now = Instant::now();
        *self.last_used.lock() = now.checked_sub(idle).unwrap_or(now);
    }

    pub(crate) fn set_size(&self, size: i64) {
        self.size.store(size, Ordering::SeqCst);
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    pub(crate) fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Make swap_out a no-op that leaves the object swapped in
    pub(crate) fn refuse_swap(&self) {
        self.refuse_swap.store(true, Ordering::SeqCst);
    }

    /// Flip the swapped-out flag without notifying the manager
    pub(crate) fn set_swapped_out_silently(&self, swapped_out: bool) {
        self.swapped_out.store(swapped_out, Ordering::SeqCst);
    }

    pub(crate) fn on_swap_out(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.on_swap_out.lock() = Some(Box::new(hook));
    }

    pub(crate) fn swap_out_count(&self) -> usize {
        self.swap_outs.load(Ordering::SeqCst)
    }

    /// Register with `manager` and remember the binding for notifications
    pub(crate) fn register(self: &Arc<Self>, manager: &CacheManager) -> Registration {
        let registration = manager.register(Arc::clone(self) as Arc<dyn ManagedObject>);
        let _ = self.binding.set((manager.clone(), registration.id()));
        registration
    }

    /// Swap back in and notify the manager
    pub(crate) fn swap_in(&self) {
        if self.swapped_out.swap(false, Ordering::SeqCst) {
            if let Some((manager, id)) = self.binding.get() {
                manager.notify_swapped_in(*id, self.size());
            }
        }
    }

    fn size(&self) -> i64 {
        self.size.load(Ordering::SeqCst)
    }
}

impl ManagedObject for MockObject {
    fn is_swapped_out(&self) -> bool {
        self.swapped_out.load(Ordering::SeqCst)
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn size_bytes(&self) -> i64 {
        self.size()
    }

    fn swap_out(&self) {
        self.swap_outs.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = self.on_swap_out.lock().as_ref() {
            hook();
        }
        if self.refuse_swap.load(Ordering::SeqCst) {
            return;
        }
        if !self.swapped_out.swap(true, Ordering::SeqCst) {
            if let Some((manager, id)) = self.binding.get() {
                manager.notify_swapped_out(*id, self.size());
            }
        }
    }

    fn last_used(&self) -> Instant {
        *self.last_used.lock()
    }

    fn has_active_operation(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// Manual-sweep manager with the given limit and a one second idle time
pub(crate) fn manual_manager(limit: i64) -> CacheManager {
    CacheManager::new_manual(
        GraphicCacheConfig::builder()
            .with_memory_limit(limit)
            .with_allowed_idle_time(Duration::from_secs(1))
            .build(),
    )
}
