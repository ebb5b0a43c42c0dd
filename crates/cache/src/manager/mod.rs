//! Process-wide graphic cache manager
//!
//! The manager keeps a registry of swappable graphics and a running count of
//! the bytes they occupy while swapped in. When the count reaches the memory
//! limit, idle graphics are swapped out, either from a periodic timer or when
//! a new graphic is registered.
//!
//! One mutex serialises every registry and accounting change. It is never
//! held while calling a graphic's `swap_out`, and every bulk mutation ends by
//! recomputing the true usage so recursive registrations cannot leave the
//! counter drifting.

mod global;
mod registry;
mod statistics;
mod timer;

pub use global::{global, initialize_global, shutdown_global};
pub use statistics::CacheStatistics;

use crate::config::GraphicCacheConfig;
use crate::eviction;
use crate::traits::{accounted_size, graphic_size_bytes, GraphicId, ManagedObject};
use parking_lot::{Mutex, MutexGuard};
use registry::Registry;
use statistics::SweepCounters;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use timer::SwapTimer;

/// Mutable state guarded by the manager lock
#[derive(Default)]
pub(crate) struct ManagerState {
    pub(crate) registry: Registry,
    pub(crate) used_bytes: i64,
    pub(crate) reducing: bool,
    pub(crate) counters: SweepCounters,
}

pub(crate) struct Shared {
    config: GraphicCacheConfig,
    state: Mutex<ManagerState>,
    next_id: AtomicU64,
    timer: Mutex<Option<SwapTimer>>,
}

impl Shared {
    /// One timer tick: sweep under the manager lock
    pub(crate) fn on_swap_timer(&self) {
        let mut guard = self.state.lock();
        eviction::reduce_graphic_memory(&self.config, &mut guard);
    }
}

/// Handle to a graphic cache manager
///
/// Cloning is cheap; all clones share one registry. Dropping the last handle
/// stops the swap timer.
#[derive(Clone)]
pub struct CacheManager {
    shared: Arc<Shared>,
}

/// Non-owning handle held by graphics so they do not keep the manager alive
#[derive(Clone)]
pub(crate) struct WeakManager {
    shared: Weak<Shared>,
}

impl WeakManager {
    pub(crate) fn upgrade(&self) -> Option<CacheManager> {
        self.shared.upgrade().map(|shared| CacheManager { shared })
    }
}

impl CacheManager {
    /// Create a manager and start its swap timer when swapping is enabled
    pub fn new(config: GraphicCacheConfig) -> Self {
        let manager = Self::new_manual(config);

        if manager.shared.config.swap_enabled {
            match SwapTimer::start(
                Arc::downgrade(&manager.shared),
                manager.shared.config.swap_interval,
            ) {
                Ok(timer) => *manager.shared.timer.lock() = Some(timer),
                Err(e) => tracing::warn!(
                    "Failed to start graphic swap timer, sweeps will only run on registration: {e}"
                ),
            }
        }

        manager
    }

    /// Create a manager without a swap timer
    ///
    /// Sweeps still run when a registration finds usage over the limit and on
    /// [`CacheManager::reduce_graphic_memory`].
    pub fn new_manual(config: GraphicCacheConfig) -> Self {
        tracing::debug!(
            memory_limit = config.memory_limit,
            allowed_idle_time = ?config.allowed_idle_time,
            swap_enabled = config.swap_enabled,
            source = ?config.source,
            "Creating graphic cache manager"
        );

        Self {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(ManagerState::default()),
                next_id: AtomicU64::new(1),
                timer: Mutex::new(None),
            }),
        }
    }

    /// Configuration fixed at construction
    pub fn config(&self) -> &GraphicCacheConfig {
        &self.shared.config
    }

    /// Stop the swap timer and wait for its thread. Idempotent.
    pub fn shutdown(&self) {
        let timer = self.shared.timer.lock().take();
        if timer.is_some() {
            tracing::debug!("Shutting down graphic swap timer");
        }
        drop(timer);
    }

    /// Whether the swap timer is running
    pub fn has_swap_timer(&self) -> bool {
        self.shared.timer.lock().is_some()
    }

    pub(crate) fn downgrade(&self) -> WeakManager {
        WeakManager {
            shared: Arc::downgrade(&self.shared),
        }
    }

    pub(crate) fn allocate_id(&self) -> GraphicId {
        GraphicId(self.shared.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Register an object and return the token that unregisters it on drop
    ///
    /// Always succeeds; an over-limit cache is allowed to exceed its bound
    /// until a sweep can make room.
    pub fn register(&self, object: Arc<dyn ManagedObject>) -> Registration {
        let id = self.allocate_id();
        self.register_as(id, object);
        Registration::new(id, self.clone())
    }

    pub(crate) fn register_as(&self, id: GraphicId, object: Arc<dyn ManagedObject>) {
        let mut guard = self.shared.state.lock();

        // make some space first
        if guard.used_bytes > self.shared.config.memory_limit {
            eviction::reduce_graphic_memory(&self.shared.config, &mut guard);
        }

        guard.used_bytes += accounted_size(object.as_ref());
        if !guard.registry.insert(id, object) {
            tracing::warn!(%id, "Graphic registered twice");
        }

        Self::heal_drift(&mut guard);
    }

    /// Remove an object from the registry. Unknown ids are ignored.
    pub fn unregister(&self, id: GraphicId) {
        let removed = {
            let mut guard = self.shared.state.lock();
            let removed = guard.registry.remove(id);
            if let Some(object) = &removed {
                guard.used_bytes -= accounted_size(object.as_ref());
            }
            removed
        };
        // The registry may have held the last reference
        drop(removed);
    }

    /// A graphic finished swapping in `size_bytes`
    pub fn notify_swapped_in(&self, id: GraphicId, size_bytes: i64) {
        let mut guard = self.shared.state.lock();
        guard.used_bytes += size_bytes;
        tracing::trace!(%id, size_bytes, used = guard.used_bytes, "Graphic swapped in");
    }

    /// A graphic finished swapping out `size_bytes`
    pub fn notify_swapped_out(&self, id: GraphicId, size_bytes: i64) {
        let mut guard = self.shared.state.lock();
        guard.used_bytes -= size_bytes;
        tracing::trace!(%id, size_bytes, used = guard.used_bytes, "Graphic swapped out");
    }

    /// A swapped-in graphic changed size in place
    pub fn notify_resized(&self, id: GraphicId, old_size_bytes: i64) {
        let mut guard = self.shared.state.lock();
        let Some(new_size_bytes) = guard
            .registry
            .get(id)
            .map(|object| graphic_size_bytes(object.as_ref()))
        else {
            tracing::debug!(%id, "Resize reported for unregistered graphic");
            return;
        };
        guard.used_bytes += new_size_bytes - old_size_bytes;
    }

    /// Recompute usage as the literal sum over swapped-in graphics, correcting
    /// the counter if it drifted. Returns the true usage.
    pub fn derive_true_usage(&self) -> i64 {
        let mut guard = self.shared.state.lock();
        Self::heal_drift(&mut guard);
        guard.used_bytes
    }

    fn heal_drift(guard: &mut MutexGuard<'_, ManagerState>) {
        let calculated = guard.registry.calculated_size();
        if calculated != guard.used_bytes {
            tracing::info!(
                used = guard.used_bytes,
                calculated,
                "Calculated size mismatch. Variable size is '{}' but calculated size is '{}'",
                guard.used_bytes,
                calculated
            );
            guard.used_bytes = calculated;
            guard.counters.record_drift_correction();
        }
    }

    /// Run a sweep on the calling thread, as a timer tick would
    pub fn reduce_graphic_memory(&self) {
        self.shared.on_swap_timer();
    }

    /// Bytes currently accounted as swapped in
    pub fn used_bytes(&self) -> i64 {
        self.shared.state.lock().used_bytes
    }

    /// Number of registered objects
    pub fn registered_count(&self) -> usize {
        self.shared.state.lock().registry.len()
    }

    /// Whether `id` is currently registered
    pub fn is_registered(&self, id: GraphicId) -> bool {
        self.shared.state.lock().registry.contains(id)
    }

    /// Snapshot of usage and sweep counters
    pub fn statistics(&self) -> CacheStatistics {
        let guard = self.shared.state.lock();
        CacheStatistics {
            used_bytes: guard.used_bytes,
            memory_limit: self.shared.config.memory_limit,
            registered: guard.registry.len(),
            swapped_out: guard.registry.swapped_out_count(),
            sweeps: guard.counters.sweeps,
            evictions: guard.counters.evictions,
            drift_corrections: guard.counters.drift_corrections,
            suppressed_reentries: guard.counters.suppressed_reentries,
            last_sweep: guard.counters.last_sweep,
        }
    }
}

impl fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheManager")
            .field("config", &self.shared.config)
            .field("used_bytes", &self.used_bytes())
            .finish_non_exhaustive()
    }
}

/// Registration of one object; unregisters it when dropped
#[must_use = "dropping a Registration unregisters the object immediately"]
pub struct Registration {
    id: GraphicId,
    manager: CacheManager,
}

impl Registration {
    pub(crate) fn new(id: GraphicId, manager: CacheManager) -> Self {
        Self { id, manager }
    }

    /// Id to pass to the manager's notification methods
    pub fn id(&self) -> GraphicId {
        self.id
    }

    /// Manager the object is registered with
    pub fn manager(&self) -> &CacheManager {
        &self.manager
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration").field("id", &self.id).finish()
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.manager.unregister(self.id);
    }
}
