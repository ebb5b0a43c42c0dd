//! Idle-graphic eviction
//!
//! A sweep runs when usage has reached the memory limit. It walks a snapshot
//! of the registry and swaps out large, idle, inactive graphics until usage
//! drops below [`crate::config::TARGET_UTILIZATION`] of the limit. The manager
//! lock is released around every swap-out because a graphic's swap-out may
//! register or unregister other graphics.

use crate::config::{GraphicCacheConfig, MIN_EVICTABLE_BYTES};
use crate::manager::ManagerState;
use crate::traits::{graphic_size_bytes, ManagedObject};
use parking_lot::MutexGuard;
use std::time::{Duration, Instant};

/// Why a registered object was or was not picked by a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionDecision {
    /// Eligible for swap-out
    Evict,
    AlreadySwappedOut,
    /// At or below [`MIN_EVICTABLE_BYTES`]
    TooSmall,
    /// An external operation holds the object
    ActiveOperation,
    /// Used more recently than the allowed idle time
    RecentlyUsed,
}

/// Classify an object for the sweep at time `now`
pub fn evaluate(
    object: &dyn ManagedObject,
    config: &GraphicCacheConfig,
    now: Instant,
) -> EvictionDecision {
    if object.is_swapped_out() {
        return EvictionDecision::AlreadySwappedOut;
    }
    if graphic_size_bytes(object) <= MIN_EVICTABLE_BYTES {
        return EvictionDecision::TooSmall;
    }
    if object.has_active_operation() {
        return EvictionDecision::ActiveOperation;
    }
    // Idle age counts whole seconds only
    let idle = Duration::from_secs(now.saturating_duration_since(object.last_used()).as_secs());
    if idle > config.allowed_idle_time {
        EvictionDecision::Evict
    } else {
        EvictionDecision::RecentlyUsed
    }
}

/// Run a sweep if swapping is enabled, usage is at the limit and no sweep is
/// already in progress. Called with the manager lock held.
pub(crate) fn reduce_graphic_memory(
    config: &GraphicCacheConfig,
    guard: &mut MutexGuard<'_, ManagerState>,
) {
    if !config.swap_enabled {
        return;
    }

    if guard.used_bytes < config.memory_limit {
        return;
    }

    // A swap-out can register temporaries whose own over-limit check lands here
    if guard.reducing {
        guard.counters.record_suppressed_reentry();
        tracing::trace!("Graphic memory reduction already in progress");
        return;
    }
    guard.reducing = true;

    let before = guard.used_bytes;
    let evicted = loop_graphics_and_swap_out(config, guard);

    let calculated = guard.registry.calculated_size();
    if calculated != guard.used_bytes {
        tracing::debug!(
            used = guard.used_bytes,
            calculated,
            "Correcting graphic usage after sweep"
        );
        guard.used_bytes = calculated;
        guard.counters.record_drift_correction();
    }

    guard.counters.record_sweep(evicted);
    guard.reducing = false;

    tracing::debug!(
        evicted,
        before,
        after = guard.used_bytes,
        limit = config.memory_limit,
        "Graphic memory sweep finished"
    );
}

fn loop_graphics_and_swap_out(
    config: &GraphicCacheConfig,
    guard: &mut MutexGuard<'_, ManagerState>,
) -> u64 {
    let target = config.target_bytes();
    let snapshot = guard.registry.snapshot();
    let mut evicted = 0;

    for (id, object) in snapshot {
        if guard.used_bytes < target {
            break;
        }

        // Unregistered while the lock was released for an earlier swap-out
        if !guard.registry.contains(id) {
            continue;
        }

        match evaluate(object.as_ref(), config, Instant::now()) {
            EvictionDecision::Evict => {}
            decision => {
                tracing::trace!(%id, ?decision, "Skipping graphic");
                continue;
            }
        }

        let swapped_out = MutexGuard::unlocked(guard, || {
            object.swap_out();
            object.is_swapped_out()
        });

        if swapped_out {
            evicted += 1;
            tracing::trace!(%id, "Swapped out idle graphic");
        } else {
            tracing::warn!(%id, "Idle graphic could not be swapped out");
        }
    }

    evicted
}
