//! Manager statistics tracking and reporting

use serde::Serialize;
use std::time::SystemTime;

/// Point-in-time view of a cache manager
#[derive(Debug, Default, Clone, Serialize)]
pub struct CacheStatistics {
    /// Bytes currently accounted as swapped in
    pub used_bytes: i64,
    pub memory_limit: i64,
    /// Number of registered objects
    pub registered: usize,
    /// Registered objects currently swapped out
    pub swapped_out: usize,
    /// Completed eviction sweeps
    pub sweeps: u64,
    /// Objects swapped out by sweeps
    pub evictions: u64,
    /// Times the usage counter was corrected against the recomputed sum
    pub drift_corrections: u64,
    /// Sweeps skipped because one was already running
    pub suppressed_reentries: u64,
    pub last_sweep: Option<SystemTime>,
}

impl CacheStatistics {
    /// Usage as a fraction of the limit
    pub fn utilization(&self) -> f64 {
        if self.memory_limit <= 0 {
            0.0
        } else {
            self.used_bytes as f64 / self.memory_limit as f64
        }
    }
}

/// Counters kept under the manager lock
#[derive(Debug, Default, Clone)]
pub(crate) struct SweepCounters {
    pub(crate) sweeps: u64,
    pub(crate) evictions: u64,
    pub(crate) drift_corrections: u64,
    pub(crate) suppressed_reentries: u64,
    pub(crate) last_sweep: Option<SystemTime>,
}

impl SweepCounters {
    pub(crate) fn record_sweep(&mut self, evicted: u64) {
        self.sweeps += 1;
        self.evictions += evicted;
        self.last_sweep = Some(SystemTime::now());
    }

    pub(crate) fn record_drift_correction(&mut self) {
        self.drift_corrections += 1;
    }

    pub(crate) fn record_suppressed_reentry(&mut self) {
        self.suppressed_reentries += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_counters() {
        let mut counters = SweepCounters::default();

        counters.record_sweep(2);
        counters.record_sweep(0);
        counters.record_drift_correction();
        counters.record_suppressed_reentry();

        assert_eq!(counters.sweeps, 2);
        assert_eq!(counters.evictions, 2);
        assert_eq!(counters.drift_corrections, 1);
        assert_eq!(counters.suppressed_reentries, 1);
        assert!(counters.last_sweep.is_some());
    }

    #[test]
    fn test_utilization() {
        let stats = CacheStatistics {
            used_bytes: 250,
            memory_limit: 1000,
            ..Default::default()
        };
        assert_eq!(stats.utilization(), 0.25);

        let unlimited = CacheStatistics::default();
        assert_eq!(unlimited.utilization(), 0.0);
    }

    #[test]
    fn test_statistics_json_fields() {
        let stats = CacheStatistics {
            used_bytes: 500_000,
            memory_limit: 1_000_000,
            registered: 3,
            swapped_out: 2,
            sweeps: 1,
            evictions: 2,
            ..Default::default()
        };

        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["used_bytes"], 500_000);
        assert_eq!(value["memory_limit"], 1_000_000);
        assert_eq!(value["registered"], 3);
        assert_eq!(value["swapped_out"], 2);
        assert_eq!(value["sweeps"], 1);
        assert_eq!(value["evictions"], 2);
        assert_eq!(value["drift_corrections"], 0);
        assert_eq!(value["suppressed_reentries"], 0);
        assert!(value["last_sweep"].is_null());
    }
}
