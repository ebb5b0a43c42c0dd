//! Common test utilities for the graphic cache integration tests

#![allow(dead_code)]

use gfxswap_cache::{Bitmap, CacheManager, Graphic, GraphicCacheConfig};
use std::time::{Duration, Instant};

/// Builder for test managers; sweeps only run when the test asks for one
pub struct TestManagerBuilder {
    limit: i64,
    idle: Duration,
    interval: Option<Duration>,
}

impl TestManagerBuilder {
    pub fn new() -> Self {
        Self {
            limit: 1_000_000,
            idle: Duration::from_secs(1),
            interval: None,
        }
    }

    pub fn with_memory_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_allowed_idle_time(mut self, idle: Duration) -> Self {
        self.idle = idle;
        self
    }

    /// Run a swap timer with the given period
    pub fn with_timer(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn build(self) -> CacheManager {
        let mut builder = GraphicCacheConfig::builder()
            .with_memory_limit(self.limit)
            .with_allowed_idle_time(self.idle);

        match self.interval {
            Some(interval) => {
                builder = builder.with_swap_interval(interval);
                CacheManager::new(builder.build())
            }
            None => CacheManager::new_manual(builder.build()),
        }
    }
}

/// Bitmap graphic of exactly `bytes` bytes
pub fn bitmap_graphic(manager: &CacheManager, bytes: u32) -> Graphic {
    manager.new_bitmap(Bitmap::new(bytes, 1, 8))
}

/// Pretend the graphic was last used `age` ago
pub fn back_date(graphic: &Graphic, age: Duration) {
    let now = Instant::now();
    graphic.mark_used_at(now.checked_sub(age).unwrap_or(now));
}

/// Poll `condition` until it holds or `timeout` passes
pub fn wait_for(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    condition()
}

/// Literal sum of materialised sizes
pub fn materialised_bytes<'a>(graphics: impl IntoIterator<Item = &'a Graphic>) -> i64 {
    graphics.into_iter().map(Graphic::size_bytes).sum()
}
