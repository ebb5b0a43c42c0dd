//! Graphic cache configuration with best-effort loading
//!
//! The manager reads three values once at construction: the memory limit, the
//! idle time after which a graphic may be swapped out, and the master switch
//! for swapping. Any value that cannot be read keeps its default.

use serde::Serialize;
use std::time::Duration;

/// Default memory budget in bytes
pub const DEFAULT_MEMORY_LIMIT: i64 = 300_000_000;
/// Default idle time before a graphic becomes eligible for swap-out
pub const DEFAULT_ALLOWED_IDLE_TIME: Duration = Duration::from_secs(10);
/// Default period of the swap timer
pub const DEFAULT_SWAP_INTERVAL: Duration = Duration::from_secs(10);
/// Graphics at or below this size are never swapped out
pub const MIN_EVICTABLE_BYTES: i64 = 100_000;
/// Fraction of the memory limit a sweep reduces usage to
pub const TARGET_UTILIZATION: f64 = 0.7;

/// Memory limit in bytes
pub const ENV_MEMORY_LIMIT: &str = "GFXSWAP_MEMORY_LIMIT";
/// Allowed idle time in whole seconds
pub const ENV_ALLOWED_IDLE_TIME: &str = "GFXSWAP_ALLOWED_IDLE_TIME";
/// `true`/`false` master switch
pub const ENV_SWAP_ENABLED: &str = "GFXSWAP_SWAP_ENABLED";
/// When set, configuration loading is skipped and defaults are used
pub const ENV_FUZZING: &str = "GFXSWAP_FUZZING";

/// Source of configuration for debugging
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ConfigSource {
    /// Built-in defaults
    Default,
    /// At least one value came from the environment
    EnvironmentVariable(String),
    /// Supplied programmatically
    Injected,
}

/// Configuration of a graphic cache manager
#[derive(Debug, Clone, Serialize)]
pub struct GraphicCacheConfig {
    /// Hard cache budget in bytes
    pub memory_limit: i64,
    /// Minimum idle age before a graphic is eligible for swap-out
    pub allowed_idle_time: Duration,
    /// Master on/off for eviction and the swap timer
    pub swap_enabled: bool,
    /// Period of the swap timer
    pub swap_interval: Duration,
    /// Where the values came from
    pub source: ConfigSource,
}

impl Default for GraphicCacheConfig {
    fn default() -> Self {
        Self {
            memory_limit: DEFAULT_MEMORY_LIMIT,
            allowed_idle_time: DEFAULT_ALLOWED_IDLE_TIME,
            swap_enabled: true,
            swap_interval: DEFAULT_SWAP_INTERVAL,
            source: ConfigSource::Default,
        }
    }
}

impl GraphicCacheConfig {
    /// Create a builder for an injected configuration
    pub fn builder() -> GraphicCacheConfigBuilder {
        GraphicCacheConfigBuilder::new()
    }

    /// Load the configuration from the process environment
    ///
    /// Never fails: unreadable or unparsable values fall back to defaults.
    pub fn load() -> Self {
        Self::load_with(|name| std::env::var(name).ok())
    }

    /// Load the configuration through an arbitrary variable lookup
    pub fn load_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if lookup(ENV_FUZZING).is_some() {
            tracing::debug!("{ENV_FUZZING} is set, using default graphic cache configuration");
            return config;
        }

        let mut has_env_config = false;

        if let Some(raw) = lookup(ENV_MEMORY_LIMIT) {
            match raw.trim().parse::<i64>() {
                Ok(limit) if limit >= 0 => {
                    config.memory_limit = limit;
                    has_env_config = true;
                }
                _ => tracing::warn!(
                    value = %raw,
                    "Ignoring invalid {ENV_MEMORY_LIMIT}, keeping {}",
                    config.memory_limit
                ),
            }
        }

        if let Some(raw) = lookup(ENV_ALLOWED_IDLE_TIME) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => {
                    config.allowed_idle_time = Duration::from_secs(secs);
                    has_env_config = true;
                }
                Err(e) => tracing::warn!(
                    value = %raw,
                    "Ignoring invalid {ENV_ALLOWED_IDLE_TIME}: {e}"
                ),
            }
        }

        if let Some(raw) = lookup(ENV_SWAP_ENABLED) {
            match parse_bool(&raw) {
                Some(enabled) => {
                    config.swap_enabled = enabled;
                    has_env_config = true;
                }
                None => tracing::warn!(value = %raw, "Ignoring invalid {ENV_SWAP_ENABLED}"),
            }
        }

        if has_env_config {
            config.source = ConfigSource::EnvironmentVariable("GFXSWAP_*".to_string());
        }

        config
    }

    /// Usage a sweep tries to get below
    pub fn target_bytes(&self) -> i64 {
        (self.memory_limit as f64 * TARGET_UTILIZATION) as i64
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Builder for injected configurations
pub struct GraphicCacheConfigBuilder {
    config: GraphicCacheConfig,
}

impl GraphicCacheConfigBuilder {
    /// Create a new builder starting from the defaults
    pub fn new() -> Self {
        Self {
            config: GraphicCacheConfig {
                source: ConfigSource::Injected,
                ..GraphicCacheConfig::default()
            },
        }
    }

    /// Set the memory limit in bytes
    pub fn with_memory_limit(mut self, bytes: i64) -> Self {
        self.config.memory_limit = bytes;
        self
    }

    /// Set the allowed idle time
    pub fn with_allowed_idle_time(mut self, idle: Duration) -> Self {
        self.config.allowed_idle_time = idle;
        self
    }

    /// Enable or disable swapping
    pub fn with_swap_enabled(mut self, enabled: bool) -> Self {
        self.config.swap_enabled = enabled;
        self
    }

    /// Set the swap timer period
    pub fn with_swap_interval(mut self, interval: Duration) -> Self {
        self.config.swap_interval = interval;
        self
    }

    /// Build the configuration
    pub fn build(self) -> GraphicCacheConfig {
        self.config
    }
}

impl Default for GraphicCacheConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
