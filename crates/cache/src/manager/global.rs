//! Process-wide manager instance

use super::CacheManager;
use crate::config::GraphicCacheConfig;
use gfxswap_core::{Error, Result};
use once_cell::sync::OnceCell;

static GLOBAL_MANAGER: OnceCell<CacheManager> = OnceCell::new();

/// Install the process-wide manager with an explicit configuration
///
/// Fails if the global manager already exists, whether from an earlier call
/// or from [`global`].
pub fn initialize_global(config: GraphicCacheConfig) -> Result<&'static CacheManager> {
    GLOBAL_MANAGER
        .try_insert(CacheManager::new(config))
        .map_err(|(_, rejected)| {
            rejected.shutdown();
            Error::configuration("graphic cache manager is already initialised")
        })
}

/// Get the process-wide manager, creating it from the environment on first use
pub fn global() -> &'static CacheManager {
    GLOBAL_MANAGER.get_or_init(|| {
        tracing::debug!("Auto-initializing global graphic cache manager");
        CacheManager::new(GraphicCacheConfig::load())
    })
}

/// Stop the global manager's swap timer, if the manager was ever created
pub fn shutdown_global() {
    if let Some(manager) = GLOBAL_MANAGER.get() {
        manager.shutdown();
    }
}
