//! Memory-bounded swap manager for graphics
//!
//! This crate keeps the total size of materialised graphics under a budget:
//! - A registry of swappable graphics with a running usage counter
//! - Idle-time based eviction down to 70% of the limit
//! - A background swap timer and registration-triggered sweeps
//! - Swap files for payloads with no other backing store
//! - A lazily created process-wide manager

pub mod config;
pub mod eviction;
pub mod graphic;
pub mod manager;
pub mod traits;

pub use config::{ConfigSource, GraphicCacheConfig, GraphicCacheConfigBuilder};
pub use eviction::EvictionDecision;
pub use graphic::payload::{
    Animation, Bitmap, EncodedImage, ExternalLink, GfxLink, GraphicKind, GraphicPayload,
    LinkFormat, Metafile, VectorFormat, VectorGraphicData,
};
pub use graphic::{Graphic, OperationGuard};
pub use manager::{
    global, initialize_global, shutdown_global, CacheManager, CacheStatistics, Registration,
};
pub use traits::{GraphicId, ManagedObject};

pub use gfxswap_core::{Error, Result};

#[cfg(test)]
mod test_support;
