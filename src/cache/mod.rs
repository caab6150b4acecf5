//! Preview cache backends.

mod disk;
mod memory;
mod noop;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::{PreviewSettings, Result};

pub use disk::DiskCache;
pub use memory::MemoryCache;
pub use noop::NoOpCache;

/// Flat key/value store for rendered previews. No TTL, eviction or
/// durability is assumed by callers.
#[async_trait]
pub trait FileCache: Send + Sync {
    async fn store(&self, key: &str, value: &[u8]) -> Result<()>;
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Disk cache when a directory is configured, otherwise an in-memory LRU
/// when it has capacity, otherwise nothing.
pub async fn from_settings(settings: &PreviewSettings) -> Result<Arc<dyn FileCache>> {
    if let Some(dir) = &settings.cache_dir {
        info!(dir = %dir.display(), "using disk preview cache");
        return Ok(Arc::new(DiskCache::new(dir).await?));
    }
    if settings.memory_cache_entries > 0 {
        info!(entries = settings.memory_cache_entries, "using in-memory preview cache");
        return Ok(Arc::new(MemoryCache::new(settings.memory_cache_entries)));
    }
    info!("preview cache disabled");
    Ok(Arc::new(NoOpCache))
}
