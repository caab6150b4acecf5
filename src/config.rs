use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Runtime knobs of the preview pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewSettings {
    /// Governs `thumb` renders.
    pub enable_thumbnails: bool,
    /// Governs `big` renders.
    pub resize_preview: bool,
    /// Sniff file headers when the extension does not reveal the type.
    pub type_detection_by_header: bool,
    /// Maximum number of resizes running at once.
    pub image_processors: usize,
    pub store_workers: usize,
    pub store_queue: usize,
    pub store_timeout_secs: u64,
    pub cache_dir: Option<PathBuf>,
    /// Entry capacity of the in-memory cache, used when no `cache_dir` is set.
    pub memory_cache_entries: usize,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            enable_thumbnails: true,
            resize_preview: true,
            type_detection_by_header: false,
            image_processors: 4,
            store_workers: 4,
            store_queue: 256,
            store_timeout_secs: 30,
            cache_dir: dirs::cache_dir().map(|dir| dir.join("file_preview")),
            memory_cache_entries: 0,
        }
    }
}

impl PreviewSettings {
    pub fn with_thumbnails(mut self, enabled: bool) -> Self {
        self.enable_thumbnails = enabled;
        self
    }

    pub fn with_resize_preview(mut self, enabled: bool) -> Self {
        self.resize_preview = enabled;
        self
    }

    pub fn with_header_detection(mut self, enabled: bool) -> Self {
        self.type_detection_by_header = enabled;
        self
    }

    pub fn with_store_pool(mut self, workers: usize, queue: usize) -> Self {
        self.store_workers = workers;
        self.store_queue = queue;
        self
    }

    pub fn with_cache_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.cache_dir = dir;
        self
    }

    pub fn with_memory_cache(mut self, entries: usize) -> Self {
        self.memory_cache_entries = entries;
        self
    }

    /// Per-write timeout of the cache writer, at least one second.
    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs.max(1))
    }
}
