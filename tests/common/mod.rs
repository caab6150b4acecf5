#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use file_preview::cache::{FileCache, MemoryCache};
use file_preview::files::{
    self, ContentReader, FileDescriptor, FileOptions, FileResolver, FileStat, FileSystem,
};
use file_preview::img::{Format, ImageService, ImgError, ResizeOptions};
use file_preview::preview::{PreviewBody, PreviewHandler, PreviewRequest, PreviewResponse};
use file_preview::{PreviewError, PreviewSettings, User};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::sync::Barrier;

pub const MODIFIED: i64 = 1_700_000_000;

struct MemFile {
    data: Vec<u8>,
    modified: DateTime<Utc>,
    is_dir: bool,
}

/// In-memory filesystem that counts opened and still-open readers.
#[derive(Default)]
pub struct MemFs {
    files: Mutex<HashMap<String, MemFile>>,
    open_handles: Arc<AtomicUsize>,
    total_opens: AtomicUsize,
}

impl MemFs {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_file(&self, path: &str, data: &[u8], modified_unix: i64) {
        self.files.lock().unwrap().insert(
            path.to_string(),
            MemFile {
                data: data.to_vec(),
                modified: DateTime::from_timestamp(modified_unix, 0).unwrap(),
                is_dir: false,
            },
        );
    }

    pub fn add_dir(&self, path: &str) {
        self.files.lock().unwrap().insert(
            path.to_string(),
            MemFile {
                data: Vec::new(),
                modified: DateTime::from_timestamp(MODIFIED, 0).unwrap(),
                is_dir: true,
            },
        );
    }

    pub fn open_handles(&self) -> usize {
        self.open_handles.load(Ordering::SeqCst)
    }

    pub fn total_opens(&self) -> usize {
        self.total_opens.load(Ordering::SeqCst)
    }
}

struct TrackedReader {
    inner: Cursor<Vec<u8>>,
    handles: Arc<AtomicUsize>,
}

impl AsyncRead for TrackedReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl Drop for TrackedReader {
    fn drop(&mut self) {
        self.handles.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl FileSystem for MemFs {
    async fn stat(&self, path: &str) -> io::Result<FileStat> {
        let files = self.files.lock().unwrap();
        let file = files
            .get(path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))?;
        Ok(FileStat {
            is_dir: file.is_dir,
            size: file.data.len() as u64,
            modified: file.modified,
        })
    }

    async fn open(&self, path: &str) -> io::Result<ContentReader> {
        let data = {
            let files = self.files.lock().unwrap();
            files
                .get(path)
                .map(|file| file.data.clone())
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))?
        };
        self.total_opens.fetch_add(1, Ordering::SeqCst);
        self.open_handles.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(TrackedReader {
            inner: Cursor::new(data),
            handles: Arc::clone(&self.open_handles),
        }))
    }
}

pub struct MemResolver(pub Arc<MemFs>);

#[async_trait]
impl FileResolver for MemResolver {
    async fn resolve(&self, opts: FileOptions<'_>) -> file_preview::Result<FileDescriptor> {
        let fs: Arc<dyn FileSystem> = self.0.clone();
        files::resolve(fs, &opts).await
    }
}

/// Deterministic stand-in for the image transform: the output spells out the
/// requested geometry followed by the source bytes.
#[derive(Default)]
pub struct StubImages {
    calls: AtomicUsize,
    gate: Option<Barrier>,
    fail: bool,
}

impl StubImages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every resize waits until `n` resizes are in flight.
    pub fn with_barrier(n: usize) -> Self {
        Self {
            gate: Some(Barrier::new(n)),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn stub_render(source: &[u8], width: u32, height: u32, options: ResizeOptions) -> Vec<u8> {
    let mut out = format!(
        "{}x{}:{:?}:{:?}:{:?}:",
        width, height, options.mode, options.quality, options.format
    )
    .into_bytes();
    out.extend_from_slice(source);
    out
}

#[async_trait]
impl ImageService for StubImages {
    fn format_from_extension(&self, ext: &str) -> Result<Format, ImgError> {
        Format::from_extension(ext)
    }

    async fn resize(
        &self,
        input: &mut (dyn AsyncRead + Send + Unpin),
        width: u32,
        height: u32,
        output: &mut (dyn AsyncWrite + Send + Unpin),
        options: ResizeOptions,
    ) -> Result<(), ImgError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut source = Vec::new();
        input.read_to_end(&mut source).await?;

        if let Some(gate) = &self.gate {
            gate.wait().await;
        }
        if self.fail {
            return Err(ImgError::Worker("stub failure".to_string()));
        }

        output
            .write_all(&stub_render(&source, width, height, options))
            .await?;
        Ok(())
    }
}

/// Memory cache that counts calls and can be told to fail writes.
pub struct RecordingCache {
    inner: MemoryCache,
    loads: AtomicUsize,
    stores: AtomicUsize,
    fail_stores: bool,
}

impl RecordingCache {
    pub fn new() -> Self {
        Self {
            inner: MemoryCache::new(64),
            loads: AtomicUsize::new(0),
            stores: AtomicUsize::new(0),
            fail_stores: false,
        }
    }

    pub fn failing_stores() -> Self {
        Self {
            fail_stores: true,
            ..Self::new()
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn stores(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }

    /// Reads without counting as a load.
    pub async fn peek(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.load(key).await.unwrap()
    }

    pub async fn seed(&self, key: &str, value: &[u8]) {
        self.inner.store(key, value).await.unwrap();
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

#[async_trait]
impl FileCache for RecordingCache {
    async fn store(&self, key: &str, value: &[u8]) -> file_preview::Result<()> {
        self.stores.fetch_add(1, Ordering::SeqCst);
        if self.fail_stores {
            return Err(PreviewError::Cache("disk full".to_string()));
        }
        self.inner.store(key, value).await
    }

    async fn load(&self, key: &str) -> file_preview::Result<Option<Vec<u8>>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load(key).await
    }

    async fn delete(&self, key: &str) -> file_preview::Result<()> {
        self.inner.delete(key).await
    }
}

pub struct Harness {
    pub fs: Arc<MemFs>,
    pub images: Arc<StubImages>,
    pub cache: Arc<RecordingCache>,
    pub handler: Arc<PreviewHandler>,
}

impl Harness {
    pub fn new(settings: PreviewSettings) -> Self {
        Self::with(settings, StubImages::new(), RecordingCache::new())
    }

    pub fn with(settings: PreviewSettings, images: StubImages, cache: RecordingCache) -> Self {
        let fs = MemFs::new();
        let images = Arc::new(images);
        let cache = Arc::new(cache);
        let handler = PreviewHandler::new(
            Arc::new(MemResolver(Arc::clone(&fs))),
            images.clone(),
            cache.clone(),
            &settings,
        );
        Self {
            fs,
            images,
            cache,
            handler: Arc::new(handler),
        }
    }
}

pub fn test_settings() -> PreviewSettings {
    PreviewSettings::default()
        .with_cache_dir(None)
        .with_store_pool(2, 16)
}

pub fn request(size: &str, path: &str) -> PreviewRequest {
    PreviewRequest::new(User::new("tester"), size, path)
}

pub async fn body_bytes(response: PreviewResponse) -> Vec<u8> {
    match response.body {
        PreviewBody::Empty => Vec::new(),
        PreviewBody::Bytes(bytes) => bytes,
        PreviewBody::Stream(mut reader) => {
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes).await.unwrap();
            bytes
        }
    }
}

/// Polls until the detached writer has stored `key`.
pub async fn wait_for_entry(cache: &RecordingCache, key: &str) -> Option<Vec<u8>> {
    for _ in 0..200 {
        if let Some(value) = cache.peek(key).await {
            return Some(value);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    None
}
