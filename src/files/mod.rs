//! File resolution: turns a requested path into a [`FileDescriptor`].

mod local;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::{FileKind, FileTypeDetector, PreviewError, Result, User, HEADER_SNIFF_LEN};

pub use local::{LocalFs, LocalResolver};

pub type ContentReader = Box<dyn AsyncRead + Send + Unpin>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub is_dir: bool,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

#[async_trait]
pub trait FileSystem: Send + Sync {
    async fn stat(&self, path: &str) -> std::io::Result<FileStat>;
    async fn open(&self, path: &str) -> std::io::Result<ContentReader>;
}

#[async_trait]
pub trait FileResolver: Send + Sync {
    async fn resolve(&self, opts: FileOptions<'_>) -> Result<FileDescriptor>;
}

pub struct FileOptions<'a> {
    pub user: &'a User,
    pub path: &'a str,
    pub read_header: bool,
}

/// A resolved file, valid for one request.
#[derive(Clone)]
pub struct FileDescriptor {
    /// Path exactly as requested.
    pub path: String,
    pub name: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
    /// Extension including the leading dot, empty if there is none.
    pub extension: String,
    pub kind: FileKind,
    fs: Arc<dyn FileSystem>,
}

impl FileDescriptor {
    pub async fn open(&self) -> Result<ContentReader> {
        Ok(self.fs.open(&self.path).await?)
    }

    pub fn modified_unix(&self) -> i64 {
        self.modified.timestamp()
    }
}

impl fmt::Debug for FileDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileDescriptor")
            .field("path", &self.path)
            .field("size", &self.size)
            .field("modified", &self.modified)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Resolves `opts.path` against `fs`, applying the user's access rules.
pub async fn resolve(fs: Arc<dyn FileSystem>, opts: &FileOptions<'_>) -> Result<FileDescriptor> {
    if !opts.user.check(opts.path) {
        return Err(PreviewError::PermissionDenied(opts.path.to_string()));
    }

    let stat = fs.stat(opts.path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PreviewError::NotFound(opts.path.to_string()),
        _ => PreviewError::Io(e),
    })?;

    let name = Path::new(opts.path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "/".to_string());
    let extension = Path::new(&name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    let kind = if stat.is_dir {
        FileKind::Directory
    } else if opts.read_header && FileTypeDetector::mime_from_name(&name).is_none() {
        let header = read_header(fs.as_ref(), opts.path).await?;
        FileTypeDetector::detect(&name, Some(&header))
    } else {
        FileTypeDetector::detect(&name, None)
    };

    Ok(FileDescriptor {
        path: opts.path.to_string(),
        name,
        size: stat.size,
        modified: stat.modified,
        extension,
        kind,
        fs,
    })
}

async fn read_header(fs: &dyn FileSystem, path: &str) -> Result<Vec<u8>> {
    let reader = fs.open(path).await?;
    let mut header = Vec::with_capacity(HEADER_SNIFF_LEN);
    reader
        .take(HEADER_SNIFF_LEN as u64)
        .read_to_end(&mut header)
        .await?;
    Ok(header)
}
