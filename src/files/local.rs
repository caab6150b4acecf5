use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;

use super::{resolve, ContentReader, FileDescriptor, FileOptions, FileResolver, FileStat, FileSystem};
use crate::Result;

/// Local directory exposed as a virtual filesystem rooted at `base_path`.
pub struct LocalFs {
    base_path: PathBuf,
}

impl LocalFs {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_owned(),
        }
    }

    /// Maps a virtual path below the base directory. `..` never climbs
    /// above the base.
    pub fn real_path(&self, path: &str) -> PathBuf {
        self.base_path.join(clean(path))
    }
}

fn clean(path: &str) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => cleaned.push(part),
            Component::ParentDir => {
                cleaned.pop();
            }
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }
    cleaned
}

#[async_trait]
impl FileSystem for LocalFs {
    async fn stat(&self, path: &str) -> std::io::Result<FileStat> {
        let metadata = fs::metadata(self.real_path(path)).await?;
        Ok(FileStat {
            is_dir: metadata.is_dir(),
            size: metadata.len(),
            modified: DateTime::<Utc>::from(metadata.modified()?),
        })
    }

    async fn open(&self, path: &str) -> std::io::Result<ContentReader> {
        let file = fs::File::open(self.real_path(path)).await?;
        Ok(Box::new(file))
    }
}

/// Resolves paths inside `root/<user scope>`.
pub struct LocalResolver {
    root: PathBuf,
}

impl LocalResolver {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_owned(),
        }
    }
}

#[async_trait]
impl FileResolver for LocalResolver {
    async fn resolve(&self, opts: FileOptions<'_>) -> Result<FileDescriptor> {
        let scoped = LocalFs::new(self.root.join(clean(&opts.user.scope)));
        resolve(Arc::new(scoped), &opts).await
    }
}
