use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;
use uuid::Uuid;

use super::FileCache;
use crate::Result;

/// One file per key, sharded by the key's SHA-256: `dir/a/bc/abc…`.
pub struct DiskCache {
    base_path: PathBuf,
}

impl DiskCache {
    pub async fn new<P: AsRef<Path>>(base_path: P) -> Result<Self> {
        let base_path = base_path.as_ref().to_owned();
        fs::create_dir_all(&base_path).await?;
        Ok(Self { base_path })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let hash = hex::encode(Sha256::digest(key.as_bytes()));
        self.base_path.join(&hash[..1]).join(&hash[1..3]).join(&hash)
    }
}

#[async_trait]
impl FileCache for DiskCache {
    async fn store(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.entry_path(key);
        let dir = path.parent().unwrap_or(&self.base_path);
        fs::create_dir_all(dir).await?;

        // readers only ever see complete entries
        let tmp = dir.join(format!(".{}.tmp", Uuid::new_v4()));
        if let Err(e) = fs::write(&tmp, value).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.entry_path(key)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.entry_path(key)).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
