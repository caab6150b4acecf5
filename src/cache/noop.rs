use async_trait::async_trait;

use super::FileCache;
use crate::Result;

/// Cache that keeps nothing; every load misses.
pub struct NoOpCache;

#[async_trait]
impl FileCache for NoOpCache {
    async fn store(&self, _key: &str, _value: &[u8]) -> Result<()> {
        Ok(())
    }

    async fn load(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }

    async fn delete(&self, _key: &str) -> Result<()> {
        Ok(())
    }
}
