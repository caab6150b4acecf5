use sha2::{Digest, Sha256};

use crate::PreviewSize;

/// Cache key of a rendered preview.
///
/// Hex SHA-256 over the length-prefixed path, the modification time and the
/// size tag, so distinct triples cannot collide by concatenation. The path is
/// hashed as given: two spellings of the same file get different keys.
pub fn preview_cache_key(path: &str, modified_unix: i64, size: PreviewSize) -> String {
    let mut hasher = Sha256::new();
    hasher.update((path.len() as u64).to_be_bytes());
    hasher.update(path.as_bytes());
    hasher.update(modified_unix.to_be_bytes());
    hasher.update([size.tag()]);
    hex::encode(hasher.finalize())
}
