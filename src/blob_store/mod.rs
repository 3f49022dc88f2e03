mod local;

pub use local::LocalStore;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::io::AsyncRead;

#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Blob not found: {0}")]
    NotFound(String),
    #[error("Invalid blob key: {0}")]
    InvalidKey(String),
}

/// An open blob ready to be streamed.
pub struct BlobReader {
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
    pub size: u64,
}

impl std::fmt::Debug for BlobReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobReader")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Abstraction over the place uploaded bytes live.
/// Keys are generated storage names -- flat, never containing a path separator.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), BlobStoreError>;
    async fn open(&self, key: &str) -> Result<BlobReader, BlobStoreError>;
    async fn delete(&self, key: &str) -> Result<(), BlobStoreError>;
    async fn exists(&self, key: &str) -> Result<bool, BlobStoreError>;
}

/// Reject keys that could escape the store root.
pub fn validate_key(key: &str) -> Result<(), BlobStoreError> {
    let bad = key.is_empty()
        || key == "."
        || key.contains("..")
        || key.contains('/')
        || key.contains('\\')
        || key.contains('\0');
    if bad {
        return Err(BlobStoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}
