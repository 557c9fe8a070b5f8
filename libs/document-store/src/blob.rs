//! Blob store contract: opaque binary payloads addressed by key.
//!
//! Retrieval is deliberately two-step (ref lookup, then byte fetch) to match
//! remote blob backends where the download location is resolved first.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;

/// Resolved download location for a stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobRef(pub String);

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` at `key`, replacing any existing blob.
    async fn upload(&self, key: &str, bytes: Vec<u8>) -> Result<(), StoreError>;

    /// Resolve the download location for `key`.
    ///
    /// Fails with [`StoreError::BlobMissing`] when no blob exists there.
    async fn download_ref(&self, key: &str) -> Result<BlobRef, StoreError>;

    /// Fetch the payload behind a previously resolved ref.
    async fn fetch(&self, blob_ref: &BlobRef) -> Result<Vec<u8>, StoreError>;
}

const MEM_SCHEME: &str = "mem://";

/// In-memory `BlobStore` issuing `mem://` refs.
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, key: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        let mut blobs = self.blobs.write().await;
        blobs.insert(key.to_string(), bytes);
        Ok(())
    }

    async fn download_ref(&self, key: &str) -> Result<BlobRef, StoreError> {
        let blobs = self.blobs.read().await;
        if blobs.contains_key(key) {
            Ok(BlobRef(format!("{MEM_SCHEME}{key}")))
        } else {
            Err(StoreError::BlobMissing(key.to_string()))
        }
    }

    async fn fetch(&self, blob_ref: &BlobRef) -> Result<Vec<u8>, StoreError> {
        let key = blob_ref
            .0
            .strip_prefix(MEM_SCHEME)
            .ok_or_else(|| StoreError::Backend(format!("foreign blob ref: {}", blob_ref.0)))?;

        let blobs = self.blobs.read().await;
        blobs
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::BlobMissing(key.to_string()))
    }
}
