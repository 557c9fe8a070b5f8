/// Error types for store collaborators
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("batch write partially applied: {applied} of {total} entries")]
    PartialWrite { applied: usize, total: usize },

    #[error("blob not found: {0}")]
    BlobMissing(String),

    #[error("backend error: {0}")]
    Backend(String),
}
