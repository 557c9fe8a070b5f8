pub mod blob;
pub mod error;
pub mod memory;
pub mod store;

pub use blob::{BlobRef, BlobStore, MemoryBlobStore};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use store::{Document, DocumentChange, DocumentStore, Subscription};
