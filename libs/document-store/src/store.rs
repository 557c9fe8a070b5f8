use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::error::StoreError;

/// Schemaless document payload, as stored in a collection.
pub type Document = serde_json::Value;

/// A committed change to a single key.
///
/// `value` is the full document after the change, or `None` when the
/// document was deleted.
#[derive(Debug, Clone)]
pub struct DocumentChange {
    pub collection: String,
    pub key: String,
    pub value: Option<Document>,
}

/// Key-addressed document store with per-key change subscriptions.
///
/// Writes are last-write-wins: `put` fully replaces any prior document at
/// the key, there is no merge. `put_many` is atomic - either every entry in
/// the batch commits or none does; an implementation that cannot honor that
/// must fail with [`StoreError::PartialWrite`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError>;

    async fn put(&self, collection: &str, key: &str, value: Document) -> Result<(), StoreError>;

    /// Atomic batch write of `(collection, key, document)` entries.
    async fn put_many(&self, entries: Vec<(String, String, Document)>) -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError>;

    /// All documents in `collection` matching `predicate`, with their keys.
    async fn query(
        &self,
        collection: &str,
        predicate: &(dyn for<'a> Fn(&'a Document) -> bool + Send + Sync),
    ) -> Result<Vec<(String, Document)>, StoreError>;

    /// Subscribe to committed changes of one key.
    ///
    /// The first delivered change replays the key's current value (`None`
    /// when no document exists), so subscribers start from a consistent
    /// snapshot without a separate read. Subsequent changes to the key are
    /// delivered in the order the store committed them.
    async fn subscribe(&self, collection: &str, key: &str) -> Subscription;
}

/// Handle for a per-key change feed.
///
/// Dropping the handle unregisters the underlying listener; `unsubscribe`
/// does the same explicitly and is safe to call any number of times.
pub struct Subscription {
    rx: UnboundedReceiver<DocumentChange>,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(rx: UnboundedReceiver<DocumentChange>, cancel: Box<dyn FnOnce() + Send>) -> Self {
        Self {
            rx,
            cancel: Some(cancel),
        }
    }

    /// Next change, or `None` once the feed is closed.
    pub async fn next_change(&mut self) -> Option<DocumentChange> {
        self.rx.recv().await
    }

    /// Unregister the listener. Idempotent.
    pub fn unsubscribe(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
            self.rx.close();
        }
    }

    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
