//! In-memory `DocumentStore` used by the engine's tests and local runs.

use std::collections::HashMap;
use std::sync::{Arc, RwLock as StdRwLock};

use async_trait::async_trait;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::{Document, DocumentChange, DocumentStore, Subscription};

type CollectionMap = HashMap<String, HashMap<String, Document>>;
type WatcherMap = HashMap<(String, String), HashMap<Uuid, UnboundedSender<DocumentChange>>>;

/// Key-value document store backed by process memory.
///
/// `put_many` applies the whole batch under a single write guard, which is
/// what makes the batch atomic with respect to readers and watchers.
/// Watcher notification happens while the write guard is still held, so a
/// single key's changes reach each subscriber in commit order, and the
/// replayed value a new subscription starts with slots into that same order.
pub struct MemoryStore {
    documents: RwLock<CollectionMap>,
    watchers: Arc<StdRwLock<WatcherMap>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            watchers: Arc::new(StdRwLock::new(HashMap::new())),
        }
    }

    /// Number of live subscriptions on one key.
    pub fn watcher_count(&self, collection: &str, key: &str) -> usize {
        let watchers = self.watchers.read().expect("watcher lock poisoned");
        watchers
            .get(&(collection.to_string(), key.to_string()))
            .map(|senders| senders.len())
            .unwrap_or(0)
    }

    fn notify(&self, collection: &str, key: &str, value: Option<Document>) {
        let watchers = self.watchers.read().expect("watcher lock poisoned");
        let Some(senders) = watchers.get(&(collection.to_string(), key.to_string())) else {
            return;
        };

        let change = DocumentChange {
            collection: collection.to_string(),
            key: key.to_string(),
            value,
        };
        for sender in senders.values() {
            // A send failure means the receiver is mid-teardown; the cancel
            // hook removes the entry.
            let _ = sender.send(change.clone());
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents
            .get(collection)
            .and_then(|docs| docs.get(key))
            .cloned())
    }

    async fn put(&self, collection: &str, key: &str, value: Document) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        documents
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), value.clone());
        self.notify(collection, key, Some(value));
        Ok(())
    }

    async fn put_many(&self, entries: Vec<(String, String, Document)>) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        for (collection, key, value) in &entries {
            documents
                .entry(collection.clone())
                .or_default()
                .insert(key.clone(), value.clone());
        }
        // Still under the write guard: readers either saw none of the batch
        // or all of it, and watchers observe it after commit.
        for (collection, key, value) in entries {
            self.notify(&collection, &key, Some(value));
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        let removed = documents
            .get_mut(collection)
            .and_then(|docs| docs.remove(key));
        if removed.is_some() {
            self.notify(collection, key, None);
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        predicate: &(dyn for<'a> Fn(&'a Document) -> bool + Send + Sync),
    ) -> Result<Vec<(String, Document)>, StoreError> {
        let documents = self.documents.read().await;
        let Some(docs) = documents.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<(String, Document)> = docs
            .iter()
            .filter(|(_, doc)| predicate(doc))
            .map(|(key, doc)| (key.clone(), doc.clone()))
            .collect();
        // HashMap iteration order is arbitrary; keep results stable for
        // callers and tests.
        matches.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(matches)
    }

    async fn subscribe(&self, collection: &str, key: &str) -> Subscription {
        let id = Uuid::new_v4();
        let topic = (collection.to_string(), key.to_string());
        let (tx, rx) = mpsc::unbounded_channel();

        {
            // Commits hold the document write guard while notifying, so
            // holding the read guard across the replay and the registration
            // means every commit lands either in the replayed value or in
            // the feed, never in neither and never in both out of order.
            let documents = self.documents.read().await;
            let current = documents
                .get(collection)
                .and_then(|docs| docs.get(key))
                .cloned();
            let _ = tx.send(DocumentChange {
                collection: topic.0.clone(),
                key: topic.1.clone(),
                value: current,
            });

            let mut watchers = self.watchers.write().expect("watcher lock poisoned");
            watchers.entry(topic.clone()).or_default().insert(id, tx);
        }
        tracing::debug!(collection, key, %id, "subscription registered");

        let registry = Arc::clone(&self.watchers);
        Subscription::new(
            rx,
            Box::new(move || {
                let mut watchers = registry.write().expect("watcher lock poisoned");
                if let Some(senders) = watchers.get_mut(&topic) {
                    senders.remove(&id);
                    if senders.is_empty() {
                        watchers.remove(&topic);
                    }
                }
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = MemoryStore::new();
        assert!(store.get("users", "nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_is_last_write_wins() {
        let store = MemoryStore::new();

        store
            .put("invites", "u1", json!({"status": "pending"}))
            .await
            .unwrap();
        store
            .put("invites", "u1", json!({"status": "accepted"}))
            .await
            .unwrap();

        let doc = store.get("invites", "u1").await.unwrap().unwrap();
        assert_eq!(doc, json!({"status": "accepted"}));
    }

    #[tokio::test]
    async fn test_put_many_commits_every_entry() {
        let store = MemoryStore::new();

        store
            .put_many(vec![
                ("invites".into(), "a".into(), json!({"n": 1})),
                ("invites".into(), "b".into(), json!({"n": 2})),
                ("invites".into(), "c".into(), json!({"n": 3})),
            ])
            .await
            .unwrap();

        for key in ["a", "b", "c"] {
            assert!(store.get("invites", key).await.unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn test_query_filters_by_predicate() {
        let store = MemoryStore::new();
        store
            .put("friends", "f1", json!({"userUid": "u1", "friendUid": "u2"}))
            .await
            .unwrap();
        store
            .put("friends", "f2", json!({"userUid": "u3", "friendUid": "u1"}))
            .await
            .unwrap();

        let matches = store
            .query("friends", &|doc| {
                doc.get("userUid").and_then(|v| v.as_str()) == Some("u1")
            })
            .await
            .unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].0, "f1");
    }

    #[tokio::test]
    async fn test_put_many_is_invisible_to_readers_until_commit() {
        let store = Arc::new(MemoryStore::new());
        let batch: Vec<_> = (0..200)
            .map(|n| ("invites".to_string(), format!("k{n:03}"), json!({"n": n})))
            .collect();
        let total = batch.len();

        let writer = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.put_many(batch).await })
        };

        // Readers racing the batch may see the store before or after the
        // commit, never in between.
        loop {
            let seen = store.query("invites", &|_| true).await.unwrap().len();
            assert!(
                seen == 0 || seen == total,
                "reader saw a partial batch: {seen} of {total}"
            );
            if seen == total {
                break;
            }
            tokio::task::yield_now().await;
        }
        writer.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_subscribe_replays_current_value_first() {
        let store = MemoryStore::new();
        store.put("invites", "u1", json!({"n": 1})).await.unwrap();

        let mut sub = store.subscribe("invites", "u1").await;
        assert_eq!(sub.next_change().await.unwrap().value, Some(json!({"n": 1})));

        let mut fresh = store.subscribe("invites", "nobody").await;
        assert_eq!(fresh.next_change().await.unwrap().value, None);
    }

    #[tokio::test]
    async fn test_subscription_sees_changes_in_commit_order() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe("invites", "u1").await;

        store.put("invites", "u1", json!({"n": 1})).await.unwrap();
        store.put("invites", "u1", json!({"n": 2})).await.unwrap();
        store.delete("invites", "u1").await.unwrap();

        assert_eq!(sub.next_change().await.unwrap().value, None); // replay
        assert_eq!(sub.next_change().await.unwrap().value, Some(json!({"n": 1})));
        assert_eq!(sub.next_change().await.unwrap().value, Some(json!({"n": 2})));
        assert_eq!(sub.next_change().await.unwrap().value, None);
    }

    #[tokio::test]
    async fn test_subscription_is_scoped_to_its_key() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe("invites", "u1").await;
        sub.next_change().await.unwrap(); // replay

        store.put("invites", "u2", json!({"n": 1})).await.unwrap();
        store.put("users", "u1", json!({"n": 2})).await.unwrap();

        match tokio::time::timeout(std::time::Duration::from_millis(10), sub.next_change()).await {
            Ok(_) => panic!("subscriber should not see other keys"),
            Err(_) => {} // expected timeout
        }
    }

    #[tokio::test]
    async fn test_unsubscribe_unregisters_watcher() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe("invites", "u1").await;
        assert_eq!(store.watcher_count("invites", "u1"), 1);

        sub.unsubscribe();
        assert_eq!(store.watcher_count("invites", "u1"), 0);

        // Repeated calls stay safe.
        sub.unsubscribe();
        assert_eq!(store.watcher_count("invites", "u1"), 0);
    }

    #[tokio::test]
    async fn test_dropping_subscription_unregisters_watcher() {
        let store = MemoryStore::new();
        let sub = store.subscribe("invites", "u1").await;
        assert_eq!(store.watcher_count("invites", "u1"), 1);

        drop(sub);
        assert_eq!(store.watcher_count("invites", "u1"), 0);
    }

    #[tokio::test]
    async fn test_delete_missing_key_notifies_nobody() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe("invites", "u1").await;
        sub.next_change().await.unwrap(); // replay

        store.delete("invites", "u1").await.unwrap();

        match tokio::time::timeout(std::time::Duration::from_millis(10), sub.next_change()).await {
            Ok(_) => panic!("delete of a missing key must not emit a change"),
            Err(_) => {} // expected timeout
        }
    }
}
