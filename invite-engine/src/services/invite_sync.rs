//! Real-time invite state: a per-session task that follows the user's own
//! invite record and republishes aggregated snapshots.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use document_store::{DocumentStore, StoreError};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

use crate::domain::collections;
use crate::domain::models::{AggregatedInvite, Invite, InviteStatus, UserId};
use crate::error::{EngineError, EngineResult};
use crate::services::aggregator::InviteAggregator;
use crate::session::SessionContext;

/// The invite record a user currently holds, with its aggregated view.
#[derive(Debug, Clone, PartialEq)]
pub struct InviteSnapshot {
    pub invite: Invite,
    pub view: AggregatedInvite,
}

/// Long-lived subscription to `invites/{self}`.
///
/// Every committed change to the user's own record replaces the in-memory
/// state and triggers re-aggregation; the result streams out as
/// `Option<InviteSnapshot>` through a watch channel (`None` = no known
/// invite). One synchronizer is created per session and torn down with
/// [`shutdown`](Self::shutdown), which unregisters the store listener.
pub struct InviteSynchronizer {
    store: Arc<dyn DocumentStore>,
    uid: UserId,
    snapshots: watch::Receiver<Option<InviteSnapshot>>,
    stopped: Arc<AtomicBool>,
    cancel: Arc<Notify>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl InviteSynchronizer {
    /// Subscribe to the session user's invite key and start following it.
    ///
    /// The subscription replays the record's current value as its first
    /// change, so the task starts from a consistent snapshot and every later
    /// change arrives in commit order behind it.
    pub async fn start(
        store: Arc<dyn DocumentStore>,
        aggregator: InviteAggregator,
        session: &SessionContext,
    ) -> Self {
        let uid = session.uid();
        let mut subscription = store.subscribe(collections::INVITES, &uid.to_string()).await;

        let (tx, rx) = watch::channel(None);
        let stopped = Arc::new(AtomicBool::new(false));
        let cancel = Arc::new(Notify::new());

        let task_stopped = Arc::clone(&stopped);
        let task_cancel = Arc::clone(&cancel);
        let task = tokio::spawn(async move {
            tracing::debug!(%uid, "invite synchronizer started");

            loop {
                tokio::select! {
                    _ = task_cancel.notified() => break,
                    change = subscription.next_change() => {
                        let Some(change) = change else {
                            // Channel failure degrades to "no known invite";
                            // the caller may start a fresh synchronizer.
                            tracing::warn!(%uid, "invite subscription closed, clearing state");
                            publish(&tx, None);
                            break;
                        };

                        let invite = change.value.and_then(|doc| decode_invite(doc, uid));
                        let snapshot = match invite {
                            Some(invite) => {
                                let view = aggregator.aggregate(&invite).await;
                                Some(InviteSnapshot { invite, view })
                            }
                            None => None,
                        };

                        // A shutdown that raced the aggregation wins: the
                        // fetched result is discarded, not applied.
                        if task_stopped.load(Ordering::SeqCst) {
                            break;
                        }
                        publish(&tx, snapshot);
                    }
                }
            }
            tracing::debug!(%uid, "invite synchronizer stopped");
            // Dropping `subscription` unregisters the store listener.
        });

        Self {
            store,
            uid,
            snapshots: rx,
            stopped,
            cancel,
            task: Mutex::new(Some(task)),
        }
    }

    /// Watch stream of aggregated snapshots for this session.
    pub fn snapshots(&self) -> watch::Receiver<Option<InviteSnapshot>> {
        self.snapshots.clone()
    }

    /// Latest known state, without waiting.
    pub fn current(&self) -> Option<InviteSnapshot> {
        self.snapshots.borrow().clone()
    }

    /// Accept the pending invite on this user's record.
    pub async fn accept(&self) -> EngineResult<Invite> {
        self.respond(InviteStatus::Accepted).await
    }

    /// Decline the pending invite on this user's record.
    pub async fn decline(&self) -> EngineResult<Invite> {
        self.respond(InviteStatus::Rejected).await
    }

    async fn respond(&self, to: InviteStatus) -> EngineResult<Invite> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(EngineError::Subscription(
                "synchronizer is shut down".to_string(),
            ));
        }

        let key = self.uid.to_string();
        let doc = self
            .store
            .get(collections::INVITES, &key)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("invite for {}", self.uid)))?;
        let mut invite: Invite = serde_json::from_value(doc).map_err(StoreError::from)?;

        if !invite.status.can_transition_to(to) {
            return Err(EngineError::InvalidTransition {
                from: invite.status,
                to,
            });
        }
        invite.status = to;

        let doc = serde_json::to_value(&invite).map_err(StoreError::from)?;
        self.store.put(collections::INVITES, &key, doc).await?;
        tracing::info!(uid = %self.uid, status = ?to, "invite response recorded");
        Ok(invite)
    }

    /// Tear the synchronizer down. Idempotent and callable at any point in
    /// the lifecycle; in-flight aggregation finishes but its result is
    /// discarded.
    pub fn shutdown(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            self.cancel.notify_one();
        }
    }

    /// Wait for the background task to wind down after [`shutdown`](Self::shutdown).
    pub async fn join(&self) {
        let task = {
            let mut guard = self.task.lock().expect("task lock poisoned");
            guard.take()
        };
        if let Some(task) = task {
            let _ = task.await;
        }
    }
}

impl Drop for InviteSynchronizer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn publish(tx: &watch::Sender<Option<InviteSnapshot>>, snapshot: Option<InviteSnapshot>) {
    // Only a real state change wakes watchers; the replayed first change of
    // a fresh subscription must not produce a spurious notification.
    tx.send_if_modified(|current| {
        if *current == snapshot {
            false
        } else {
            *current = snapshot;
            true
        }
    });
}

fn decode_invite(doc: document_store::Document, uid: UserId) -> Option<Invite> {
    match serde_json::from_value(doc) {
        Ok(invite) => Some(invite),
        Err(err) => {
            tracing::warn!(%uid, error = %err, "undecodable invite record, treating as none");
            None
        }
    }
}
