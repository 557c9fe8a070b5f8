//! Invite fan-out: one record per participant, committed as a batch.

use std::collections::HashSet;
use std::sync::Arc;

use document_store::{Document, DocumentStore, StoreError};

use crate::config::InviteConfig;
use crate::domain::collections;
use crate::domain::interests;
use crate::domain::models::{EventDetails, Invite, InviteStatus, UserId};
use crate::error::{EngineError, EngineResult};
use crate::session::SessionContext;

/// Writes the per-participant invite records for a new event.
#[derive(Clone)]
pub struct InviteWriter {
    store: Arc<dyn DocumentStore>,
    config: InviteConfig,
}

impl InviteWriter {
    pub fn new(store: Arc<dyn DocumentStore>, config: InviteConfig) -> Self {
        Self { store, config }
    }

    /// Fan an invite out to `invitees` on behalf of the session user.
    ///
    /// Produces one record per invitee (`pending`) plus one for the host
    /// (`accepted` - the host attends their own event), every record keyed
    /// by its owner's uid and carrying the same event details and ordered
    /// invitee list. The batch commits atomically; each write overwrites any
    /// invite the participant held before (one active invite per user).
    ///
    /// `invitees` is a snapshot taken at selection time; the friend graph is
    /// not re-read here. Validation failures reject the call before any
    /// write is attempted.
    ///
    /// Returns the host's own record.
    pub async fn create_invite(
        &self,
        session: &SessionContext,
        invitees: &[UserId],
        details: EventDetails,
    ) -> EngineResult<Invite> {
        let host = session.uid();
        self.validate(host, invitees, &details)?;

        let invitee_uids: Vec<UserId> = invitees.to_vec();
        let mut entries: Vec<(String, String, Document)> =
            Vec::with_capacity(invitee_uids.len() + 1);

        // Invitees in selection order, host last.
        for invitee in &invitee_uids {
            let record = Invite {
                status: InviteStatus::Pending,
                event_details: details.clone(),
                host_uid: host,
                invitee_uid: *invitee,
                invitee_uids: invitee_uids.clone(),
            };
            entries.push(Self::entry(*invitee, &record)?);
        }

        let host_record = Invite {
            status: InviteStatus::Accepted,
            event_details: details,
            host_uid: host,
            invitee_uid: host,
            invitee_uids,
        };
        entries.push(Self::entry(host, &host_record)?);

        let total = entries.len();
        match self.store.put_many(entries).await {
            Ok(()) => {
                tracing::info!(
                    host = %host,
                    participants = total,
                    activity = %host_record.event_details.activity_id,
                    "invite fan-out committed"
                );
                Ok(host_record)
            }
            Err(StoreError::PartialWrite { applied, total }) => {
                tracing::error!(host = %host, applied, total, "invite fan-out partially applied");
                Err(EngineError::PartialFanOut { applied, total })
            }
            Err(err) => Err(err.into()),
        }
    }

    fn validate(
        &self,
        host: UserId,
        invitees: &[UserId],
        details: &EventDetails,
    ) -> EngineResult<()> {
        if !interests::is_known(&details.activity_id) {
            return Err(EngineError::Validation(format!(
                "unknown activity: {}",
                details.activity_id
            )));
        }
        if details.location.trim().is_empty() {
            return Err(EngineError::Validation("location is not set".to_string()));
        }
        if invitees.is_empty() {
            return Err(EngineError::Validation(
                "invite needs at least one invitee".to_string(),
            ));
        }
        if invitees.len() > self.config.max_invitees {
            return Err(EngineError::Validation(format!(
                "at most {} invitees per event",
                self.config.max_invitees
            )));
        }
        let distinct: HashSet<_> = invitees.iter().collect();
        if distinct.len() != invitees.len() {
            return Err(EngineError::Validation(
                "invitee list contains duplicates".to_string(),
            ));
        }
        if invitees.contains(&host) {
            return Err(EngineError::Validation(
                "host cannot invite themselves".to_string(),
            ));
        }
        Ok(())
    }

    fn entry(owner: UserId, record: &Invite) -> EngineResult<(String, String, Document)> {
        Ok((
            collections::INVITES.to_string(),
            owner.to_string(),
            serde_json::to_value(record).map_err(StoreError::from)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use document_store::MemoryStore;
    use uuid::Uuid;

    fn writer() -> (InviteWriter, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (
            InviteWriter::new(store.clone(), InviteConfig { max_invitees: 10 }),
            store,
        )
    }

    fn details() -> EventDetails {
        EventDetails {
            activity_id: "boba_runs".to_string(),
            starts_at: Utc::now(),
            location: "Tea Top".to_string(),
        }
    }

    async fn read_invite(store: &MemoryStore, uid: UserId) -> Invite {
        let doc = store
            .get(collections::INVITES, &uid.to_string())
            .await
            .unwrap()
            .expect("invite record missing");
        serde_json::from_value(doc).unwrap()
    }

    #[tokio::test]
    async fn test_fan_out_writes_one_record_per_participant() {
        let (writer, store) = writer();
        let host = Uuid::new_v4();
        let invitees = vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];

        writer
            .create_invite(&SessionContext::new(host), &invitees, details())
            .await
            .unwrap();

        let records = store
            .query(collections::INVITES, &|_| true)
            .await
            .unwrap();
        assert_eq!(records.len(), invitees.len() + 1);

        for invitee in &invitees {
            let record = read_invite(&store, *invitee).await;
            assert_eq!(record.status, InviteStatus::Pending);
            assert_eq!(record.invitee_uid, *invitee);
            assert_eq!(record.host_uid, host);
            assert_eq!(record.invitee_uids, invitees);
        }

        let host_record = read_invite(&store, host).await;
        assert_eq!(host_record.status, InviteStatus::Accepted);
        assert_eq!(host_record.invitee_uid, host);
        assert_eq!(host_record.invitee_uids, invitees);
    }

    #[tokio::test]
    async fn test_new_invite_replaces_participants_previous_record() {
        // Records are keyed by owner uid: a user holds at most one active
        // invite, and a newer fan-out silently wins.
        let (writer, store) = writer();
        let shared = Uuid::new_v4();

        let first_host = Uuid::new_v4();
        writer
            .create_invite(&SessionContext::new(first_host), &[shared], details())
            .await
            .unwrap();
        assert_eq!(read_invite(&store, shared).await.host_uid, first_host);

        let second_host = Uuid::new_v4();
        writer
            .create_invite(&SessionContext::new(second_host), &[shared], details())
            .await
            .unwrap();

        let record = read_invite(&store, shared).await;
        assert_eq!(record.host_uid, second_host);
        assert_eq!(record.status, InviteStatus::Pending);

        // The first host's own record is untouched.
        assert_eq!(read_invite(&store, first_host).await.host_uid, first_host);
    }

    #[tokio::test]
    async fn test_validation_rejects_before_any_write() {
        let (writer, store) = writer();
        let host = SessionContext::new(Uuid::new_v4());
        let friend = Uuid::new_v4();

        let cases: Vec<(Vec<UserId>, EventDetails)> = vec![
            // empty invitee set
            (vec![], details()),
            // duplicate invitees
            (vec![friend, friend], details()),
            // host invites themselves
            (vec![host.uid()], details()),
            // unknown activity
            (
                vec![friend],
                EventDetails {
                    activity_id: "skydiving".to_string(),
                    ..details()
                },
            ),
            // blank location
            (
                vec![friend],
                EventDetails {
                    location: "   ".to_string(),
                    ..details()
                },
            ),
        ];

        for (invitees, details) in cases {
            let result = writer.create_invite(&host, &invitees, details).await;
            assert!(matches!(result, Err(EngineError::Validation(_))));
        }

        let records = store
            .query(collections::INVITES, &|_| true)
            .await
            .unwrap();
        assert!(records.is_empty(), "validation failures must not write");
    }

    #[tokio::test]
    async fn test_invitee_cap_is_enforced() {
        let store = Arc::new(MemoryStore::new());
        let writer = InviteWriter::new(store, InviteConfig { max_invitees: 2 });
        let host = SessionContext::new(Uuid::new_v4());
        let invitees = vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];

        let result = writer.create_invite(&host, &invitees, details()).await;
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }

    /// Store whose batch writes always land partially.
    struct PartialBatchStore;

    #[async_trait::async_trait]
    impl DocumentStore for PartialBatchStore {
        async fn get(&self, _: &str, _: &str) -> Result<Option<Document>, StoreError> {
            Ok(None)
        }

        async fn put(&self, _: &str, _: &str, _: Document) -> Result<(), StoreError> {
            Ok(())
        }

        async fn put_many(
            &self,
            entries: Vec<(String, String, Document)>,
        ) -> Result<(), StoreError> {
            Err(StoreError::PartialWrite {
                applied: 1,
                total: entries.len(),
            })
        }

        async fn delete(&self, _: &str, _: &str) -> Result<(), StoreError> {
            Ok(())
        }

        async fn query(
            &self,
            _: &str,
            _: &(dyn for<'a> Fn(&'a Document) -> bool + Send + Sync),
        ) -> Result<Vec<(String, Document)>, StoreError> {
            Ok(Vec::new())
        }

        async fn subscribe(&self, _: &str, _: &str) -> document_store::Subscription {
            let (_tx, rx) = tokio::sync::mpsc::unbounded_channel();
            document_store::Subscription::new(rx, Box::new(|| {}))
        }
    }

    #[tokio::test]
    async fn test_partial_batch_write_surfaces_as_partial_fan_out() {
        let writer = InviteWriter::new(
            Arc::new(PartialBatchStore),
            InviteConfig { max_invitees: 10 },
        );
        let host = SessionContext::new(Uuid::new_v4());

        let result = writer
            .create_invite(&host, &[Uuid::new_v4()], details())
            .await;

        match result {
            Err(EngineError::PartialFanOut { applied, total }) => {
                assert_eq!(applied, 1);
                assert_eq!(total, 2, "one invitee record plus the host's");
            }
            other => panic!("expected PartialFanOut, got {other:?}"),
        }
    }
}
