//! Friend graph reads and mirrored-pair edge creation.

use std::collections::HashSet;
use std::sync::Arc;

use document_store::{DocumentStore, StoreError};
use uuid::Uuid;

use crate::domain::collections;
use crate::domain::handle::Handle;
use crate::domain::models::{Friendship, UserId};
use crate::error::{EngineError, EngineResult};
use crate::session::SessionContext;

/// Friend graph over the shared `friends` collection.
///
/// The collection is multi-writer and externally synchronized; this service
/// never assumes exclusive access. Reads treat the mirrored record pair as a
/// single undirected edge and tolerate a missing mirror half.
#[derive(Clone)]
pub struct FriendGraph {
    store: Arc<dyn DocumentStore>,
}

impl FriendGraph {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create the friendship between the session user and `other`.
    ///
    /// Both directional records commit in one atomic batch, so the mirrored
    /// pair either fully exists or not at all. Re-adding an existing
    /// friendship (in either direction) is rejected without writing.
    pub async fn add_friendship(
        &self,
        session: &SessionContext,
        other: UserId,
    ) -> EngineResult<()> {
        let me = session.uid();
        if me == other {
            return Err(EngineError::Validation(
                "cannot friend yourself".to_string(),
            ));
        }
        if self.are_friends(me, other).await? {
            return Err(EngineError::Validation(
                "users are already friends".to_string(),
            ));
        }

        let edge = Friendship {
            user_uid: me,
            friend_uid: other,
        };
        let entries = vec![
            (
                collections::FRIENDS.to_string(),
                Uuid::new_v4().to_string(),
                serde_json::to_value(&edge).map_err(StoreError::from)?,
            ),
            (
                collections::FRIENDS.to_string(),
                Uuid::new_v4().to_string(),
                serde_json::to_value(edge.mirrored()).map_err(StoreError::from)?,
            ),
        ];
        self.store.put_many(entries).await?;

        tracing::info!(user = %me, friend = %other, "friendship created");
        Ok(())
    }

    /// Whether any edge record connects `a` and `b`, in either direction.
    pub async fn are_friends(&self, a: UserId, b: UserId) -> EngineResult<bool> {
        let (a_s, b_s) = (a.to_string(), b.to_string());
        let matches = self
            .store
            .query(collections::FRIENDS, &move |doc: &serde_json::Value| {
                let user = doc.get("userUid").and_then(|v| v.as_str());
                let friend = doc.get("friendUid").and_then(|v| v.as_str());
                (user == Some(&a_s) && friend == Some(&b_s))
                    || (user == Some(&b_s) && friend == Some(&a_s))
            })
            .await?;
        Ok(!matches.is_empty())
    }

    /// Deduplicated friend uids of `uid`.
    ///
    /// Union of outgoing and incoming records: a half-written pair still
    /// counts as one logical edge.
    pub async fn friends_of(&self, uid: UserId) -> EngineResult<Vec<UserId>> {
        let uid_s = uid.to_string();
        let either_side = {
            let uid_s = uid_s.clone();
            move |doc: &serde_json::Value| {
                doc.get("userUid").and_then(|v| v.as_str()) == Some(&uid_s)
                    || doc.get("friendUid").and_then(|v| v.as_str()) == Some(&uid_s)
            }
        };

        let records = self.store.query(collections::FRIENDS, &either_side).await?;

        let mut seen = HashSet::new();
        let mut friends = Vec::new();
        for (_, doc) in records {
            let edge: Friendship =
                serde_json::from_value(doc).map_err(StoreError::from)?;
            let other = if edge.user_uid == uid {
                edge.friend_uid
            } else {
                edge.user_uid
            };
            if other != uid && seen.insert(other) {
                friends.push(other);
            }
        }
        Ok(friends)
    }

    /// Resolve a `username#1234` handle to a uid, if such a user exists.
    pub async fn find_by_handle(&self, handle: &Handle) -> EngineResult<Option<UserId>> {
        let (username, discriminator) = (handle.username.clone(), handle.discriminator.clone());
        let matches = self
            .store
            .query(collections::USERS, &move |doc: &serde_json::Value| {
                doc.get("username").and_then(|v| v.as_str()) == Some(&username)
                    && doc.get("discriminator").and_then(|v| v.as_str()) == Some(&discriminator)
            })
            .await?;

        Ok(matches
            .into_iter()
            .find_map(|(key, _)| Uuid::parse_str(&key).ok()))
    }
}
