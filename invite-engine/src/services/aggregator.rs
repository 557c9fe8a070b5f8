//! Denormalized invite views: resolve every participant's profile and
//! avatar with a concurrent fan-out read.

use std::time::Duration;

use futures::future::join_all;

use crate::config::AggregationConfig;
use crate::domain::models::{AggregatedInvite, Invite, Participant, UserId};
use crate::services::profiles::ProfileService;

/// Builds display-ready composites from raw invite records.
#[derive(Clone)]
pub struct InviteAggregator {
    profiles: ProfileService,
    config: AggregationConfig,
}

impl InviteAggregator {
    pub fn new(profiles: ProfileService, config: AggregationConfig) -> Self {
        Self { profiles, config }
    }

    /// Resolve `{host} ∪ invitees` into profiles and avatars.
    ///
    /// All participants are fetched concurrently, and within one participant
    /// the profile document and the avatar blob are fetched concurrently too
    /// (each avatar costs a ref lookup plus a byte fetch). A participant
    /// whose lookups fail or time out is kept with `None` fields; one
    /// unreachable profile never sinks the whole view.
    ///
    /// `users` lists the non-host invitees in invite-list order; the host
    /// only ever appears in `host`.
    pub async fn aggregate(&self, invite: &Invite) -> AggregatedInvite {
        // Host first, then invitees in order, dropping the host's own entry
        // and any duplicate.
        let mut uids: Vec<UserId> = Vec::with_capacity(invite.invitee_uids.len() + 1);
        uids.push(invite.host_uid);
        for uid in &invite.invitee_uids {
            if !uids.contains(uid) {
                uids.push(*uid);
            }
        }

        let mut participants = join_all(uids.into_iter().map(|uid| self.resolve(uid))).await;

        let host = participants.remove(0);
        AggregatedInvite {
            host,
            users: participants,
        }
    }

    async fn resolve(&self, uid: UserId) -> Participant {
        let timeout = Duration::from_millis(self.config.fetch_timeout_ms);
        let (profile, avatar) = tokio::join!(
            tokio::time::timeout(timeout, self.profiles.fetch_profile(uid)),
            tokio::time::timeout(timeout, self.profiles.fetch_avatar(uid)),
        );

        let profile = match profile {
            Ok(Ok(profile)) => profile,
            Ok(Err(err)) => {
                tracing::warn!(%uid, error = %err, "profile fetch failed, rendering empty");
                None
            }
            Err(_) => {
                tracing::warn!(%uid, "profile fetch timed out, rendering empty");
                None
            }
        };
        let avatar = match avatar {
            Ok(Ok(avatar)) => avatar,
            Ok(Err(err)) => {
                tracing::warn!(%uid, error = %err, "avatar fetch failed, rendering empty");
                None
            }
            Err(_) => {
                tracing::warn!(%uid, "avatar fetch timed out, rendering empty");
                None
            }
        };

        Participant {
            uid,
            profile,
            avatar,
        }
    }
}
