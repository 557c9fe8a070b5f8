use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque user identity assigned by the auth collaborator.
pub type UserId = Uuid;

/// User profile document, stored at `users/{uid}`.
///
/// Field names follow the document-store wire shape (camelCase).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub username: String,
    /// 4-digit suffix disambiguating users sharing a username.
    pub discriminator: String,
    #[serde(default)]
    pub interests: Vec<Interest>,
    /// True once onboarding finished (name, interests, avatar all set).
    #[serde(default)]
    pub is_done: bool,
}

/// One entry of the fixed interest catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interest {
    pub id: String,
    pub name: String,
}

/// One directed half of a friendship edge, stored at `friends/{auto-id}`.
///
/// Accepted friendships exist as a mirrored pair of these records; readers
/// treat the pair as a single undirected edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Friendship {
    pub user_uid: UserId,
    pub friend_uid: UserId,
}

impl Friendship {
    pub fn mirrored(&self) -> Friendship {
        Friendship {
            user_uid: self.friend_uid,
            friend_uid: self.user_uid,
        }
    }
}

/// Lifecycle of one participant's invite record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteStatus {
    Pending,
    Accepted,
    Rejected,
}

impl InviteStatus {
    /// Accepted and Rejected are terminal; only a pending invite moves.
    pub fn is_terminal(&self) -> bool {
        matches!(self, InviteStatus::Accepted | InviteStatus::Rejected)
    }

    pub fn can_transition_to(&self, next: InviteStatus) -> bool {
        matches!(
            (self, next),
            (
                InviteStatus::Pending,
                InviteStatus::Accepted | InviteStatus::Rejected
            )
        )
    }
}

/// What, when and where of an event. Set once at creation, immutable after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    /// Interest id from the catalog the event is about.
    pub activity_id: String,
    pub starts_at: DateTime<Utc>,
    /// Free-text meeting place.
    pub location: String,
}

/// One participant's view of a shared invite, stored at `invites/{uid}`.
///
/// Records are keyed by the *owning participant's* uid, not by an invite id,
/// so a participant holds at most one active invite at a time: a new fan-out
/// involving them replaces whatever record they had (last-write-wins). That
/// single-invite-at-a-time rule is a deliberate invariant of this model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invite {
    pub status: InviteStatus,
    pub event_details: EventDetails,
    pub host_uid: UserId,
    /// The uid owning this record; equals `host_uid` on the host's record.
    pub invitee_uid: UserId,
    /// Full ordered invitee list, identical across the invite's records.
    pub invitee_uids: Vec<UserId>,
}

/// One participant resolved for display. Optional fields stay `None` when
/// that participant's profile or avatar could not be fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub uid: UserId,
    pub profile: Option<UserProfile>,
    pub avatar: Option<Vec<u8>>,
}

/// Display-ready composite of an invite: host plus non-host invitees, in
/// invitee-list order. Derived on demand, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedInvite {
    pub host: Participant,
    pub users: Vec<Participant>,
}
