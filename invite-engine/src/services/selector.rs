//! Random invitee selection.

use rand::seq::index;
use rand::Rng;

use crate::domain::models::UserId;

/// Pick `desired` distinct invitees uniformly at random from `friends`.
///
/// `friends` is a deduplicated snapshot of the host's friend list taken at
/// selection time. Returns min(desired, friends.len()) uids with no repeats;
/// an empty friend list yields an empty selection and callers must not
/// proceed to fan-out.
///
/// Index sampling is without replacement, so the draw completes in bounded
/// time even when every friend gets picked.
pub fn select_invitees(friends: &[UserId], desired: usize, rng: &mut impl Rng) -> Vec<UserId> {
    let count = desired.min(friends.len());
    if count == 0 {
        return Vec::new();
    }

    index::sample(rng, friends.len(), count)
        .iter()
        .map(|i| friends[i])
        .collect()
}
