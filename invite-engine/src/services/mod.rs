pub mod aggregator;
pub mod friends;
pub mod invite_sync;
pub mod invite_writer;
pub mod profiles;
pub mod selector;

pub use aggregator::InviteAggregator;
pub use friends::FriendGraph;
pub use invite_sync::{InviteSnapshot, InviteSynchronizer};
pub use invite_writer::InviteWriter;
pub use profiles::ProfileService;
pub use selector::select_invitees;
