pub mod handle;
pub mod interests;
pub mod models;

/// Collection names in the document store.
pub mod collections {
    pub const USERS: &str = "users";
    pub const FRIENDS: &str = "friends";
    pub const INVITES: &str = "invites";
}
