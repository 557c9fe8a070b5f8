//! Explicit session context replacing ambient "current user" state.

use crate::domain::models::UserId;
use crate::error::{EngineError, EngineResult};

/// Auth collaborator boundary: whoever is signed in right now, if anyone.
pub trait IdentityProvider: Send + Sync {
    fn current_uid(&self) -> Option<UserId>;
}

/// The authenticated identity a flow is running as.
///
/// Constructed once at the top of a flow and passed down; engine components
/// never reach for a process-wide signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionContext {
    uid: UserId,
}

impl SessionContext {
    pub fn new(uid: UserId) -> Self {
        Self { uid }
    }

    /// Resolve the current identity, failing when nobody is signed in.
    pub fn authenticate(provider: &dyn IdentityProvider) -> EngineResult<Self> {
        provider
            .current_uid()
            .map(Self::new)
            .ok_or(EngineError::Unauthenticated)
    }

    pub fn uid(&self) -> UserId {
        self.uid
    }
}

/// Fixed identity provider for tests and local runs.
pub struct FixedIdentity(Option<UserId>);

impl FixedIdentity {
    pub fn signed_in(uid: UserId) -> Self {
        Self(Some(uid))
    }

    pub fn signed_out() -> Self {
        Self(None)
    }
}

impl IdentityProvider for FixedIdentity {
    fn current_uid(&self) -> Option<UserId> {
        self.0
    }
}
