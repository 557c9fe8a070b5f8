//! Profile documents and avatar blobs: onboarding writes plus the reads the
//! aggregator fans out over.

use std::sync::Arc;

use document_store::{BlobStore, DocumentStore, StoreError};
use rand::Rng;

use crate::domain::collections;
use crate::domain::handle::DISCRIMINATOR_LEN;
use crate::domain::interests;
use crate::domain::models::{Interest, UserId, UserProfile};
use crate::error::{EngineError, EngineResult};
use crate::session::SessionContext;

const MAX_NAME_LEN: usize = 30;

/// Blob key for a user's avatar.
pub fn avatar_key(uid: &UserId) -> String {
    format!("{uid}.jpg")
}

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn DocumentStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }

    /// Create the profile document at registration time.
    ///
    /// The discriminator is drawn from the injected rng so two users can
    /// share a username; collisions across the *same* username are accepted
    /// at this scale.
    pub async fn create_profile<R: Rng>(
        &self,
        session: &SessionContext,
        name: &str,
        username: &str,
        rng: &mut R,
    ) -> EngineResult<UserProfile> {
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(EngineError::Validation(format!(
                "name must be 1..={MAX_NAME_LEN} characters"
            )));
        }
        if username.is_empty() || username.contains('#') {
            return Err(EngineError::Validation(
                "username must be non-empty and free of '#'".to_string(),
            ));
        }

        let profile = UserProfile {
            name: name.to_string(),
            username: username.to_string(),
            discriminator: format!("{:0width$}", rng.gen_range(0..10_000), width = DISCRIMINATOR_LEN),
            interests: Vec::new(),
            is_done: false,
        };
        self.write(session.uid(), &profile).await?;

        tracing::info!(uid = %session.uid(), username, "profile created");
        Ok(profile)
    }

    /// Onboarding step 2: replace the interest selection.
    pub async fn set_interests(
        &self,
        session: &SessionContext,
        selected: Vec<Interest>,
    ) -> EngineResult<UserProfile> {
        if selected.is_empty() {
            return Err(EngineError::Validation(
                "at least one interest is required".to_string(),
            ));
        }
        if let Some(unknown) = selected.iter().find(|i| !interests::is_known(&i.id)) {
            return Err(EngineError::Validation(format!(
                "unknown interest: {}",
                unknown.id
            )));
        }

        let mut profile = self.require_profile(session.uid()).await?;
        profile.interests = selected;
        self.write(session.uid(), &profile).await?;
        Ok(profile)
    }

    /// Onboarding step 3: store the avatar and mark onboarding finished.
    pub async fn set_avatar(
        &self,
        session: &SessionContext,
        bytes: Vec<u8>,
    ) -> EngineResult<UserProfile> {
        if bytes.is_empty() {
            return Err(EngineError::Validation("avatar is empty".to_string()));
        }

        let mut profile = self.require_profile(session.uid()).await?;
        self.blobs
            .upload(&avatar_key(&session.uid()), bytes)
            .await?;

        profile.is_done = true;
        self.write(session.uid(), &profile).await?;

        tracing::info!(uid = %session.uid(), "onboarding finished");
        Ok(profile)
    }

    pub async fn fetch_profile(&self, uid: UserId) -> EngineResult<Option<UserProfile>> {
        let doc = self.store.get(collections::USERS, &uid.to_string()).await?;
        match doc {
            Some(doc) => {
                let profile = serde_json::from_value(doc).map_err(StoreError::from)?;
                Ok(Some(profile))
            }
            None => Ok(None),
        }
    }

    /// Resolve the avatar ref, then pull its bytes. `None` when the user
    /// never uploaded one.
    pub async fn fetch_avatar(&self, uid: UserId) -> EngineResult<Option<Vec<u8>>> {
        let blob_ref = match self.blobs.download_ref(&avatar_key(&uid)).await {
            Ok(blob_ref) => blob_ref,
            Err(StoreError::BlobMissing(_)) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(self.blobs.fetch(&blob_ref).await?))
    }

    async fn require_profile(&self, uid: UserId) -> EngineResult<UserProfile> {
        self.fetch_profile(uid)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("profile for {uid}")))
    }

    async fn write(&self, uid: UserId, profile: &UserProfile) -> EngineResult<()> {
        let doc = serde_json::to_value(profile).map_err(StoreError::from)?;
        self.store
            .put(collections::USERS, &uid.to_string(), doc)
            .await?;
        Ok(())
    }
}
