//! Account profile and quota tracking.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use cloudfile_common::{AccountKey, QuotaSnapshot, Result};

use crate::events::{EventBus, ProviderEventKind};

use super::client::{DropboxClient, UserProfile};
use super::session::SessionManager;

/// Caches the account profile; the quota snapshot travels inside it so both
/// are always replaced together.
pub struct AccountInfoTracker {
    account: AccountKey,
    client: Arc<DropboxClient>,
    session: Arc<SessionManager>,
    events: EventBus,
    profile: RwLock<Option<UserProfile>>,
}

impl AccountInfoTracker {
    pub fn new(
        account: AccountKey,
        client: Arc<DropboxClient>,
        session: Arc<SessionManager>,
        events: EventBus,
    ) -> Self {
        Self {
            account,
            client,
            session,
            events,
            profile: RwLock::new(None),
        }
    }

    /// Fetch the profile, or return the cached one when `force` is false.
    ///
    /// # Errors
    /// - Authentication failed
    /// - Profile fetch or parse failed; the cached profile is kept
    pub async fn refresh(&self, force: bool) -> Result<UserProfile> {
        if !force {
            if let Some(profile) = self.profile.read().await.as_ref() {
                debug!("Using cached profile for {}", self.account);
                return Ok(profile.clone());
            }
        }

        let token = self.session.ensure_authenticated().await?;
        let profile = self.client.account_info(&token).await?;

        *self.profile.write().await = Some(profile.clone());

        info!(
            "Refreshed profile for {}: {} bytes used, {} bytes remaining",
            self.account,
            profile.quota_info.used(),
            profile.quota_info.remaining()
        );
        self.events.publish(
            &self.account,
            ProviderEventKind::UserInfoRefreshed {
                quota: profile.quota_info,
            },
        );

        Ok(profile)
    }

    /// Cached profile, if any.
    pub async fn profile(&self) -> Option<UserProfile> {
        self.profile.read().await.clone()
    }

    /// Cached quota snapshot, if any.
    pub async fn quota(&self) -> Option<QuotaSnapshot> {
        self.profile.read().await.as_ref().map(|p| p.quota_info)
    }

    /// `shared + normal` of the cached snapshot.
    pub async fn file_space_used(&self) -> Option<u64> {
        self.quota().await.map(|q| q.used())
    }

    /// `quota - used` of the cached snapshot.
    pub async fn remaining_file_space(&self) -> Option<u64> {
        self.quota().await.map(|q| q.remaining())
    }

    /// Drop the cached profile.
    pub async fn clear(&self) {
        *self.profile.write().await = None;
    }
}
