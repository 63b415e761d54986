//! Dropbox cloud-file provider implementation.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use cloudfile_common::{AccountKey, Error, QuotaSnapshot, Result};

use crate::events::{EventBus, ProviderEvent};
use crate::observer::ProviderContext;
use crate::provider::CloudFileProvider;
use crate::transfer::UploadHandle;

use super::account_info::AccountInfoTracker;
use super::client::{DropboxClient, UserProfile};
use super::config::DropboxConfig;
use super::delete::DeleteCoordinator;
use super::oauth::AccessToken;
use super::session::SessionManager;
use super::share::ShareResolver;
use super::upload::{UploadCoordinator, UploadedFiles};
use super::PROVIDER_TYPE;

/// Dropbox provider for one account.
///
/// Implements the CloudFileProvider trait by composing the session manager
/// and the per-concern coordinators, all sharing one wire client.
pub struct DropboxProvider {
    context: ProviderContext,
    config: DropboxConfig,
    events: EventBus,
    session: Arc<SessionManager>,
    account_info: Arc<AccountInfoTracker>,
    shares: Arc<ShareResolver>,
    uploaded: Arc<UploadedFiles>,
    uploads: Arc<UploadCoordinator>,
    deletes: DeleteCoordinator,
}

impl DropboxProvider {
    /// Bind configuration to an account. Purely local; no network activity.
    ///
    /// # Errors
    /// - Invalid endpoint URLs
    pub fn init(account: AccountKey, config: DropboxConfig) -> Result<Self> {
        Self::with_event_bus(account, config, EventBus::default())
    }

    /// Like [`DropboxProvider::init`], publishing events on a caller-supplied bus
    /// (e.g. [`EventBus::global`]).
    pub fn with_event_bus(
        account: AccountKey,
        config: DropboxConfig,
        events: EventBus,
    ) -> Result<Self> {
        let client = Arc::new(DropboxClient::new(&config)?);

        let session = Arc::new(SessionManager::new(
            account.clone(),
            Arc::clone(&client),
            events.clone(),
        ));
        let account_info = Arc::new(AccountInfoTracker::new(
            account.clone(),
            Arc::clone(&client),
            Arc::clone(&session),
            events.clone(),
        ));
        let shares = Arc::new(ShareResolver::new(
            account.clone(),
            Arc::clone(&client),
            Arc::clone(&session),
            events.clone(),
        ));
        let uploaded = Arc::new(UploadedFiles::default());
        let uploads = Arc::new(UploadCoordinator::new(
            account.clone(),
            Arc::clone(&client),
            Arc::clone(&session),
            Arc::clone(&account_info),
            Arc::clone(&shares),
            Arc::clone(&uploaded),
            events.clone(),
            config.max_file_size,
        ));
        let deletes = DeleteCoordinator::new(
            account.clone(),
            client,
            Arc::clone(&session),
            Arc::clone(&uploaded),
            Arc::clone(&shares),
            events.clone(),
        );

        Ok(Self {
            context: ProviderContext::new(PROVIDER_TYPE, account),
            config,
            events,
            session,
            account_info,
            shares,
            uploaded,
            uploads,
            deletes,
        })
    }

    pub fn account_key(&self) -> &AccountKey {
        self.context.account_key()
    }

    pub fn config(&self) -> &DropboxConfig {
        &self.config
    }

    /// Bus this provider publishes on.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }

    /// Cached access token, once a handshake succeeded.
    pub fn access_token(&self) -> Option<AccessToken> {
        self.session.access_token()
    }

    /// Fetch (or return the cached) full account profile.
    pub async fn user_profile(&self, force: bool) -> Result<UserProfile> {
        self.account_info.refresh(force).await
    }

    /// Cached profile, without network activity.
    pub async fn cached_profile(&self) -> Option<UserProfile> {
        self.account_info.profile().await
    }

    /// Cancel every in-flight upload. Returns how many were signaled.
    pub fn cancel_all_uploads(&self) -> usize {
        self.uploads.cancel_all()
    }

    /// Number of uploads not yet finished.
    pub fn uploads_in_flight(&self) -> usize {
        self.uploads.in_flight()
    }

    /// Remote paths with a delete in flight.
    pub async fn pending_deletes(&self) -> Vec<String> {
        self.deletes.pending().await
    }

    /// Forget everything known about the account: session, profile, uploads
    /// and URLs. In-flight uploads are canceled.
    pub async fn reset_account(&self) {
        info!("Resetting account {}", self.account_key());
        self.uploads.cancel_all();
        self.session.reset();
        self.account_info.clear().await;
        self.shares.clear().await;
        self.uploaded.clear().await;
    }
}

#[async_trait]
impl CloudFileProvider for DropboxProvider {
    fn provider_type(&self) -> &str {
        PROVIDER_TYPE
    }

    fn context(&self) -> &ProviderContext {
        &self.context
    }

    async fn create_existing_account(&self) -> Result<()> {
        self.session.ensure_authenticated().await?;

        if let Err(e) = self.session.logout().await {
            warn!("Logout after account setup failed: {}", e);
        }

        Ok(())
    }

    async fn refresh_user_info(&self, force: bool) -> Result<QuotaSnapshot> {
        Ok(self.account_info.refresh(force).await?.quota_info)
    }

    fn upload_file(&self, file: &Path) -> UploadHandle {
        self.uploads.upload_file(file)
    }

    fn cancel_file_upload(&self, file: &Path) -> bool {
        self.uploads.cancel_file_upload(file)
    }

    async fn get_file_url(&self, file: &Path) -> Result<String> {
        let remote = self.uploaded.remote_name(file).await.ok_or_else(|| {
            Error::Share(format!("{} was not uploaded to this account", file.display()))
        })?;
        self.shares.resolve(file, &remote).await
    }

    async fn url_for_file(&self, file: &Path) -> Option<String> {
        self.shares.url_for_file(file).await
    }

    async fn delete_file(&self, file: &Path) -> Result<()> {
        self.deletes.delete_file(file).await
    }

    async fn file_space_used(&self) -> Option<u64> {
        self.account_info.file_space_used().await
    }

    async fn remaining_file_space(&self) -> Option<u64> {
        self.account_info.remaining_file_space().await
    }
}
