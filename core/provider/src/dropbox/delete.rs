//! Delete coordination and the pending delete set.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use cloudfile_common::{AccountKey, Error, Result};

use crate::events::{EventBus, ProviderEventKind};

use super::client::DropboxClient;
use super::session::SessionManager;
use super::share::ShareResolver;
use super::upload::UploadedFiles;

/// Issues deletes for uploaded files and reconciles local tracking.
pub struct DeleteCoordinator {
    account: AccountKey,
    client: Arc<DropboxClient>,
    session: Arc<SessionManager>,
    uploaded: Arc<UploadedFiles>,
    shares: Arc<ShareResolver>,
    events: EventBus,
    pending: Mutex<HashSet<String>>,
}

impl DeleteCoordinator {
    pub fn new(
        account: AccountKey,
        client: Arc<DropboxClient>,
        session: Arc<SessionManager>,
        uploaded: Arc<UploadedFiles>,
        shares: Arc<ShareResolver>,
        events: EventBus,
    ) -> Self {
        Self {
            account,
            client,
            session,
            uploaded,
            shares,
            events,
            pending: Mutex::new(HashSet::new()),
        }
    }

    /// Delete the remote copy of `file`.
    ///
    /// # Errors
    /// - `file` was never uploaded through this account
    /// - A delete of the same remote path is already pending
    /// - The provider rejected the delete; local tracking stays untouched
    pub async fn delete_file(&self, file: &Path) -> Result<()> {
        let remote = self.uploaded.remote_name(file).await.ok_or_else(|| {
            Error::Delete(format!("{} was not uploaded to this account", file.display()))
        })?;

        if !self.pending.lock().await.insert(remote.clone()) {
            return Err(Error::Delete(format!(
                "A delete of {} is already pending",
                remote
            )));
        }

        let result = self.send_delete(&remote).await;
        self.pending.lock().await.remove(&remote);

        if let Err(e) = result {
            warn!("Delete of {} failed: {}", remote, e);
            return Err(e);
        }

        self.uploaded.remove(file).await;
        self.shares.forget(file).await;

        info!("Deleted {}", remote);
        self.events
            .publish(&self.account, ProviderEventKind::FileDeleted { path: remote });
        Ok(())
    }

    /// Remote paths with a delete in flight.
    pub async fn pending(&self) -> Vec<String> {
        self.pending.lock().await.iter().cloned().collect()
    }

    async fn send_delete(&self, remote: &str) -> Result<()> {
        let token = self.session.ensure_authenticated().await?;
        let metadata = self.client.delete(&token, remote).await?;

        if metadata.is_deleted {
            Ok(())
        } else {
            Err(Error::Delete(format!(
                "Provider did not confirm deletion of {}",
                remote
            )))
        }
    }
}
