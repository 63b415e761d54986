//! Share URL resolution and the file → URL mapping.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use cloudfile_common::{AccountKey, Result};

use crate::events::{EventBus, ProviderEventKind};

use super::client::DropboxClient;
use super::session::SessionManager;

/// Resolves public URLs and remembers the latest one per local file.
pub struct ShareResolver {
    account: AccountKey,
    client: Arc<DropboxClient>,
    session: Arc<SessionManager>,
    events: EventBus,
    urls: RwLock<HashMap<PathBuf, String>>,
}

impl ShareResolver {
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
            urls: RwLock::new(HashMap::new()),
        }
    }

    /// Request a share URL for `remote_name` and record it for `file`.
    ///
    /// # Errors
    /// - Authentication failed
    /// - Share request failed; any earlier URL for `file` is kept
    pub async fn resolve(&self, file: &Path, remote_name: &str) -> Result<String> {
        let token = self.session.ensure_authenticated().await?;
        let link = self.client.share(&token, remote_name).await?;

        self.urls
            .write()
            .await
            .insert(file.to_path_buf(), link.url.clone());

        info!("Resolved share URL for {}: {}", remote_name, link.url);
        self.events.publish(
            &self.account,
            ProviderEventKind::FileUrlResolved {
                file_name: remote_name.to_string(),
                url: link.url.clone(),
            },
        );

        Ok(link.url)
    }

    /// Last resolved URL for `file`.
    pub async fn url_for_file(&self, file: &Path) -> Option<String> {
        self.urls.read().await.get(file).cloned()
    }

    /// Drop the mapping for `file`.
    pub async fn forget(&self, file: &Path) {
        self.urls.write().await.remove(file);
    }

    pub async fn clear(&self) {
        self.urls.write().await.clear();
    }
}
