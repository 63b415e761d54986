//! Upload coordination: per-request tasks, quota checks and cancellation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use cloudfile_common::{AccountKey, Error, Result};

use crate::events::{EventBus, ProviderEventKind};
use crate::observer::{RequestKind, StatusCode};
use crate::transfer::{UploadHandle, UploadStatus, UploadTracker};

use super::account_info::AccountInfoTracker;
use super::client::DropboxClient;
use super::session::SessionManager;
use super::share::ShareResolver;

/// Remote names of files uploaded through this account.
///
/// Deletes and explicit share lookups only target files recorded here.
#[derive(Default)]
pub struct UploadedFiles {
    entries: RwLock<HashMap<PathBuf, String>>,
}

impl UploadedFiles {
    pub async fn record(&self, file: &Path, remote_name: &str) {
        self.entries
            .write()
            .await
            .insert(file.to_path_buf(), remote_name.to_string());
    }

    pub async fn remote_name(&self, file: &Path) -> Option<String> {
        self.entries.read().await.get(file).cloned()
    }

    pub async fn remove(&self, file: &Path) {
        self.entries.write().await.remove(file);
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

struct InFlight {
    file: PathBuf,
    cancel: CancellationToken,
}

/// Runs uploads as independent tasks sharing one account session.
pub struct UploadCoordinator {
    account: AccountKey,
    client: Arc<DropboxClient>,
    session: Arc<SessionManager>,
    account_info: Arc<AccountInfoTracker>,
    shares: Arc<ShareResolver>,
    uploaded: Arc<UploadedFiles>,
    events: EventBus,
    max_file_size: u64,
    in_flight: Mutex<HashMap<Uuid, InFlight>>,
}

impl UploadCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        account: AccountKey,
        client: Arc<DropboxClient>,
        session: Arc<SessionManager>,
        account_info: Arc<AccountInfoTracker>,
        shares: Arc<ShareResolver>,
        uploaded: Arc<UploadedFiles>,
        events: EventBus,
        max_file_size: u64,
    ) -> Self {
        Self {
            account,
            client,
            session,
            account_info,
            shares,
            uploaded,
            events,
            max_file_size,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Start uploading `file` on a background task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn upload_file(self: &Arc<Self>, file: &Path) -> UploadHandle {
        let (handle, tracker) = UploadHandle::new(file);
        let id = handle.id();

        self.lock_in_flight().insert(
            id,
            InFlight {
                file: file.to_path_buf(),
                cancel: handle.cancellation_token(),
            },
        );

        let this = Arc::clone(self);
        let file = file.to_path_buf();
        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = tracker.cancellation().cancelled() => Err(Error::UploadCanceled),
                result = this.run(&file, &tracker) => result,
            };

            this.lock_in_flight().remove(&id);
            this.finish(&file, &tracker, result);
        });

        handle
    }

    /// Cancel every in-flight upload of `file`.
    pub fn cancel_file_upload(&self, file: &Path) -> bool {
        let in_flight = self.lock_in_flight();
        let mut canceled = false;
        for entry in in_flight.values().filter(|e| e.file == file) {
            entry.cancel.cancel();
            canceled = true;
        }
        canceled
    }

    /// Cancel every in-flight upload of this account.
    pub fn cancel_all(&self) -> usize {
        let in_flight = self.lock_in_flight();
        for entry in in_flight.values() {
            entry.cancel.cancel();
        }
        in_flight.len()
    }

    /// Number of uploads not yet finished.
    pub fn in_flight(&self) -> usize {
        self.lock_in_flight().len()
    }

    async fn run(&self, file: &Path, tracker: &UploadTracker) -> Result<String> {
        let name = remote_name(file)?;
        let size = tokio::fs::metadata(file).await?.len();

        let token = self.session.ensure_authenticated().await?;
        let profile = self.account_info.refresh(false).await?;

        if size > self.max_file_size {
            return Err(Error::UploadExceedsFileLimit {
                size,
                limit: self.max_file_size,
            });
        }
        let remaining = profile.quota_info.remaining();
        if size > remaining {
            return Err(Error::UploadWouldExceedQuota { size, remaining });
        }

        tracker.set(UploadStatus::Uploading);
        info!("Uploading {} ({} bytes) as {}", file.display(), size, name);
        self.events.publish(
            &self.account,
            ProviderEventKind::UploadStarted {
                file_name: name.clone(),
            },
        );

        let metadata = self.client.put_file(&token, &name, file, size).await?;
        debug!(
            "Stored {} at {} (rev {:?}, {} bytes)",
            name, metadata.path, metadata.rev, metadata.bytes
        );

        self.uploaded.record(file, &name).await;
        self.events.publish(
            &self.account,
            ProviderEventKind::FileUploaded {
                file_name: name.clone(),
            },
        );

        self.shares
            .resolve(file, &name)
            .await
            .map_err(|e| Error::Upload(format!("Uploaded {} but sharing failed: {}", name, e)))
    }

    fn finish(&self, file: &Path, tracker: &UploadTracker, result: Result<String>) {
        let status = match result {
            Ok(url) => {
                info!("Upload of {} complete: {}", file.display(), url);
                UploadStatus::Success { url }
            }
            Err(Error::UploadCanceled) => {
                info!("Upload of {} canceled", file.display());
                let file_name = remote_name(file).unwrap_or_else(|_| file.display().to_string());
                self.events
                    .publish(&self.account, ProviderEventKind::UploadCanceled { file_name });
                UploadStatus::Canceled
            }
            Err(e) => {
                warn!("Upload of {} failed: {}", file.display(), e);
                UploadStatus::Failed {
                    code: StatusCode::from_error(RequestKind::Upload, &e),
                    message: e.to_string(),
                }
            }
        };
        tracker.set(status);
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, InFlight>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Name a local file is stored under in the sandbox.
pub(crate) fn remote_name(file: &Path) -> Result<String> {
    file.file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            Error::InvalidInput(format!("{} has no usable file name", file.display()))
        })
}
