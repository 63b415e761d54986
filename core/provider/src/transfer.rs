//! Upload request tracking and cancellation handles.

use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::observer::StatusCode;

/// Lifecycle of one upload request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    /// Accepted, waiting for authentication and quota checks.
    Pending,
    /// File bytes are being transferred.
    Uploading,
    /// Stored and shared; carries the resolved URL.
    Success { url: String },
    /// Aborted by the caller.
    Canceled,
    /// Failed with a status code and a human readable reason.
    Failed { code: StatusCode, message: String },
}

impl UploadStatus {
    /// Whether the request reached a terminal state.
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            UploadStatus::Success { .. } | UploadStatus::Canceled | UploadStatus::Failed { .. }
        )
    }

    /// Observer status code for a terminal state.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            UploadStatus::Success { .. } => Some(StatusCode::Ok),
            UploadStatus::Canceled => Some(StatusCode::UploadCanceled),
            UploadStatus::Failed { code, .. } => Some(*code),
            UploadStatus::Pending | UploadStatus::Uploading => None,
        }
    }

    /// Resolved share URL, once the upload succeeded.
    pub fn url(&self) -> Option<&str> {
        match self {
            UploadStatus::Success { url } => Some(url),
            _ => None,
        }
    }
}

/// Caller side of an upload request.
///
/// Cloning the handle is cheap; every clone observes the same request.
#[derive(Debug, Clone)]
pub struct UploadHandle {
    id: Uuid,
    file: PathBuf,
    cancel: CancellationToken,
    status: watch::Receiver<UploadStatus>,
}

/// Worker side of an upload request, owned by the coordinator task.
#[derive(Debug)]
pub struct UploadTracker {
    cancel: CancellationToken,
    status: watch::Sender<UploadStatus>,
}

impl UploadHandle {
    /// Create a pending request for `file`.
    pub fn new(file: &Path) -> (Self, UploadTracker) {
        let cancel = CancellationToken::new();
        let (tx, rx) = watch::channel(UploadStatus::Pending);

        let handle = Self {
            id: Uuid::new_v4(),
            file: file.to_path_buf(),
            cancel: cancel.clone(),
            status: rx,
        };
        let tracker = UploadTracker { cancel, status: tx };

        (handle, tracker)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Current status snapshot.
    pub fn status(&self) -> UploadStatus {
        self.status.borrow().clone()
    }

    /// Request cancellation. Has no effect on a finished upload.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub(crate) fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait until the upload reaches a terminal state.
    pub async fn wait(&self) -> UploadStatus {
        let mut rx = self.status.clone();
        let finished = rx
            .wait_for(UploadStatus::is_finished)
            .await
            .map(|status| status.clone());
        match finished {
            Ok(status) => status,
            // Worker dropped without finishing; report what it left behind.
            Err(_) => {
                let last = rx.borrow().clone();
                if last.is_finished() {
                    last
                } else {
                    UploadStatus::Failed {
                        code: StatusCode::UploadErr,
                        message: "upload task ended unexpectedly".to_string(),
                    }
                }
            }
        }
    }
}

impl UploadTracker {
    /// Token the worker races its transfer against.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Publish a new status. Terminal states are final.
    pub fn set(&self, status: UploadStatus) {
        self.status.send_if_modified(|current| {
            if current.is_finished() {
                return false;
            }
            *current = status;
            true
        });
    }
}
