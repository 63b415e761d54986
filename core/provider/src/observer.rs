//! Request observer interface and completion status codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use cloudfile_common::{AccountKey, Error};

/// Kind of operation a request performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    /// OAuth handshake followed by logout.
    CreateAccount,
    /// Account profile and quota refresh.
    RefreshUserInfo,
    /// File upload (including the automatic share resolution).
    Upload,
    /// Explicit share URL resolution.
    GetFileUrl,
    /// File deletion.
    Delete,
}

/// Completion status reported to [`RequestObserver::on_stop_request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCode {
    Ok,
    UploadErr,
    /// The caller canceled the upload; distinct from a failure.
    UploadCanceled,
    UploadWouldExceedQuota,
    UploadExceedsFileLimit,
    AuthErr,
    ProfileErr,
    ShareErr,
    DeleteErr,
}

impl StatusCode {
    /// Whether the request completed successfully.
    pub fn is_success(self) -> bool {
        self == StatusCode::Ok
    }

    /// Generic failure code for a request kind.
    pub fn failure_for(kind: RequestKind) -> Self {
        match kind {
            RequestKind::CreateAccount => StatusCode::AuthErr,
            RequestKind::RefreshUserInfo => StatusCode::ProfileErr,
            RequestKind::Upload => StatusCode::UploadErr,
            RequestKind::GetFileUrl => StatusCode::ShareErr,
            RequestKind::Delete => StatusCode::DeleteErr,
        }
    }

    /// Map an error raised by a request of `kind` to the status reported to observers.
    ///
    /// Errors that name their own failure class keep it; generic errors
    /// (I/O, invalid input, ...) fall back to the request kind's failure code.
    pub fn from_error(kind: RequestKind, error: &Error) -> Self {
        match error {
            Error::UploadCanceled => StatusCode::UploadCanceled,
            Error::UploadWouldExceedQuota { .. } => StatusCode::UploadWouldExceedQuota,
            Error::UploadExceedsFileLimit { .. } => StatusCode::UploadExceedsFileLimit,
            Error::Authentication(_) => StatusCode::AuthErr,
            Error::Profile(_) => StatusCode::ProfileErr,
            Error::Upload(_) => StatusCode::UploadErr,
            Error::Share(_) => StatusCode::ShareErr,
            Error::Delete(_) => StatusCode::DeleteErr,
            _ => Self::failure_for(kind),
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One observable request issued through the dispatcher.
#[derive(Debug, Clone)]
pub struct Request {
    id: Uuid,
    kind: RequestKind,
    file: Option<PathBuf>,
}

impl Request {
    /// Create a request of the given kind, optionally tied to a local file.
    pub fn new(kind: RequestKind, file: Option<&Path>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            file: file.map(Path::to_path_buf),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }
}

/// Identifies the provider instance a request ran against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderContext {
    provider_type: String,
    account_key: AccountKey,
    instance_id: Uuid,
}

impl ProviderContext {
    /// Create a context for a freshly initialized provider instance.
    pub fn new(provider_type: impl Into<String>, account_key: AccountKey) -> Self {
        Self {
            provider_type: provider_type.into(),
            account_key,
            instance_id: Uuid::new_v4(),
        }
    }

    /// Provider type name (e.g. "dropbox").
    pub fn provider_type(&self) -> &str {
        &self.provider_type
    }

    pub fn account_key(&self) -> &AccountKey {
        &self.account_key
    }

    /// Unique id of the provider instance.
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }
}

/// Callback interface for collaborators (UI, tests) that issue requests.
///
/// `on_stop_request` is called exactly once per request, after
/// `on_start_request`.
pub trait RequestObserver: Send + Sync {
    /// Called when the request has been accepted.
    fn on_start_request(&self, _request: &Request, _context: &ProviderContext) {}

    /// Called when the request has finished, successfully or not.
    fn on_stop_request(&self, request: &Request, context: &ProviderContext, status: StatusCode);
}
