//! Provider event bus for cross-cutting observers.
//!
//! Business completion is reported per request through
//! [`RequestObserver`](crate::RequestObserver); the bus carries the same
//! milestones to anyone interested (instrumentation, tests) without coupling
//! them to individual requests.

use std::sync::OnceLock;
use tokio::sync::broadcast;
use tracing::trace;

use cloudfile_common::{AccountKey, QuotaSnapshot};

/// Default number of buffered events per subscriber.
const DEFAULT_CAPACITY: usize = 256;

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEventKind {
    /// OAuth handshake produced an access token.
    Authenticated,
    /// Logout call succeeded.
    LoggedOut,
    /// Profile and quota were replaced.
    UserInfoRefreshed { quota: QuotaSnapshot },
    /// File bytes started streaming to the provider.
    UploadStarted { file_name: String },
    /// Provider confirmed a stored file.
    FileUploaded { file_name: String },
    /// Share URL was resolved and recorded.
    FileUrlResolved { file_name: String, url: String },
    /// Upload was aborted by the caller.
    UploadCanceled { file_name: String },
    /// Provider confirmed a deletion.
    FileDeleted { path: String },
}

/// An event raised on behalf of one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEvent {
    pub account: AccountKey,
    pub kind: ProviderEventKind,
}

/// Broadcast channel of [`ProviderEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ProviderEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Process-wide bus shared by every provider that opts into it.
    pub fn global() -> &'static EventBus {
        static GLOBAL: OnceLock<EventBus> = OnceLock::new();
        GLOBAL.get_or_init(EventBus::default)
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, account: &AccountKey, kind: ProviderEventKind) {
        let event = ProviderEvent {
            account: account.clone(),
            kind,
        };
        if self.sender.send(event).is_err() {
            trace!("No event subscribers");
        }
    }

    /// Subscribe to events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
