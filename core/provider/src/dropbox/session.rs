//! OAuth session management: handshake, access token cache and logout.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, Weak};
use tracing::{debug, info};

use cloudfile_common::{AccountKey, Error, Result};

use crate::events::{EventBus, ProviderEventKind};

use super::client::DropboxClient;
use super::oauth::AccessToken;

type Handshake = Shared<BoxFuture<'static, std::result::Result<AccessToken, String>>>;
type HandshakeSlot = Arc<Mutex<Option<Handshake>>>;

/// Account plus the application and hosts it authenticates against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SessionKey {
    account: AccountKey,
    realm: String,
}

/// Process-wide handshake slot for `key`.
///
/// Every provider instance bound to the same account and realm gets the same
/// slot. Entries live as long as some provider holds them.
fn shared_slot(key: SessionKey) -> HandshakeSlot {
    static SLOTS: OnceLock<Mutex<HashMap<SessionKey, Weak<Mutex<Option<Handshake>>>>>> =
        OnceLock::new();

    let mut slots = SLOTS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    slots.retain(|_, slot| slot.strong_count() > 0);

    if let Some(slot) = slots.get(&key).and_then(Weak::upgrade) {
        return slot;
    }

    let slot = Arc::new(Mutex::new(None));
    slots.insert(key, Arc::downgrade(&slot));
    slot
}

/// Owns the account's OAuth session.
///
/// At most one handshake runs per account, across all provider instances
/// bound to it. Concurrent callers attach to the in-flight handshake and all
/// observe its result. A finished successful handshake doubles as the access
/// token cache; a failed one is replaced by a fresh attempt on the next call.
/// `Authenticated` is published on the bus of the instance that started the
/// handshake.
pub struct SessionManager {
    account: AccountKey,
    client: Arc<DropboxClient>,
    events: EventBus,
    handshake: HandshakeSlot,
}

impl SessionManager {
    pub fn new(account: AccountKey, client: Arc<DropboxClient>, events: EventBus) -> Self {
        let handshake = shared_slot(SessionKey {
            account: account.clone(),
            realm: client.realm(),
        });
        Self {
            account,
            client,
            events,
            handshake,
        }
    }

    /// Return the cached access token, running the handshake if needed.
    ///
    /// # Errors
    /// - Any handshake step failed; waiters of the same handshake all get it
    pub async fn ensure_authenticated(&self) -> Result<AccessToken> {
        let handshake = {
            let mut slot = self.lock_slot();
            match slot.as_ref() {
                Some(existing) if !matches!(existing.peek(), Some(Err(_))) => existing.clone(),
                _ => {
                    let fresh = self.start_handshake();
                    *slot = Some(fresh.clone());
                    fresh
                }
            }
        };

        handshake.await.map_err(Error::Authentication)
    }

    /// Cached access token, if a handshake has completed successfully.
    pub fn access_token(&self) -> Option<AccessToken> {
        self.lock_slot()
            .as_ref()
            .and_then(|h| h.peek())
            .and_then(|result| result.as_ref().ok())
            .cloned()
    }

    /// End the provider's interactive web session.
    ///
    /// Already issued access tokens stay valid.
    pub async fn logout(&self) -> Result<()> {
        self.client.logout().await?;
        info!("Logged out of {} web session", self.account);
        self.events.publish(&self.account, ProviderEventKind::LoggedOut);
        Ok(())
    }

    /// Forget the account's session; the next call runs a new handshake.
    pub fn reset(&self) {
        *self.lock_slot() = None;
    }

    fn lock_slot(&self) -> std::sync::MutexGuard<'_, Option<Handshake>> {
        self.handshake.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start_handshake(&self) -> Handshake {
        let client = Arc::clone(&self.client);
        let events = self.events.clone();
        let account = self.account.clone();

        async move {
            info!("Starting OAuth handshake for {}", account);

            let request_token = client.request_token().await.map_err(reason)?;
            debug!("Got request token for {}", account);

            client
                .authorize(&request_token)
                .await
                .map_err(reason)?;
            debug!("Request token authorized for {}", account);

            let access_token = client
                .access_token(&request_token)
                .await
                .map_err(reason)?;

            info!("OAuth handshake complete for {}", account);
            events.publish(&account, ProviderEventKind::Authenticated);
            Ok::<_, String>(access_token)
        }
        .boxed()
        .shared()
    }
}

/// Handshake failures travel as plain messages so every waiter can own a copy.
fn reason(error: Error) -> String {
    match error {
        Error::Authentication(message) => message,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(account: &str, realm: &str) -> SessionKey {
        SessionKey {
            account: AccountKey::new(account).unwrap(),
            realm: realm.to_string(),
        }
    }

    #[test]
    fn test_same_account_shares_one_slot() {
        let a = shared_slot(key("slotAccount", "app https://a/ https://b/"));
        let b = shared_slot(key("slotAccount", "app https://a/ https://b/"));
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_other_account_or_realm_gets_own_slot() {
        let a = shared_slot(key("slotAccountA", "app https://a/ https://b/"));
        let other_account = shared_slot(key("slotAccountB", "app https://a/ https://b/"));
        let other_realm = shared_slot(key("slotAccountA", "app https://c/ https://b/"));

        assert!(!Arc::ptr_eq(&a, &other_account));
        assert!(!Arc::ptr_eq(&a, &other_realm));
    }

    #[test]
    fn test_slot_is_released_with_last_holder() {
        let first = shared_slot(key("slotAccountGone", "realm"));
        let weak = Arc::downgrade(&first);
        drop(first);

        assert!(weak.upgrade().is_none());
        let fresh = shared_slot(key("slotAccountGone", "realm"));
        assert!(fresh.lock().unwrap().is_none());
    }
}
