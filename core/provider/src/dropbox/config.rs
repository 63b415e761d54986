//! Dropbox provider configuration.

use serde::{Deserialize, Serialize};
use url::Url;

use cloudfile_common::{Error, Result};

/// Application key (note: in production, this should be securely managed).
const DROPBOX_APP_KEY: &str = "YOUR_APP_KEY";
/// Application secret.
const DROPBOX_APP_SECRET: &str = "YOUR_APP_SECRET";
/// API host: OAuth token endpoints, account info, shares, file operations.
const DROPBOX_SERVER_URL: &str = "https://api.dropbox.com/1/";
/// Content host: file uploads.
const DROPBOX_CONTENT_URL: &str = "https://api-content.dropbox.com/1/";
/// Web host serving the authorization page.
const DROPBOX_AUTH_URL: &str = "https://www.dropbox.com/1/";
/// Ends the interactive web session opened for authorization.
const DROPBOX_LOGOUT_URL: &str = "https://www.dropbox.com/logout";
/// Location the authorization page redirects to once access is granted.
const CALLBACK_URL: &str = "http://oauthcallback.local/";
/// Largest file accepted by a single `files_put` call (150 MiB).
const MAX_FILE_SIZE: u64 = 150 * 1024 * 1024;

/// Dropbox provider configuration.
///
/// Every field is optional when deserializing; missing fields take the
/// defaults above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropboxConfig {
    /// OAuth consumer key.
    pub app_key: String,
    /// OAuth consumer secret.
    pub app_secret: String,
    /// Base URL of the API host.
    pub server_url: String,
    /// Base URL of the content (upload) host.
    pub content_url: String,
    /// Base URL of the authorization host.
    pub auth_url: String,
    /// Full URL of the logout page.
    pub logout_url: String,
    /// OAuth callback the authorization step redirects to.
    pub callback_url: String,
    /// Upload size limit in bytes.
    pub max_file_size: u64,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for DropboxConfig {
    fn default() -> Self {
        Self {
            app_key: DROPBOX_APP_KEY.to_string(),
            app_secret: DROPBOX_APP_SECRET.to_string(),
            server_url: DROPBOX_SERVER_URL.to_string(),
            content_url: DROPBOX_CONTENT_URL.to_string(),
            auth_url: DROPBOX_AUTH_URL.to_string(),
            logout_url: DROPBOX_LOGOUT_URL.to_string(),
            callback_url: CALLBACK_URL.to_string(),
            max_file_size: MAX_FILE_SIZE,
            user_agent: format!("cloudfile/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl DropboxConfig {
    /// Replace the four endpoint URLs, e.g. to point at a test server.
    pub fn with_base_urls(
        mut self,
        server_url: impl Into<String>,
        content_url: impl Into<String>,
        auth_url: impl Into<String>,
        logout_url: impl Into<String>,
    ) -> Self {
        self.server_url = server_url.into();
        self.content_url = content_url.into();
        self.auth_url = auth_url.into();
        self.logout_url = logout_url.into();
        self
    }

    /// Parse and validate the endpoint URLs.
    ///
    /// # Errors
    /// - Any URL fails to parse or cannot serve as a base
    pub(crate) fn endpoints(&self) -> Result<Endpoints> {
        Ok(Endpoints {
            server: parse_base(&self.server_url, "server")?,
            content: parse_base(&self.content_url, "content")?,
            auth: parse_base(&self.auth_url, "auth")?,
            logout: Url::parse(&self.logout_url)
                .map_err(|e| Error::InvalidInput(format!("Invalid logout URL: {}", e)))?,
            callback: Url::parse(&self.callback_url)
                .map_err(|e| Error::InvalidInput(format!("Invalid callback URL: {}", e)))?,
        })
    }
}

/// Validated endpoint URLs.
#[derive(Debug, Clone)]
pub(crate) struct Endpoints {
    pub server: Url,
    pub content: Url,
    pub auth: Url,
    pub logout: Url,
    pub callback: Url,
}

impl Endpoints {
    /// Append path segments to a base URL, percent-encoding each segment.
    ///
    /// An empty trailing segment keeps a trailing slash.
    pub fn join(base: &Url, segments: &[&str]) -> Result<Url> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidInput(format!("URL cannot be a base: {}", base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

fn parse_base(raw: &str, name: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| Error::InvalidInput(format!("Invalid {} URL: {}", name, e)))?;
    if url.cannot_be_a_base() {
        return Err(Error::InvalidInput(format!(
            "Invalid {} URL: {} cannot be a base",
            name, raw
        )));
    }
    Ok(url)
}
