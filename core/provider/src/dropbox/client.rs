//! Dropbox API client.
//!
//! Thin wire layer: builds URLs, signs requests and decodes responses. It
//! holds no account state; the coordinators own that.

use chrono::{DateTime, FixedOffset};
use reqwest::{header, redirect, Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::Path;
use tokio_util::io::ReaderStream;
use tracing::debug;
use url::Url;

use cloudfile_common::{Error, QuotaSnapshot, Result};

use super::config::{DropboxConfig, Endpoints};
use super::oauth::{self, AccessToken, Consumer, RequestToken};

/// Storage namespace of this application.
const SANDBOX_ROOT: &str = "sandbox";

/// Account profile returned by `account/info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub display_name: String,
    pub uid: u64,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub referral_link: Option<String>,
    pub quota_info: QuotaSnapshot,
}

/// Metadata of a stored (or deleted) object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileMetadata {
    #[serde(default)]
    pub path: String,
    /// Human readable size, e.g. "225.4KB".
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub bytes: u64,
    #[serde(default)]
    pub rev: Option<String>,
    #[serde(default)]
    pub revision: Option<u64>,
    /// RFC 2822 timestamp.
    #[serde(default)]
    pub modified: Option<String>,
    #[serde(default)]
    pub is_dir: bool,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub mime_type: Option<String>,
}

impl FileMetadata {
    /// Parsed modification time.
    pub fn modified_at(&self) -> Option<DateTime<FixedOffset>> {
        self.modified
            .as_deref()
            .and_then(|m| DateTime::parse_from_rfc2822(m).ok())
    }
}

/// Public link returned by `shares`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareLink {
    pub url: String,
    /// RFC 2822 timestamp.
    #[serde(default)]
    pub expires: Option<String>,
}

impl ShareLink {
    /// Parsed expiry time.
    pub fn expires_at(&self) -> Option<DateTime<FixedOffset>> {
        self.expires
            .as_deref()
            .and_then(|e| DateTime::parse_from_rfc2822(e).ok())
    }
}

/// Dropbox API client.
pub struct DropboxClient {
    http: Client,
    consumer: Consumer,
    endpoints: Endpoints,
}

impl DropboxClient {
    /// Create a new client from configuration. No network activity.
    ///
    /// # Errors
    /// - Invalid endpoint URLs
    /// - HTTP client construction failed
    pub fn new(config: &DropboxConfig) -> Result<Self> {
        let endpoints = config.endpoints()?;

        // The authorize step answers with a redirect to the callback; it must
        // be seen, not followed.
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| Error::InvalidInput(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            consumer: Consumer {
                key: config.app_key.clone(),
                secret: config.app_secret.clone(),
            },
            endpoints,
        })
    }

    /// Step 1: obtain a request token (signed with consumer credentials only).
    pub async fn request_token(&self) -> Result<RequestToken> {
        let url = Endpoints::join(&self.endpoints.server, &["oauth", "request_token"])?;
        let callback = self.endpoints.callback.as_str();
        let auth = oauth::authorization_header(
            "POST",
            &url,
            &self.consumer,
            None,
            &[("oauth_callback", callback)],
        )?;

        let response = self
            .http
            .post(url)
            .header(header::AUTHORIZATION, auth)
            .send()
            .await
            .map_err(|e| Error::Authentication(format!("Request token HTTP error: {}", e)))?;

        let body = Self::text_body(response, Error::Authentication).await?;
        oauth::parse_token_response(&body).map(RequestToken)
    }

    /// Step 2: authorize the request token. A redirect means access was granted.
    pub async fn authorize(&self, request_token: &RequestToken) -> Result<()> {
        let mut url = Endpoints::join(&self.endpoints.auth, &["oauth", "authorize"])?;
        url.query_pairs_mut()
            .append_pair("oauth_token", &request_token.0.token)
            .append_pair("oauth_callback", self.endpoints.callback.as_str());

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Authentication(format!("Authorize HTTP error: {}", e)))?;

        let status = response.status();
        if status.is_redirection() {
            let location = response
                .headers()
                .get(header::LOCATION)
                .and_then(|l| l.to_str().ok())
                .unwrap_or_default();
            debug!("Authorization redirected to {}", location);
            Ok(())
        } else {
            Err(Error::Authentication(format!(
                "Authorization was not granted: {}",
                status
            )))
        }
    }

    /// Step 3: exchange the authorized request token for an access token.
    pub async fn access_token(&self, request_token: &RequestToken) -> Result<AccessToken> {
        let url = Endpoints::join(&self.endpoints.server, &["oauth", "access_token"])?;
        let auth = oauth::authorization_header(
            "POST",
            &url,
            &self.consumer,
            Some(&request_token.0),
            &[],
        )?;

        let response = self
            .http
            .post(url)
            .header(header::AUTHORIZATION, auth)
            .send()
            .await
            .map_err(|e| Error::Authentication(format!("Access token HTTP error: {}", e)))?;

        let body = Self::text_body(response, Error::Authentication).await?;
        oauth::parse_token_response(&body).map(AccessToken)
    }

    /// End the interactive web session opened for authorization.
    pub async fn logout(&self) -> Result<()> {
        let response = self
            .http
            .get(self.endpoints.logout.clone())
            .send()
            .await
            .map_err(|e| Error::Authentication(format!("Logout HTTP error: {}", e)))?;

        let body = Self::text_body(response, Error::Authentication).await?;
        debug!("Logout response: {}", body.trim());
        Ok(())
    }

    /// Fetch the account profile.
    pub async fn account_info(&self, token: &AccessToken) -> Result<UserProfile> {
        let url = Endpoints::join(&self.endpoints.server, &["account", "info"])?;
        let auth = self.sign("GET", &url, token)?;

        let response = self
            .http
            .get(url)
            .header(header::AUTHORIZATION, auth)
            .send()
            .await
            .map_err(|e| Error::Profile(format!("Failed to get account info: {}", e)))?;

        Self::json_body(response, Error::Profile).await
    }

    /// Stream a local file to `files_put/sandbox/<name>`.
    pub async fn put_file(
        &self,
        token: &AccessToken,
        name: &str,
        file: &Path,
        size: u64,
    ) -> Result<FileMetadata> {
        let url = Endpoints::join(&self.endpoints.content, &["files_put", SANDBOX_ROOT, name])?;
        let auth = self.sign("PUT", &url, token)?;

        let source = tokio::fs::File::open(file).await?;
        let body = reqwest::Body::wrap_stream(ReaderStream::new(source));

        let response = self
            .http
            .put(url)
            .header(header::AUTHORIZATION, auth)
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .header(header::CONTENT_LENGTH, size)
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Upload(format!("Failed to upload file: {}", e)))?;

        Self::json_body(response, Error::Upload).await
    }

    /// Request a public link for `shares/sandbox/<name>`.
    pub async fn share(&self, token: &AccessToken, name: &str) -> Result<ShareLink> {
        let url = Endpoints::join(&self.endpoints.server, &["shares", SANDBOX_ROOT, name])?;
        let auth = self.sign("GET", &url, token)?;

        let response = self
            .http
            .get(url)
            .header(header::AUTHORIZATION, auth)
            .send()
            .await
            .map_err(|e| Error::Share(format!("Failed to get share link: {}", e)))?;

        Self::json_body(response, Error::Share).await
    }

    /// Delete `path` from the sandbox.
    pub async fn delete(&self, token: &AccessToken, path: &str) -> Result<FileMetadata> {
        let mut url = Endpoints::join(&self.endpoints.server, &["fileops", "delete", ""])?;
        url.query_pairs_mut()
            .append_pair("root", SANDBOX_ROOT)
            .append_pair("path", path);
        let auth = self.sign("POST", &url, token)?;

        let response = self
            .http
            .post(url)
            .header(header::AUTHORIZATION, auth)
            .send()
            .await
            .map_err(|e| Error::Delete(format!("Failed to delete file: {}", e)))?;

        Self::json_body(response, Error::Delete).await
    }

    /// Application and hosts this client authenticates against.
    ///
    /// Clients with the same realm can share an account's access token.
    pub(crate) fn realm(&self) -> String {
        format!(
            "{} {} {}",
            self.consumer.key, self.endpoints.server, self.endpoints.auth
        )
    }

    fn sign(&self, method: &str, url: &Url, token: &AccessToken) -> Result<String> {
        oauth::authorization_header(method, url, &self.consumer, Some(&token.0), &[])
    }

    /// Read a text body, failing with `kind` on non-success status.
    async fn text_body(response: Response, kind: fn(String) -> Error) -> Result<String> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| kind(format!("Failed to read response: {}", e)))?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(kind(format!("API error: {} - {}", status, body.trim())))
        }
    }

    /// Decode a JSON body, failing with `kind` on non-success status or bad JSON.
    async fn json_body<T: DeserializeOwned>(
        response: Response,
        kind: fn(String) -> Error,
    ) -> Result<T> {
        let body = Self::text_body(response, kind).await?;
        serde_json::from_str(&body).map_err(|e| kind(format!("Failed to parse response: {}", e)))
    }
}
