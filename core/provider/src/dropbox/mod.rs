//! Dropbox cloud-file provider.
//!
//! This module provides a Dropbox backend with:
//! - Three-legged OAuth 1.0 handshake shared across concurrent requests
//! - Streaming, cancelable uploads into the application sandbox
//! - Automatic share URL resolution after each upload
//! - Quota tracking and deletes restricted to files this client uploaded

pub mod account_info;
pub mod client;
pub mod config;
pub mod delete;
pub mod oauth;
pub mod provider;
pub mod session;
pub mod share;
pub mod upload;

use std::sync::Arc;

use cloudfile_common::{AccountKey, Error, Result};

use crate::provider::CloudFileProvider;

pub use client::{DropboxClient, FileMetadata, ShareLink, UserProfile};
pub use config::DropboxConfig;
pub use oauth::{AccessToken, RequestToken, TokenPair};
pub use provider::DropboxProvider;

/// Provider type name used in the registry and in observer contexts.
pub const PROVIDER_TYPE: &str = "dropbox";

/// Create a Dropbox provider from a JSON configuration.
///
/// `null` selects the default configuration.
pub fn create_dropbox_provider(
    account: AccountKey,
    config: serde_json::Value,
) -> Result<Arc<dyn CloudFileProvider>> {
    let config: DropboxConfig = if config.is_null() {
        DropboxConfig::default()
    } else {
        serde_json::from_value(config)
            .map_err(|e| Error::InvalidInput(format!("Invalid Dropbox config: {}", e)))?
    };

    Ok(Arc::new(DropboxProvider::init(account, config)?))
}
