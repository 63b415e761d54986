//! Cloud-file provider trait definition.

use async_trait::async_trait;
use std::path::Path;

use cloudfile_common::{QuotaSnapshot, Result};

use crate::observer::ProviderContext;
use crate::transfer::UploadHandle;

/// Cloud-file provider for one account.
///
/// Network operations are async; `upload_file` returns immediately with a
/// handle while the transfer runs in the background. Implementations handle
/// their own authentication: any operation that needs a session establishes
/// one on demand.
#[async_trait]
pub trait CloudFileProvider: Send + Sync {
    /// Get the provider type (e.g., "dropbox").
    fn provider_type(&self) -> &str;

    /// Context identifying this provider instance to observers.
    fn context(&self) -> &ProviderContext;

    /// Set up an account that already exists on the provider side.
    ///
    /// # Postconditions
    /// - An access token is cached for the account
    /// - The provider's interactive session was logged out once
    ///
    /// # Errors
    /// - Authentication errors (logout failures are not errors)
    async fn create_existing_account(&self) -> Result<()>;

    /// Fetch the account profile, or return the cached one unless `force`.
    ///
    /// # Errors
    /// - Authentication or profile fetch/parse errors; cache stays untouched
    async fn refresh_user_info(&self, force: bool) -> Result<QuotaSnapshot>;

    /// Start uploading `file`. A share URL is resolved once the upload succeeds.
    ///
    /// Every call creates an independent request, even for the same file.
    fn upload_file(&self, file: &Path) -> UploadHandle;

    /// Cancel every in-flight upload of `file`.
    ///
    /// Returns whether any upload was canceled.
    fn cancel_file_upload(&self, file: &Path) -> bool;

    /// Resolve (or re-resolve) the share URL of an uploaded file.
    ///
    /// # Errors
    /// - Share errors; a previously resolved URL stays in place
    async fn get_file_url(&self, file: &Path) -> Result<String>;

    /// Last resolved share URL for `file`, if any.
    async fn url_for_file(&self, file: &Path) -> Option<String>;

    /// Delete a file previously uploaded through this provider.
    ///
    /// # Errors
    /// - File was never uploaded
    /// - Provider rejected the delete; local tracking stays untouched
    async fn delete_file(&self, file: &Path) -> Result<()>;

    /// Bytes in use, once the profile was fetched.
    async fn file_space_used(&self) -> Option<u64>;

    /// Bytes left, once the profile was fetched.
    async fn remaining_file_space(&self) -> Option<u64>;
}
