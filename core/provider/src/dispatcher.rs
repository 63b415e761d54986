//! Observer-style request surface on top of a [`CloudFileProvider`].
//!
//! Every call returns immediately. The observer hears `on_start_request`
//! before the call returns and `on_stop_request` exactly once when the work
//! is done.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

use cloudfile_common::Result;

use crate::observer::{Request, RequestKind, RequestObserver, StatusCode};
use crate::provider::CloudFileProvider;
use crate::transfer::UploadHandle;

/// Issues provider requests on background tasks and reports to observers.
#[derive(Clone)]
pub struct RequestDispatcher {
    provider: Arc<dyn CloudFileProvider>,
}

impl RequestDispatcher {
    /// Wrap a provider.
    pub fn new(provider: Arc<dyn CloudFileProvider>) -> Self {
        Self { provider }
    }

    /// The wrapped provider.
    pub fn provider(&self) -> &Arc<dyn CloudFileProvider> {
        &self.provider
    }

    /// Run the OAuth handshake and logout for an existing account.
    pub fn create_existing_account(
        &self,
        observer: Arc<dyn RequestObserver>,
    ) -> JoinHandle<StatusCode> {
        let provider = Arc::clone(&self.provider);
        self.dispatch(
            Request::new(RequestKind::CreateAccount, None),
            observer,
            async move { provider.create_existing_account().await },
        )
    }

    /// Refresh the account profile and quota.
    pub fn refresh_user_info(
        &self,
        force: bool,
        observer: Arc<dyn RequestObserver>,
    ) -> JoinHandle<StatusCode> {
        let provider = Arc::clone(&self.provider);
        self.dispatch(
            Request::new(RequestKind::RefreshUserInfo, None),
            observer,
            async move { provider.refresh_user_info(force).await.map(|_| ()) },
        )
    }

    /// Upload a file. The returned handle can cancel the transfer.
    pub fn upload_file(&self, file: &Path, observer: Arc<dyn RequestObserver>) -> UploadHandle {
        let request = Request::new(RequestKind::Upload, Some(file));
        let context = self.provider.context().clone();
        observer.on_start_request(&request, &context);

        let handle = self.provider.upload_file(file);
        let waiter = handle.clone();

        tokio::spawn(async move {
            let status = waiter
                .wait()
                .await
                .status_code()
                .unwrap_or(StatusCode::UploadErr);
            debug!("Upload request {} finished: {}", request.id(), status);
            observer.on_stop_request(&request, &context, status);
        });

        handle
    }

    /// Resolve the share URL of an uploaded file.
    pub fn get_file_url(
        &self,
        file: &Path,
        observer: Arc<dyn RequestObserver>,
    ) -> JoinHandle<StatusCode> {
        let provider = Arc::clone(&self.provider);
        let path = file.to_path_buf();
        self.dispatch(
            Request::new(RequestKind::GetFileUrl, Some(file)),
            observer,
            async move { provider.get_file_url(&path).await.map(|_| ()) },
        )
    }

    /// Delete an uploaded file.
    pub fn delete_file(
        &self,
        file: &Path,
        observer: Arc<dyn RequestObserver>,
    ) -> JoinHandle<StatusCode> {
        let provider = Arc::clone(&self.provider);
        let path = file.to_path_buf();
        self.dispatch(
            Request::new(RequestKind::Delete, Some(file)),
            observer,
            async move { provider.delete_file(&path).await },
        )
    }

    fn dispatch<F>(
        &self,
        request: Request,
        observer: Arc<dyn RequestObserver>,
        work: F,
    ) -> JoinHandle<StatusCode>
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let context = self.provider.context().clone();
        observer.on_start_request(&request, &context);

        tokio::spawn(async move {
            let status = match work.await {
                Ok(()) => StatusCode::Ok,
                Err(e) => {
                    debug!("{:?} request {} failed: {}", request.kind(), request.id(), e);
                    StatusCode::from_error(request.kind(), &e)
                }
            };
            observer.on_stop_request(&request, &context, status);
            status
        })
    }
}
