//! Cloud-file provider client for cloudfile.
//!
//! This crate provides a trait-based interface for cloud-file backends that
//! upload local files, hand out shareable URLs for them, delete them again and
//! report account quota, together with a Dropbox backend speaking the
//! OAuth 1.0 signed HTTP API.
//!
//! # Design Principles
//! - Async operations: every network call is async and never blocks the caller
//! - Observer surface: [`RequestDispatcher`] reports completion through
//!   [`RequestObserver`] callbacks with a [`StatusCode`]
//! - Cancellation: in-flight uploads abort their transfer without touching
//!   other uploads on the same account
//! - Non-destructive failures: a failed request never clobbers cached state

pub mod dispatcher;
pub mod dropbox;
pub mod events;
pub mod observer;
pub mod provider;
pub mod registry;
pub mod transfer;

pub use dispatcher::RequestDispatcher;
pub use events::{EventBus, ProviderEvent, ProviderEventKind};
pub use observer::{ProviderContext, Request, RequestKind, RequestObserver, StatusCode};
pub use provider::CloudFileProvider;
pub use registry::{create_default_registry, ProviderFactory, ProviderRegistry};
pub use transfer::{UploadHandle, UploadStatus};
