//! Shared error and account types for the cloudfile crates.
//!
//! Providers, the dispatcher and the CLI all speak [`Error`] and identify
//! accounts by [`AccountKey`]; quota figures travel as [`QuotaSnapshot`].

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{AccountKey, QuotaSnapshot};
