//! Common types used throughout cloudfile.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one configured provider account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountKey(String);

impl AccountKey {
    /// Create a new AccountKey from a string.
    ///
    /// # Errors
    /// - Returns error if key is empty or only whitespace
    pub fn new(key: impl Into<String>) -> crate::Result<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(crate::Error::InvalidInput(
                "AccountKey cannot be empty".to_string(),
            ));
        }
        Ok(Self(key))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Most recently fetched storage usage figures for an account, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaSnapshot {
    /// Bytes used by shared folders.
    pub shared: u64,
    /// Bytes used by the account's own files.
    pub normal: u64,
    /// Total bytes available to the account.
    pub quota: u64,
}

impl QuotaSnapshot {
    /// Bytes in use: `shared + normal`.
    pub fn used(&self) -> u64 {
        self.shared.saturating_add(self.normal)
    }

    /// Bytes left: `quota - used`, never below zero.
    pub fn remaining(&self) -> u64 {
        self.quota.saturating_sub(self.used())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_account_key_creation() {
        let key = AccountKey::new("someAccountKey").unwrap();
        assert_eq!(key.as_str(), "someAccountKey");
        assert_eq!(key.to_string(), "someAccountKey");
    }

    #[test]
    fn test_account_key_empty_fails() {
        assert!(AccountKey::new("").is_err());
        assert!(AccountKey::new("   ").is_err());
    }

    #[test]
    fn test_quota_used_and_remaining() {
        let snapshot = QuotaSnapshot {
            shared: 12345,
            normal: 67890,
            quota: 31415926535,
        };

        assert_eq!(snapshot.used(), 80235);
        assert_eq!(snapshot.remaining(), 31415846300);
    }

    #[test]
    fn test_quota_over_committed() {
        let snapshot = QuotaSnapshot {
            shared: 60,
            normal: 50,
            quota: 100,
        };

        assert_eq!(snapshot.used(), 110);
        assert_eq!(snapshot.remaining(), 0);
    }

    proptest! {
        #[test]
        fn prop_used_plus_remaining_is_quota(
            shared in 0u64..1 << 40,
            normal in 0u64..1 << 40,
            extra in 0u64..1 << 40,
        ) {
            let snapshot = QuotaSnapshot {
                shared,
                normal,
                quota: shared + normal + extra,
            };
            prop_assert_eq!(snapshot.used() + snapshot.remaining(), snapshot.quota);
        }
    }
}
