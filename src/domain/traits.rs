//! Domain traits defining contracts for external systems.

use async_trait::async_trait;

use super::error::{ConnectionError, LookupError};
use super::types::WalletAddress;

/// Reverse resolution: the primary name registered for an address
#[async_trait]
pub trait NameResolver: Send + Sync {
    /// Primary name for `address`, or `None` if none is set
    async fn primary_name(&self, address: &WalletAddress) -> Result<Option<String>, LookupError>;

    /// Check that the resolver is reachable
    async fn health_check(&self) -> Result<(), LookupError> {
        Ok(())
    }
}

/// Registry scan: every name owned by an address
#[async_trait]
pub trait OwnedNamesSource: Send + Sync {
    /// Names owned by `address`, in the order the source returns them
    async fn owned_names(&self, address: &WalletAddress) -> Result<Vec<String>, LookupError>;

    /// Check that the source is reachable
    async fn health_check(&self) -> Result<(), LookupError> {
        Ok(())
    }
}

/// In-process table of known addresses, consulted last
pub trait FallbackDirectory: Send + Sync {
    fn lookup(&self, address: &WalletAddress) -> Option<String>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Injected wallet capability (e.g. a browser extension bridge)
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Whether a provider is present at all
    fn is_available(&self) -> bool;

    /// Accounts already authorized, without prompting the user
    async fn accounts(&self) -> Result<Vec<String>, ConnectionError>;

    /// Prompt the user to authorize accounts
    async fn request_accounts(&self) -> Result<Vec<String>, ConnectionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MinimalResolver;

    #[async_trait]
    impl NameResolver for MinimalResolver {
        async fn primary_name(
            &self,
            _address: &WalletAddress,
        ) -> Result<Option<String>, LookupError> {
            Ok(None)
        }
    }

    struct EmptyDirectory;

    impl FallbackDirectory for EmptyDirectory {
        fn lookup(&self, _address: &WalletAddress) -> Option<String> {
            None
        }

        fn len(&self) -> usize {
            0
        }
    }

    #[tokio::test]
    async fn test_name_resolver_default_health_check_ok() {
        assert!(MinimalResolver.health_check().await.is_ok());
    }

    #[test]
    fn test_fallback_directory_default_is_empty() {
        assert!(EmptyDirectory.is_empty());
    }
}
