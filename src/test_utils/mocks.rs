//! Mock implementations for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::domain::{
    ConnectionError, FallbackDirectory, LookupError, NameResolver, OwnedNamesSource,
    WalletAddress, WalletProvider,
};

fn parse(address: &str) -> WalletAddress {
    WalletAddress::from_str(address).expect("mock address must be valid")
}

/// Configuration for mock behavior
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    pub failure: Option<LookupError>,
}

impl MockConfig {
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failure(error: LookupError) -> Self {
        Self {
            failure: Some(error),
        }
    }

    fn check(&self) -> Result<(), LookupError> {
        match &self.failure {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

/// Mock reverse resolver
#[derive(Default)]
pub struct MockNameResolver {
    names: Mutex<HashMap<WalletAddress, String>>,
    config: Mutex<MockConfig>,
    calls: AtomicUsize,
}

impl MockNameResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_name(&self, address: &str, name: &str) {
        self.names
            .lock()
            .unwrap()
            .insert(parse(address), name.to_string());
    }

    pub fn fail_with(&self, error: LookupError) {
        *self.config.lock().unwrap() = MockConfig::failure(error);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NameResolver for MockNameResolver {
    async fn primary_name(&self, address: &WalletAddress) -> Result<Option<String>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.config.lock().unwrap().check()?;
        Ok(self.names.lock().unwrap().get(address).cloned())
    }

    async fn health_check(&self) -> Result<(), LookupError> {
        self.config.lock().unwrap().check()
    }
}

/// Mock registry scan source
#[derive(Default)]
pub struct MockOwnedNamesSource {
    names: Mutex<HashMap<WalletAddress, Vec<String>>>,
    config: Mutex<MockConfig>,
    calls: AtomicUsize,
}

impl MockOwnedNamesSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_names(&self, address: &str, names: Vec<String>) {
        self.names.lock().unwrap().insert(parse(address), names);
    }

    pub fn fail_with(&self, error: LookupError) {
        *self.config.lock().unwrap() = MockConfig::failure(error);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OwnedNamesSource for MockOwnedNamesSource {
    async fn owned_names(&self, address: &WalletAddress) -> Result<Vec<String>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.config.lock().unwrap().check()?;
        Ok(self
            .names
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .unwrap_or_default())
    }

    async fn health_check(&self) -> Result<(), LookupError> {
        self.config.lock().unwrap().check()
    }
}

/// Mock fallback directory that counts lookups
#[derive(Default)]
pub struct MockFallbackDirectory {
    entries: Mutex<HashMap<WalletAddress, String>>,
    calls: AtomicUsize,
}

impl MockFallbackDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, address: &str, name: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(parse(address), name.to_string());
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FallbackDirectory for MockFallbackDirectory {
    fn lookup(&self, address: &WalletAddress) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entries.lock().unwrap().get(address).cloned()
    }

    fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

/// Mock injected wallet
pub struct MockWalletProvider {
    available: bool,
    authorized: Mutex<Vec<String>>,
    request_result: Mutex<Result<Vec<String>, ConnectionError>>,
    requests: AtomicUsize,
}

impl MockWalletProvider {
    /// Provider that grants `accounts` when asked
    #[must_use]
    pub fn with_accounts(accounts: Vec<String>) -> Self {
        Self {
            available: true,
            authorized: Mutex::new(Vec::new()),
            request_result: Mutex::new(Ok(accounts)),
            requests: AtomicUsize::new(0),
        }
    }

    /// No provider installed
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::with_accounts(Vec::new())
        }
    }

    /// Provider whose connection prompt fails with `error`
    #[must_use]
    pub fn rejecting(error: ConnectionError) -> Self {
        let provider = Self::with_accounts(Vec::new());
        *provider.request_result.lock().unwrap() = Err(error);
        provider
    }

    /// Accounts returned without prompting (a previously authorized session)
    pub fn set_authorized(&self, accounts: Vec<String>) {
        *self.authorized.lock().unwrap() = accounts;
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletProvider for MockWalletProvider {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn accounts(&self) -> Result<Vec<String>, ConnectionError> {
        Ok(self.authorized.lock().unwrap().clone())
    }

    async fn request_accounts(&self) -> Result<Vec<String>, ConnectionError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.request_result.lock().unwrap().clone()
    }
}
