//! Static fallback directory of known addresses.
//!
//! The last lookup step: an in-memory table mapping addresses to names, used
//! for demo and test accounts so the gate works without live lookups.
//! Entries come from an inline `addr=name` list, a JSON file, or the demo set.

use std::path::Path;
use std::str::FromStr;

use dashmap::DashMap;
use tracing::{info, warn};

use crate::domain::{ConfigError, FallbackDirectory, WalletAddress};

/// Demo accounts seeded when `ENABLE_DEMO_FALLBACK` is set
pub const DEMO_ENTRIES: &[(&str, &str)] = &[
    (
        "0x0000000000000000000000000000000000000001",
        "demo.allthingscrypto.eth",
    ),
    (
        "0x0000000000000000000000000000000000000002",
        "founder.allthingscrypto.eth",
    ),
    (
        "0x0000000000000000000000000000000000000003",
        "premium.allthingscrypto.eth",
    ),
];

/// Thread-safe fallback table keyed by wallet address
#[derive(Debug, Default)]
pub struct StaticFallbackDirectory {
    store: DashMap<WalletAddress, String>,
}

impl StaticFallbackDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory seeded with [`DEMO_ENTRIES`]
    #[must_use]
    pub fn demo() -> Self {
        let directory = Self::new();
        for (address, name) in DEMO_ENTRIES {
            if let Ok(address) = WalletAddress::from_str(address) {
                directory.insert(address, (*name).to_string());
            }
        }
        directory
    }

    /// Parse `0xaddr=name,0xaddr=name`. Blank segments are ignored.
    pub fn from_pairs(spec: &str) -> Result<Self, ConfigError> {
        let directory = Self::new();
        for segment in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (address, name) = segment.split_once('=').ok_or_else(|| {
                ConfigError::InvalidValue {
                    name: "FALLBACK_TABLE".to_string(),
                    message: format!("expected address=name, got '{}'", segment),
                }
            })?;
            directory.insert_parsed(address.trim(), name.trim(), "FALLBACK_TABLE")?;
        }
        Ok(directory)
    }

    /// Load a JSON object `{ "0xaddr": "name", ... }`
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let load_failed = |message: String| ConfigError::LoadFailed {
            path: path.display().to_string(),
            message,
        };

        let contents = std::fs::read_to_string(path).map_err(|e| load_failed(e.to_string()))?;
        let entries: std::collections::BTreeMap<String, String> =
            serde_json::from_str(&contents).map_err(|e| load_failed(e.to_string()))?;

        let directory = Self::new();
        for (address, name) in entries {
            directory.insert_parsed(&address, &name, "FALLBACK_TABLE_PATH")?;
        }

        info!(
            path = %path.display(),
            count = directory.len(),
            "Fallback directory loaded from file"
        );
        Ok(directory)
    }

    fn insert_parsed(&self, address: &str, name: &str, source: &str) -> Result<(), ConfigError> {
        let parsed = WalletAddress::from_str(address).map_err(|e| ConfigError::InvalidValue {
            name: source.to_string(),
            message: e.to_string(),
        })?;
        if name.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: source.to_string(),
                message: format!("empty name for {}", parsed),
            });
        }
        self.insert(parsed, name.to_string());
        Ok(())
    }

    /// Add or replace an entry
    pub fn insert(&self, address: WalletAddress, name: String) {
        if let Some(previous) = self.store.insert(address, name.clone()) {
            warn!(
                address = %address,
                previous = %previous,
                name = %name,
                "Fallback entry replaced"
            );
        }
    }

    /// Merge another directory into this one; later entries win
    pub fn extend(&self, other: Self) {
        for (address, name) in other.store {
            self.insert(address, name);
        }
    }
}

impl FallbackDirectory for StaticFallbackDirectory {
    fn lookup(&self, address: &WalletAddress) -> Option<String> {
        self.store.get(address).map(|entry| entry.value().clone())
    }

    fn len(&self) -> usize {
        self.store.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn addr(s: &str) -> WalletAddress {
        WalletAddress::from_str(s).unwrap()
    }

    #[test]
    fn test_demo_directory_contains_demo_account() {
        let directory = StaticFallbackDirectory::demo();
        assert_eq!(directory.len(), DEMO_ENTRIES.len());
        assert_eq!(
            directory
                .lookup(&addr("0x0000000000000000000000000000000000000001"))
                .as_deref(),
            Some("demo.allthingscrypto.eth")
        );
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let directory = StaticFallbackDirectory::from_pairs(
            "0xabcdefabcdefabcdefabcdefabcdefabcdefabcd=alice.allthingscrypto.eth",
        )
        .unwrap();
        assert_eq!(
            directory
                .lookup(&addr("0xABCDEFABCDEFABCDEFABCDEFABCDEFABCDEFABCD"))
                .as_deref(),
            Some("alice.allthingscrypto.eth")
        );
    }

    #[test]
    fn test_from_pairs_handles_whitespace_and_blank_segments() {
        let directory = StaticFallbackDirectory::from_pairs(
            " 0x0000000000000000000000000000000000000001 = a.allthingscrypto.eth ,, \
             0x0000000000000000000000000000000000000002=b.allthingscrypto.eth,",
        )
        .unwrap();
        assert_eq!(directory.len(), 2);
    }

    #[test]
    fn test_from_pairs_rejects_malformed_entries() {
        assert!(StaticFallbackDirectory::from_pairs("not-a-pair").is_err());
        assert!(StaticFallbackDirectory::from_pairs("0x12=a.allthingscrypto.eth").is_err());
        assert!(
            StaticFallbackDirectory::from_pairs("0x0000000000000000000000000000000000000001=")
                .is_err()
        );
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"0x0000000000000000000000000000000000000009": "nine.allthingscrypto.eth"}}"#
        )
        .unwrap();

        let directory = StaticFallbackDirectory::from_json_file(file.path()).unwrap();
        assert_eq!(
            directory
                .lookup(&addr("0x0000000000000000000000000000000000000009"))
                .as_deref(),
            Some("nine.allthingscrypto.eth")
        );
    }

    #[test]
    fn test_from_json_file_missing_path() {
        let result = StaticFallbackDirectory::from_json_file("/nonexistent/fallback.json");
        assert!(matches!(result, Err(ConfigError::LoadFailed { .. })));
    }

    #[test]
    fn test_extend_overrides_existing_entries() {
        let directory = StaticFallbackDirectory::demo();
        let extra = StaticFallbackDirectory::from_pairs(
            "0x0000000000000000000000000000000000000001=override.allthingscrypto.eth",
        )
        .unwrap();
        directory.extend(extra);

        let demo = addr("0x0000000000000000000000000000000000000001");
        assert_eq!(
            directory.lookup(&demo).as_deref(),
            Some("override.allthingscrypto.eth")
        );
        assert_eq!(directory.len(), DEMO_ENTRIES.len());
    }
}
