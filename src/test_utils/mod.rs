//! Test utilities and mock implementations.

pub mod mocks;

pub use mocks::{
    MockConfig, MockFallbackDirectory, MockNameResolver, MockOwnedNamesSource, MockWalletProvider,
};
