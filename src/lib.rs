//! ENS subdomain ownership checks for gating premium content.
//!
//! Layers:
//! - [`domain`]: wallet addresses, access tiers, errors and collaborator traits
//! - [`app`]: the access verifier, wallet connection flow and signed challenges
//! - [`infra`]: HTTP name resolution clients and the static fallback directory
//! - [`api`]: axum handlers and routing

pub mod api;
pub mod app;
pub mod domain;
pub mod infra;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
