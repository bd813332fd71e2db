//! Infrastructure layer implementations.

pub mod ens;
pub mod fallback;

pub use ens::{EnsReverseResolver, EnsSubgraphClient, HttpLookupConfig};
pub use fallback::StaticFallbackDirectory;
