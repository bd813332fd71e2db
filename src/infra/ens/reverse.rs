//! Reverse resolution through an ENS lookup HTTP API.
//!
//! Expects `GET {base}/ens/resolve/{address}` to answer with
//! `{ "address": "...", "name": "...", ... }`, where `name` is empty or null
//! when no primary name is set.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, instrument};

use super::{HttpLookupConfig, ensure_success};
use crate::domain::{LookupError, NameResolver, WalletAddress};

/// Default reverse resolution API base URL
pub const DEFAULT_REVERSE_API_URL: &str = "https://api.ensideas.com";

/// Address used when probing the API for health
const PROBE_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReverseResolveResponse {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Resolves the primary ENS name of an address
#[derive(Debug, Clone)]
pub struct EnsReverseResolver {
    http_client: Client,
    base_url: String,
}

impl EnsReverseResolver {
    /// Create a resolver against `base_url` (defaults to the public API)
    pub fn new(base_url: Option<String>, config: &HttpLookupConfig) -> Result<Self, LookupError> {
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_REVERSE_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            http_client: config.build_client()?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch(&self, address: &str) -> Result<ReverseResolveResponse, LookupError> {
        let url = format!("{}/ens/resolve/{}", self.base_url, address);
        debug!(url = %url, "Calling reverse resolution API");

        let response = self.http_client.get(&url).send().await.map_err(|e| {
            error!(error = %e, "Reverse resolution request failed");
            LookupError::from(e)
        })?;
        let response = ensure_success(response).await?;

        response.json::<ReverseResolveResponse>().await.map_err(|e| {
            error!(error = %e, "Failed to parse reverse resolution response");
            LookupError::ParseError(e.to_string())
        })
    }
}

#[async_trait]
impl NameResolver for EnsReverseResolver {
    #[instrument(skip(self), fields(address = %address))]
    async fn primary_name(&self, address: &WalletAddress) -> Result<Option<String>, LookupError> {
        let body = self.fetch(&address.to_string()).await?;
        let name = body
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        debug!(name = ?name, display_name = ?body.display_name, "Reverse resolution complete");
        Ok(name)
    }

    async fn health_check(&self) -> Result<(), LookupError> {
        self.fetch(PROBE_ADDRESS).await.map(|_| ())
    }
}
