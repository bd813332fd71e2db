//! Registry scan through the ENS subgraph (GraphQL over HTTP).

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, instrument, warn};

use super::{HttpLookupConfig, ensure_success};
use crate::domain::{LookupError, OwnedNamesSource, WalletAddress};

/// Default ENS subgraph endpoint
pub const DEFAULT_SUBGRAPH_URL: &str = "https://api.thegraph.com/subgraphs/name/ensdomains/ens";

/// Upper bound on names fetched per category
const MAX_NAMES: u32 = 100;

/// Registry owners and NameWrapper owners are tracked separately, so both are queried.
const OWNED_NAMES_QUERY: &str = r#"
query OwnedNames($owner: String!, $first: Int!) {
  domains(first: $first, where: { owner: $owner }) { name }
  wrappedDomains(first: $first, where: { owner: $owner }) { name }
}
"#;

/// Same scan restricted server-side to names under a parent, so wallets
/// holding many unrelated names are not cut off at `MAX_NAMES`.
const OWNED_NAMES_WITH_SUFFIX_QUERY: &str = r#"
query OwnedNames($owner: String!, $suffix: String!, $first: Int!) {
  domains(first: $first, where: { owner: $owner, name_ends_with: $suffix }) { name }
  wrappedDomains(first: $first, where: { owner: $owner, name_ends_with: $suffix }) { name }
}
"#;

const META_QUERY: &str = "{ _meta { block { number } } }";

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct NamedEntity {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OwnedNamesData {
    #[serde(default)]
    domains: Vec<NamedEntity>,
    #[serde(default)]
    wrapped_domains: Vec<NamedEntity>,
}

/// Lists names owned by an address via the ENS subgraph
#[derive(Debug, Clone)]
pub struct EnsSubgraphClient {
    http_client: Client,
    url: String,
    api_key: Option<SecretString>,
    name_suffix: Option<String>,
}

impl EnsSubgraphClient {
    /// Create a client for `url` (defaults to the hosted ENS subgraph)
    pub fn new(
        url: Option<String>,
        api_key: Option<SecretString>,
        config: &HttpLookupConfig,
    ) -> Result<Self, LookupError> {
        Ok(Self {
            http_client: config.build_client()?,
            url: url.unwrap_or_else(|| DEFAULT_SUBGRAPH_URL.to_string()),
            api_key,
            name_suffix: None,
        })
    }

    /// Only fetch names ending in `suffix` (builder pattern).
    /// An empty suffix leaves the scan unfiltered.
    #[must_use]
    pub fn with_name_suffix(mut self, suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        self.name_suffix = (!suffix.is_empty()).then_some(suffix);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn query<T: for<'de> Deserialize<'de>>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, LookupError> {
        let mut request = self
            .http_client
            .post(&self.url)
            .json(&GraphQlRequest { query, variables });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, "Subgraph request failed");
            LookupError::from(e)
        })?;
        let response = ensure_success(response).await?;

        let body: GraphQlResponse<T> = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse subgraph response");
            LookupError::ParseError(e.to_string())
        })?;

        if !body.errors.is_empty() {
            let messages: Vec<_> = body.errors.into_iter().map(|e| e.message).collect();
            warn!(errors = ?messages, "Subgraph returned GraphQL errors");
            // Partial data is still unreliable for an ownership answer.
            return Err(LookupError::ApiError {
                status_code: 200,
                message: messages.join("; "),
            });
        }

        body.data
            .ok_or_else(|| LookupError::ParseError("Subgraph response has no data".to_string()))
    }
}

#[async_trait]
impl OwnedNamesSource for EnsSubgraphClient {
    #[instrument(skip(self), fields(address = %address))]
    async fn owned_names(&self, address: &WalletAddress) -> Result<Vec<String>, LookupError> {
        // Subgraph account ids are lowercase hex, which is the Display form.
        let owner = address.to_string();
        let data: OwnedNamesData = match &self.name_suffix {
            Some(suffix) => {
                self.query(
                    OWNED_NAMES_WITH_SUFFIX_QUERY,
                    json!({ "owner": owner, "suffix": suffix, "first": MAX_NAMES }),
                )
                .await?
            }
            None => {
                self.query(
                    OWNED_NAMES_QUERY,
                    json!({ "owner": owner, "first": MAX_NAMES }),
                )
                .await?
            }
        };

        let names: Vec<String> = data
            .domains
            .into_iter()
            .chain(data.wrapped_domains)
            .filter_map(|d| d.name)
            .filter(|n| !n.is_empty())
            .collect();

        debug!(count = names.len(), "Subgraph registry scan complete");
        Ok(names)
    }

    async fn health_check(&self) -> Result<(), LookupError> {
        self.query::<serde_json::Value>(META_QUERY, json!({}))
            .await
            .map(|_| ())
    }
}
