//! HTTP clients for ENS name lookups.
//!
//! - [`EnsReverseResolver`]: primary name of an address (reverse record)
//! - [`EnsSubgraphClient`]: every name an address owns, via the ENS subgraph

pub mod reverse;
pub mod subgraph;

use std::time::Duration;

use reqwest::Client;

use crate::domain::LookupError;

pub use reverse::{DEFAULT_REVERSE_API_URL, EnsReverseResolver};
pub use subgraph::{DEFAULT_SUBGRAPH_URL, EnsSubgraphClient};

/// Default per-request timeout for outbound lookups
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings shared by the HTTP lookup clients
#[derive(Debug, Clone)]
pub struct HttpLookupConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpLookupConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_LOOKUP_TIMEOUT,
            user_agent: format!("ens-access-gate/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpLookupConfig {
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn build_client(&self) -> Result<Client, LookupError> {
        Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()
            .map_err(|e| LookupError::Unavailable(format!("Failed to create HTTP client: {}", e)))
    }
}

/// Turn a non-2xx response into an `ApiError`
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, LookupError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(LookupError::ApiError {
        status_code: status.as_u16(),
        message: body,
    })
}
