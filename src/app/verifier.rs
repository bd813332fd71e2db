//! ENS ownership verification with ordered fallback.
//!
//! Sources are consulted one after another and the first usable name wins:
//! 1. **Reverse resolution**: the address's primary name
//! 2. **Registry scan**: every name the address owns, first match under the suffix
//! 3. **Fallback table**: the in-process directory of known addresses
//!
//! A failing source is logged and recorded in the report, then treated as no
//! match. Verification itself only fails on a malformed address.

use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::domain::{
    AccessResult, AppError, FallbackDirectory, HealthStatus, LookupStep, NameResolver,
    OwnedNamesSource, SourceHealth, StepOutcome, StepReport, VerificationReport, WalletAddress,
};

/// Parent name whose subdomains unlock premium content
pub const DEFAULT_REQUIRED_SUFFIX: &str = ".allthingscrypto.eth";

/// Lowercase the suffix and make sure it starts with a dot
#[must_use]
pub fn normalize_suffix(suffix: &str) -> String {
    let suffix = suffix.trim().to_lowercase();
    if suffix.starts_with('.') {
        suffix
    } else {
        format!(".{}", suffix)
    }
}

pub struct AccessVerifier {
    resolver: Option<Arc<dyn NameResolver>>,
    registry: Option<Arc<dyn OwnedNamesSource>>,
    fallback: Option<Arc<dyn FallbackDirectory>>,
    required_suffix: String,
}

impl AccessVerifier {
    /// Create a verifier with no sources; add them with the `with_*` builders.
    #[must_use]
    pub fn new(required_suffix: &str) -> Self {
        Self {
            resolver: None,
            registry: None,
            fallback: None,
            required_suffix: normalize_suffix(required_suffix),
        }
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn NameResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: Arc<dyn OwnedNamesSource>) -> Self {
        self.registry = Some(registry);
        self
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: Arc<dyn FallbackDirectory>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn required_suffix(&self) -> &str {
        &self.required_suffix
    }

    /// Whether `name` is a subdomain under the required suffix
    #[must_use]
    pub fn is_eligible_name(&self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        name.len() > self.required_suffix.len() && name.ends_with(&self.required_suffix)
    }

    /// Validate `address` and verify it.
    ///
    /// Returns `InvalidAddress` for malformed input before any lookup runs.
    pub async fn verify(&self, address: &str) -> Result<AccessResult, AppError> {
        Ok(self.verify_detailed(address).await?.result)
    }

    /// Like [`verify`](Self::verify) but also returns the per-step trail
    pub async fn verify_detailed(&self, address: &str) -> Result<VerificationReport, AppError> {
        let address = WalletAddress::from_str(address)?;
        Ok(self.verify_address(&address).await)
    }

    /// Run the lookup chain for an already-validated address
    #[instrument(skip(self), fields(address = %address))]
    pub async fn verify_address(&self, address: &WalletAddress) -> VerificationReport {
        let mut steps = Vec::with_capacity(3);

        if let Some(resolver) = &self.resolver {
            let outcome = match resolver.primary_name(address).await {
                Ok(Some(name)) if self.is_eligible_name(&name) => StepOutcome::Matched(name),
                Ok(_) => StepOutcome::NoMatch,
                Err(e) => StepOutcome::Failed(e),
            };
            if let Some(result) = self.record(&mut steps, LookupStep::ReverseResolution, outcome) {
                return VerificationReport {
                    address: *address,
                    result,
                    steps,
                };
            }
        }

        if let Some(registry) = &self.registry {
            let outcome = match registry.owned_names(address).await {
                // Ordering is whatever the source returned.
                Ok(names) => names
                    .into_iter()
                    .find(|n| self.is_eligible_name(n))
                    .map_or(StepOutcome::NoMatch, StepOutcome::Matched),
                Err(e) => StepOutcome::Failed(e),
            };
            if let Some(result) = self.record(&mut steps, LookupStep::RegistryScan, outcome) {
                return VerificationReport {
                    address: *address,
                    result,
                    steps,
                };
            }
        }

        if let Some(fallback) = &self.fallback {
            let outcome = fallback
                .lookup(address)
                .filter(|n| self.is_eligible_name(n))
                .map_or(StepOutcome::NoMatch, StepOutcome::Matched);
            if let Some(result) = self.record(&mut steps, LookupStep::FallbackTable, outcome) {
                return VerificationReport {
                    address: *address,
                    result,
                    steps,
                };
            }
        }

        debug!("No source produced an eligible name");
        VerificationReport {
            address: *address,
            result: AccessResult::denied(),
            steps,
        }
    }

    /// Log and push a step; returns the granted result on a match
    fn record(
        &self,
        steps: &mut Vec<StepReport>,
        step: LookupStep,
        outcome: StepOutcome,
    ) -> Option<AccessResult> {
        let granted = match &outcome {
            StepOutcome::Matched(name) => {
                let result = AccessResult::granted(name.trim());
                info!(step = %step, name = %name, tier = %result.tier, "Access granted");
                Some(result)
            }
            StepOutcome::NoMatch => {
                debug!(step = %step, "No eligible name");
                None
            }
            StepOutcome::Failed(e) => {
                warn!(step = %step, error = %e, "Lookup failed, trying next source");
                None
            }
        };
        steps.push(StepReport { step, outcome });
        granted
    }

    /// Health of every configured source
    pub async fn source_health(&self) -> Vec<SourceHealth> {
        let mut sources = Vec::with_capacity(3);

        if let Some(resolver) = &self.resolver {
            sources.push(to_source_health(
                LookupStep::ReverseResolution,
                resolver.health_check().await,
            ));
        }
        if let Some(registry) = &self.registry {
            sources.push(to_source_health(
                LookupStep::RegistryScan,
                registry.health_check().await,
            ));
        }
        if let Some(fallback) = &self.fallback {
            debug!(entries = fallback.len(), "Fallback table health");
            sources.push(to_source_health(LookupStep::FallbackTable, Ok(())));
        }

        sources
    }
}

fn to_source_health(step: LookupStep, result: Result<(), crate::domain::LookupError>) -> SourceHealth {
    match result {
        Ok(()) => SourceHealth {
            name: step.to_string(),
            status: HealthStatus::Healthy,
            error: None,
        },
        Err(e) => {
            warn!(source = %step, error = %e, "Lookup source health check failed");
            SourceHealth {
                name: step.to_string(),
                status: HealthStatus::Unhealthy,
                error: Some(e.to_string()),
            }
        }
    }
}
