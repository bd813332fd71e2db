//! Application service: request-level orchestration over the verifier.

use std::str::FromStr;
use std::sync::Arc;

use tracing::{info, instrument, warn};
use validator::Validate;

use crate::domain::{
    AccessResult, AppError, ChallengeResponse, CheckOwnershipRequest, HealthResponse,
    ValidationError, WalletAddress,
};

use super::challenge::ChallengeService;
use super::verifier::AccessVerifier;

/// Application service containing business logic
pub struct AppService {
    verifier: Arc<AccessVerifier>,
    challenges: Arc<ChallengeService>,
    require_signature: bool,
}

impl AppService {
    #[must_use]
    pub fn new(
        verifier: Arc<AccessVerifier>,
        challenges: Arc<ChallengeService>,
        require_signature: bool,
    ) -> Self {
        Self {
            verifier,
            challenges,
            require_signature,
        }
    }

    /// Check whether the requested address unlocks premium content.
    ///
    /// The address is validated before anything else. With signatures
    /// enforced, the signed challenge is redeemed before any lookup runs.
    #[instrument(skip(self, request), fields(address = %request.address))]
    pub async fn check_ownership(
        &self,
        request: &CheckOwnershipRequest,
    ) -> Result<AccessResult, AppError> {
        let address = WalletAddress::from_str(&request.address).map_err(|e| {
            warn!(error = %e, "Rejected malformed address");
            e
        })?;

        request.validate().map_err(|e| {
            warn!(error = %e, "Validation failed");
            AppError::Validation(ValidationError::Multiple(e.to_string()))
        })?;

        if self.require_signature {
            let (Some(nonce), Some(signature)) = (&request.nonce, &request.signature) else {
                return Err(AppError::Authentication(
                    "A signed challenge is required".to_string(),
                ));
            };
            self.challenges.redeem(&address, nonce, signature)?;
        }

        let report = self.verifier.verify_address(&address).await;
        info!(
            granted = report.result.granted,
            tier = %report.result.tier,
            steps = report.steps.len(),
            had_failures = report.had_failures(),
            "Ownership check complete"
        );
        Ok(report.result)
    }

    /// Issue a challenge for the caller to sign
    pub fn issue_challenge(&self, address: &str) -> Result<ChallengeResponse, AppError> {
        let address = WalletAddress::from_str(address)?;
        let challenge = self.challenges.issue(&address)?;
        Ok(ChallengeResponse {
            address: challenge.address.to_string(),
            nonce: challenge.nonce,
            message: challenge.message,
            expires_at: challenge.expires_at,
        })
    }

    /// Aggregate health of the lookup sources
    pub async fn health_check(&self) -> HealthResponse {
        HealthResponse::new(self.verifier.source_health().await)
    }
}
