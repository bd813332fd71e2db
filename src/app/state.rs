//! Application state management.

use std::sync::Arc;

use super::challenge::ChallengeService;
use super::service::AppService;
use super::verifier::AccessVerifier;

/// Shared application state, built once at startup and handed to handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AppService>,
}

impl AppState {
    /// Create application state without signature enforcement
    #[must_use]
    pub fn new(verifier: Arc<AccessVerifier>) -> Self {
        Self::with_challenges(verifier, Arc::new(ChallengeService::default()), false)
    }

    /// Create application state with an explicit challenge service
    #[must_use]
    pub fn with_challenges(
        verifier: Arc<AccessVerifier>,
        challenges: Arc<ChallengeService>,
        require_signature: bool,
    ) -> Self {
        Self {
            service: Arc::new(AppService::new(verifier, challenges, require_signature)),
        }
    }
}
