//! Signed challenges proving control of a wallet address.
//!
//! A caller requests a challenge for an address, signs the returned message
//! with `personal_sign`, and presents nonce + signature with the ownership
//! check. Challenges are single use and expire.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{AppError, WalletAddress, recover_personal_sign_address};

/// Default challenge lifetime: 5 minutes
pub const DEFAULT_CHALLENGE_TTL_SECS: i64 = 300;

/// Longest accepted challenge lifetime: 1 day
pub const MAX_CHALLENGE_TTL_SECS: i64 = 86_400;

/// Upper bound on outstanding challenges across all addresses
pub const DEFAULT_MAX_PENDING_CHALLENGES: usize = 10_000;

/// Name shown at the start of the message to sign
pub const DEFAULT_SITE_NAME: &str = "The Complete Ethereum Story";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub address: WalletAddress,
    pub nonce: String,
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

impl Challenge {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Outstanding challenges keyed by nonce.
///
/// An address may hold several challenges at once, so issuing one for an
/// address never invalidates another caller's pending challenge.
pub struct ChallengeService {
    pending: DashMap<String, Challenge>,
    ttl: Duration,
    max_pending: usize,
}

impl Default for ChallengeService {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_CHALLENGE_TTL_SECS))
    }
}

impl ChallengeService {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            pending: DashMap::new(),
            ttl,
            max_pending: DEFAULT_MAX_PENDING_CHALLENGES,
        }
    }

    /// Cap the number of outstanding challenges (builder pattern)
    #[must_use]
    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending;
        self
    }

    fn message_for(address: &WalletAddress, nonce: &str, expires_at: DateTime<Utc>) -> String {
        format!(
            "{} wants you to prove ownership of {}.\n\nNonce: {}\nExpires At: {}",
            DEFAULT_SITE_NAME,
            address,
            nonce,
            expires_at.to_rfc3339()
        )
    }

    /// Issue a fresh challenge for the address.
    ///
    /// Fails with `RateLimited` once `max_pending` unexpired challenges are
    /// outstanding.
    #[instrument(skip(self), fields(address = %address))]
    pub fn issue(&self, address: &WalletAddress) -> Result<Challenge, AppError> {
        self.purge_expired();
        if self.pending.len() >= self.max_pending {
            warn!(pending = self.pending.len(), "Too many pending challenges");
            return Err(AppError::RateLimited);
        }

        let expires_at = Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Internal("Challenge expiry out of range".to_string()))?;
        let nonce = Uuid::new_v4().simple().to_string();
        let challenge = Challenge {
            address: *address,
            message: Self::message_for(address, &nonce, expires_at),
            nonce,
            expires_at,
        };

        self.pending
            .insert(challenge.nonce.clone(), challenge.clone());
        debug!(expires_at = %expires_at, "Challenge issued");
        Ok(challenge)
    }

    /// Check the signature over a pending challenge and consume it.
    ///
    /// Only a valid signature from the bound address consumes the challenge.
    /// Expired challenges are dropped.
    #[instrument(skip(self, nonce, signature), fields(address = %address))]
    pub fn redeem(
        &self,
        address: &WalletAddress,
        nonce: &str,
        signature: &str,
    ) -> Result<(), AppError> {
        let challenge = self
            .pending
            .get(nonce)
            .map(|entry| entry.value().clone())
            .filter(|c| c.address == *address)
            .ok_or_else(|| {
                warn!("No pending challenge for nonce");
                AppError::Authentication("No pending challenge for this address".to_string())
            })?;

        if challenge.is_expired(Utc::now()) {
            self.pending.remove_if(nonce, |_, c| c.address == *address);
            return Err(AppError::Authentication("Challenge expired".to_string()));
        }

        let signer = recover_personal_sign_address(&challenge.message, signature)
            .map_err(|e| AppError::Authentication(e.to_string()))?;
        if signer != *address {
            warn!(signer = %signer, "Signature does not match address");
            return Err(AppError::Authentication(
                "Signature does not match address".to_string(),
            ));
        }

        self.pending
            .remove_if(nonce, |_, c| c.address == *address)
            .ok_or_else(|| AppError::Authentication("Challenge already used".to_string()))?;
        info!("Challenge redeemed");
        Ok(())
    }

    /// Drop every expired challenge
    pub fn purge_expired(&self) {
        let now = Utc::now();
        self.pending.retain(|_, c| !c.is_expired(now));
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
