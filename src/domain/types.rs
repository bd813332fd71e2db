//! Domain types with validation support.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::error::{LookupError, ValidationError};

/// A 20-byte Ethereum account identifier.
///
/// Parsed from `0x` followed by 40 hex characters in any casing. The checksum
/// casing is not validated, and two addresses that differ only in casing are
/// equal. Always displayed in lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress([u8; 20]);

impl WalletAddress {
    #[must_use]
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl std::str::FromStr for WalletAddress {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidAddress(s.to_string());

        let hex_part = s.strip_prefix("0x").ok_or_else(invalid)?;
        if hex_part.len() != 40 || !hex_part.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(hex_part, &mut bytes).map_err(|_| invalid())?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WalletAddress> for String {
    fn from(address: WalletAddress) -> Self {
        address.to_string()
    }
}

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Access level derived from the matched name
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccessTier {
    /// No access
    #[default]
    None,
    Standard,
    Premium,
    Diamond,
    Founder,
    Legendary,
}

/// Keywords searched for in the leftmost label, highest priority first
const TIER_KEYWORDS: &[(&[&str], AccessTier)] = &[
    (&["legendary"], AccessTier::Legendary),
    (&["founder", "genesis"], AccessTier::Founder),
    (&["premium", "pro"], AccessTier::Premium),
    (&["diamond", "platinum"], AccessTier::Diamond),
];

impl AccessTier {
    /// Derive the tier for a matched name from its leftmost label.
    ///
    /// Labels are compared lowercased; a label with no keyword is `Standard`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let label = name.split('.').next().unwrap_or_default().to_lowercase();

        TIER_KEYWORDS
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| label.contains(k)))
            .map(|(_, tier)| *tier)
            .unwrap_or(Self::Standard)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Standard => "standard",
            Self::Premium => "premium",
            Self::Diamond => "diamond",
            Self::Founder => "founder",
            Self::Legendary => "legendary",
        }
    }
}

impl std::str::FromStr for AccessTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "standard" => Ok(Self::Standard),
            "premium" => Ok(Self::Premium),
            "diamond" => Ok(Self::Diamond),
            "founder" => Ok(Self::Founder),
            "legendary" => Ok(Self::Legendary),
            _ => Err(format!("Invalid access tier: {}", s)),
        }
    }
}

impl std::fmt::Display for AccessTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one verification attempt. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessResult {
    pub granted: bool,
    pub name: Option<String>,
    pub tier: AccessTier,
}

impl AccessResult {
    #[must_use]
    pub fn granted(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            granted: true,
            tier: AccessTier::from_name(&name),
            name: Some(name),
        }
    }

    #[must_use]
    pub fn denied() -> Self {
        Self {
            granted: false,
            name: None,
            tier: AccessTier::None,
        }
    }
}

/// The lookup sources, in the order they are consulted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LookupStep {
    ReverseResolution,
    RegistryScan,
    FallbackTable,
}

impl LookupStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReverseResolution => "reverse_resolution",
            Self::RegistryScan => "registry_scan",
            Self::FallbackTable => "fallback_table",
        }
    }
}

impl std::fmt::Display for LookupStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a single lookup step produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// A name under the required suffix was found
    Matched(String),
    /// The source answered but had nothing usable
    NoMatch,
    /// The source errored; treated as no match
    Failed(LookupError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: LookupStep,
    pub outcome: StepOutcome,
}

/// Verification result plus the per-step trail that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    pub address: WalletAddress,
    pub result: AccessResult,
    pub steps: Vec<StepReport>,
}

impl VerificationReport {
    /// Step that produced the match, if any
    #[must_use]
    pub fn matched_step(&self) -> Option<LookupStep> {
        self.steps
            .iter()
            .find(|s| matches!(s.outcome, StepOutcome::Matched(_)))
            .map(|s| s.step)
    }

    /// Whether any step failed rather than answering
    #[must_use]
    pub fn had_failures(&self) -> bool {
        self.steps
            .iter()
            .any(|s| matches!(s.outcome, StepOutcome::Failed(_)))
    }
}

/// Request to check ENS subdomain ownership
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CheckOwnershipRequest {
    /// Wallet address (`0x` + 40 hex characters)
    #[schema(example = "0x0000000000000000000000000000000000000001")]
    pub address: String,
    /// Challenge nonce, required when signatures are enforced
    #[validate(length(min = 1, max = 64, message = "Nonce must be 1-64 characters"))]
    #[serde(default)]
    pub nonce: Option<String>,
    /// EIP-191 signature of the challenge message (65 bytes, hex)
    #[validate(length(min = 130, max = 132, message = "Signature must be 65 hex-encoded bytes"))]
    #[serde(default)]
    pub signature: Option<String>,
}

impl CheckOwnershipRequest {
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            nonce: None,
            signature: None,
        }
    }

    #[must_use]
    pub fn with_signature(mut self, nonce: impl Into<String>, signature: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self.signature = Some(signature.into());
        self
    }
}

/// Ownership check response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CheckOwnershipResponse {
    /// Whether premium content is unlocked
    pub granted: bool,
    /// Matched ENS name
    #[schema(example = "founder.allthingscrypto.eth")]
    pub name: Option<String>,
    /// Access tier; null when not granted
    pub tier: Option<AccessTier>,
}

impl From<AccessResult> for CheckOwnershipResponse {
    fn from(result: AccessResult) -> Self {
        let tier = match result.tier {
            AccessTier::None => None,
            tier => Some(tier),
        };
        Self {
            granted: result.granted,
            name: result.name,
            tier,
        }
    }
}

/// Request for a sign-in challenge
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChallengeRequest {
    #[schema(example = "0x0000000000000000000000000000000000000001")]
    pub address: String,
}

/// Challenge the wallet must sign with `personal_sign`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChallengeResponse {
    /// Lowercased wallet address the challenge is bound to
    pub address: String,
    pub nonce: String,
    /// Exact message to sign
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

/// Health status enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All systems operational
    Healthy,
    /// Some systems degraded but functional
    Degraded,
    /// Critical systems unavailable
    Unhealthy,
}

/// Health of one lookup source
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SourceHealth {
    #[schema(example = "reverse_resolution")]
    pub name: String,
    pub status: HealthStatus,
    pub error: Option<String>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Overall status
    pub status: HealthStatus,
    /// Per-source health
    pub sources: Vec<SourceHealth>,
    /// Current server timestamp
    pub timestamp: DateTime<Utc>,
    /// Application version
    #[schema(example = "0.1.0")]
    pub version: String,
}

impl HealthResponse {
    /// Lookup sources are optional, so a failing source only degrades the service.
    #[must_use]
    pub fn new(sources: Vec<SourceHealth>) -> Self {
        let status = if sources.iter().all(|s| s.status == HealthStatus::Healthy) {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };
        Self {
            status,
            sources,
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Error response structure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetail,
}

/// Error detail structure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Error type identifier
    #[schema(example = "invalid_address")]
    pub r#type: String,
    /// Human-readable error message
    #[schema(example = "Invalid wallet address: 0x123")]
    pub message: String,
}

/// Rate limit exceeded response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RateLimitResponse {
    /// Error details
    pub error: ErrorDetail,
    /// Seconds until rate limit resets
    #[schema(example = 1)]
    pub retry_after: u64,
}
