//! Domain layer containing core types, traits, and error definitions.

pub mod error;
pub mod signature;
pub mod traits;
pub mod types;

pub use error::{AppError, ConfigError, ConnectionError, LookupError, ValidationError};
pub use signature::{address_from_public_key, personal_sign_digest, recover_personal_sign_address};
pub use traits::{FallbackDirectory, NameResolver, OwnedNamesSource, WalletProvider};
pub use types::{
    AccessResult, AccessTier, ChallengeRequest, ChallengeResponse, CheckOwnershipRequest,
    CheckOwnershipResponse, ErrorDetail, ErrorResponse, HealthResponse, HealthStatus,
    LookupStep, RateLimitResponse, SourceHealth, StepOutcome, StepReport, VerificationReport,
    WalletAddress,
};
