//! Application layer containing business logic and shared state.

pub mod challenge;
pub mod connection;
pub mod service;
pub mod state;
pub mod verifier;

pub use challenge::{
    Challenge, ChallengeService, DEFAULT_CHALLENGE_TTL_SECS, DEFAULT_MAX_PENDING_CHALLENGES,
    MAX_CHALLENGE_TTL_SECS,
};
pub use connection::{ConnectionFlow, ConnectionState, VerificationTicket};
pub use service::AppService;
pub use state::AppState;
pub use verifier::{AccessVerifier, DEFAULT_REQUIRED_SUFFIX, normalize_suffix};
