//! Error taxonomy for the access gate.

use thiserror::Error;

/// Top-level application error
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Wallet connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Rate limit exceeded")]
    RateLimited,
}

/// Input validation failures, rejected before any lookup happens
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("{0}")]
    Multiple(String),
}

/// Failure of one outbound lookup.
///
/// These never reach the caller of `verify` and have no `AppError` variant;
/// the verifier records them and moves on to the next source.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API returned {status_code}: {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::ParseError(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Wallet provider and connection state machine errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("No wallet provider available")]
    ProviderUnavailable,

    #[error("User rejected the connection request")]
    UserRejected,

    #[error("Wallet provider error: {0}")]
    Provider(String),

    #[error("No wallet connected")]
    NotConnected,

    #[error("A verification is already in flight")]
    VerificationInFlight,
}

/// Startup configuration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },

    #[error("Failed to load {path}: {message}")]
    LoadFailed { path: String, message: String },
}
