//! HTTP request handlers with OpenAPI documentation.

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;
use utoipa::OpenApi;

use crate::app::AppState;
use crate::domain::{
    AccessTier, AppError, ChallengeRequest, ChallengeResponse, CheckOwnershipRequest,
    CheckOwnershipResponse, ConnectionError, ErrorDetail, ErrorResponse, HealthResponse,
    HealthStatus, RateLimitResponse, SourceHealth, ValidationError,
};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    info(
        title = "ENS Access Gate API",
        version = "0.1.0",
        description = "Checks whether a wallet owns an ENS subdomain that unlocks premium content",
        license(
            name = "MIT"
        )
    ),
    paths(
        check_ownership_handler,
        challenge_handler,
        health_check_handler,
        liveness_handler,
        readiness_handler,
    ),
    components(
        schemas(
            CheckOwnershipRequest,
            CheckOwnershipResponse,
            ChallengeRequest,
            ChallengeResponse,
            AccessTier,
            HealthResponse,
            HealthStatus,
            SourceHealth,
            ErrorResponse,
            ErrorDetail,
            RateLimitResponse,
        )
    ),
    tags(
        (name = "access", description = "Premium content access checks"),
        (name = "health", description = "Health check endpoints")
    )
)]
pub struct ApiDoc;

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        AppError::Validation(ValidationError::InvalidField {
            field: "body".to_string(),
            message: rejection.body_text(),
        })
    })
}

/// Check ENS subdomain ownership
///
/// Looks up the address's names in order (reverse record, owned names,
/// fallback table) and grants access for the first name under the required
/// suffix. Finding nothing is a normal `200` with `granted: false`.
///
/// When signatures are enforced, `nonce` and `signature` from `POST /challenge`
/// are required.
#[utoipa::path(
    post,
    path = "/check-ownership",
    tag = "access",
    request_body = CheckOwnershipRequest,
    responses(
        (status = 200, description = "Ownership check completed", body = CheckOwnershipResponse),
        (status = 400, description = "Malformed address or request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid signed challenge", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = RateLimitResponse)
    )
)]
pub async fn check_ownership_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CheckOwnershipRequest>, JsonRejection>,
) -> Result<Json<CheckOwnershipResponse>, AppError> {
    let request = json_body(payload)?;
    let result = state.service.check_ownership(&request).await?;
    Ok(Json(result.into()))
}

/// Issue a sign-in challenge
///
/// Returns a single-use message for the wallet to sign with `personal_sign`.
#[utoipa::path(
    post,
    path = "/challenge",
    tag = "access",
    request_body = ChallengeRequest,
    responses(
        (status = 200, description = "Challenge issued", body = ChallengeResponse),
        (status = 400, description = "Malformed address", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = RateLimitResponse)
    )
)]
pub async fn challenge_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChallengeRequest>, JsonRejection>,
) -> Result<Json<ChallengeResponse>, AppError> {
    let request = json_body(payload)?;
    let challenge = state.service.issue_challenge(&request.address)?;
    Ok(Json(challenge))
}

/// Detailed health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Health status", body = HealthResponse)
    )
)]
pub async fn health_check_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let health = state.service.health_check().await;
    Json(health)
}

/// Kubernetes liveness probe
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "health",
    responses(
        (status = 200, description = "Application is alive")
    )
)]
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Kubernetes readiness probe
///
/// Lookup sources are optional and are not contacted here. `/health`
/// reports their status.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Application is ready to serve traffic")
    )
)]
pub async fn readiness_handler() -> StatusCode {
    StatusCode::OK
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_type, message) = match &self {
            AppError::Validation(ValidationError::InvalidAddress(_)) => {
                (StatusCode::BAD_REQUEST, "invalid_address", self.to_string())
            }
            AppError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                self.to_string(),
            ),
            AppError::Connection(conn_err) => match conn_err {
                ConnectionError::ProviderUnavailable => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "provider_unavailable",
                    self.to_string(),
                ),
                ConnectionError::UserRejected => {
                    (StatusCode::FORBIDDEN, "user_rejected", self.to_string())
                }
                _ => (StatusCode::CONFLICT, "connection_error", self.to_string()),
            },
            AppError::Authentication(_) => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                self.to_string(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                self.to_string(),
            ),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "Rate limit exceeded".to_string(),
            ),
        };

        if status.is_server_error() {
            error!(error_type = %error_type, message = %message, "Server error");
        }

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                r#type: error_type.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (
                AppError::Validation(ValidationError::InvalidAddress("x".to_string())),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Authentication("nope".to_string()),
                StatusCode::UNAUTHORIZED,
            ),
            (AppError::RateLimited, StatusCode::TOO_MANY_REQUESTS),
            (
                AppError::Connection(ConnectionError::ProviderUnavailable),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AppError::Internal("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
