//! Router construction, CORS and rate limiting.

use std::env;
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use governor::{
    DefaultDirectRateLimiter, Quota, RateLimiter,
    clock::{Clock, DefaultClock},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::{debug, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    ApiDoc, challenge_handler, check_ownership_handler, health_check_handler, liveness_handler,
    readiness_handler,
};
use crate::app::AppState;
use crate::domain::{ErrorDetail, RateLimitResponse};

/// Request bodies are tiny; anything larger is rejected
const MAX_BODY_BYTES: usize = 16 * 1024;

/// Global rate limiting settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub requests_per_second: NonZeroU32,
    pub burst_size: NonZeroU32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: NonZeroU32::new(10).unwrap_or(NonZeroU32::MIN),
            burst_size: NonZeroU32::new(20).unwrap_or(NonZeroU32::MIN),
        }
    }
}

impl RateLimitConfig {
    /// Read `RATE_LIMIT_RPS` and `RATE_LIMIT_BURST`, keeping defaults for
    /// missing or invalid values
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let read = |name: &str, default: NonZeroU32| {
            env::var(name)
                .ok()
                .and_then(|v| v.parse::<NonZeroU32>().ok())
                .unwrap_or(default)
        };
        Self {
            requests_per_second: read("RATE_LIMIT_RPS", defaults.requests_per_second),
            burst_size: read("RATE_LIMIT_BURST", defaults.burst_size),
        }
    }

    fn limiter(&self) -> DefaultDirectRateLimiter {
        RateLimiter::direct(Quota::per_second(self.requests_per_second).allow_burst(self.burst_size))
    }
}

/// Router settings beyond the application state
#[derive(Debug, Clone, Default)]
pub struct RouterConfig {
    /// Allowed CORS origins; empty or `*` allows any origin
    pub cors_allowed_origins: Vec<String>,
    /// Global rate limit, if enabled
    pub rate_limit: Option<RateLimitConfig>,
}

impl RouterConfig {
    /// Parse a comma-separated `CORS_ALLOWED_ORIGINS` value
    #[must_use]
    pub fn parse_origins(value: &str) -> Vec<String> {
        value
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(parsed))
}

async fn rate_limit_middleware(
    State(limiter): State<Arc<DefaultDirectRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    match limiter.check() {
        Ok(()) => next.run(request).await,
        Err(not_until) => {
            let wait = not_until.wait_time_from(DefaultClock::default().now());
            let retry_after = wait.as_secs().max(1);
            debug!(retry_after, "Rate limit exceeded");

            let body = RateLimitResponse {
                error: ErrorDetail {
                    r#type: "rate_limited".to_string(),
                    message: "Rate limit exceeded".to_string(),
                },
                retry_after,
            };
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_after.to_string())],
                Json(body),
            )
                .into_response()
        }
    }
}

/// Create the router with permissive CORS and no rate limiting
pub fn create_router(state: Arc<AppState>) -> Router {
    create_router_with_config(state, RouterConfig::default())
}

/// Create the router with a global rate limit on the access endpoints
pub fn create_router_with_rate_limit(state: Arc<AppState>, config: RateLimitConfig) -> Router {
    create_router_with_config(
        state,
        RouterConfig {
            rate_limit: Some(config),
            ..Default::default()
        },
    )
}

/// Create the router from explicit settings
pub fn create_router_with_config(state: Arc<AppState>, config: RouterConfig) -> Router {
    let mut access_routes = Router::new()
        .route("/check-ownership", post(check_ownership_handler))
        .route("/challenge", post(challenge_handler));

    if let Some(rate_limit) = config.rate_limit {
        let limiter = Arc::new(rate_limit.limiter());
        access_routes =
            access_routes.layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));
    }

    let health_routes = Router::new()
        .route("/health", get(health_check_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler));

    Router::new()
        .merge(access_routes)
        .merge(health_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.cors_allowed_origins)),
        )
}
