//! Application entry point.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use secrecy::SecretString;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use ens_access_gate::api::{RateLimitConfig, RouterConfig, create_router_with_config};
use ens_access_gate::app::{
    AccessVerifier, AppState, ChallengeService, DEFAULT_CHALLENGE_TTL_SECS,
    DEFAULT_REQUIRED_SUFFIX, MAX_CHALLENGE_TTL_SECS,
};
use ens_access_gate::domain::FallbackDirectory;
use ens_access_gate::infra::ens::DEFAULT_LOOKUP_TIMEOUT;
use ens_access_gate::infra::{
    EnsReverseResolver, EnsSubgraphClient, HttpLookupConfig, StaticFallbackDirectory,
};

/// Application configuration
struct Config {
    host: String,
    port: u16,
    required_suffix: String,
    /// `None` disables reverse resolution (variable set to an empty value)
    reverse_api_url: Option<Option<String>>,
    /// `None` disables the owned-names scan (variable set to an empty value)
    subgraph_url: Option<Option<String>>,
    subgraph_api_key: Option<SecretString>,
    lookup_timeout: Duration,
    fallback_table: Option<String>,
    fallback_table_path: Option<String>,
    enable_demo_fallback: bool,
    require_signature: bool,
    challenge_ttl_secs: i64,
    enable_rate_limiting: bool,
    rate_limit_config: RateLimitConfig,
    cors_allowed_origins: Vec<String>,
    json_logs: bool,
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

/// Unset means "use the default endpoint", empty means "disabled"
fn endpoint_var(name: &str) -> Option<Option<String>> {
    match env::var(name) {
        Ok(v) if v.trim().is_empty() => None,
        Ok(v) => Some(Some(v.trim().to_string())),
        Err(_) => Some(None),
    }
}

impl Config {
    fn from_env() -> Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let required_suffix = env::var("REQUIRED_NAME_SUFFIX")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REQUIRED_SUFFIX.to_string());

        let subgraph_api_key = env::var("ENS_SUBGRAPH_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .map(SecretString::from);

        let lookup_timeout = match env::var("LOOKUP_TIMEOUT_SECS") {
            Ok(v) => {
                let secs: u64 = v
                    .parse()
                    .with_context(|| format!("LOOKUP_TIMEOUT_SECS is not a number: {}", v))?;
                anyhow::ensure!(secs > 0, "LOOKUP_TIMEOUT_SECS must be greater than zero");
                Duration::from_secs(secs)
            }
            Err(_) => DEFAULT_LOOKUP_TIMEOUT,
        };

        let challenge_ttl_secs = match env::var("CHALLENGE_TTL_SECS") {
            Ok(v) => {
                let secs: i64 = v
                    .parse()
                    .with_context(|| format!("CHALLENGE_TTL_SECS is not a number: {}", v))?;
                anyhow::ensure!(
                    (1..=MAX_CHALLENGE_TTL_SECS).contains(&secs),
                    "CHALLENGE_TTL_SECS must be between 1 and {}",
                    MAX_CHALLENGE_TTL_SECS
                );
                secs
            }
            Err(_) => DEFAULT_CHALLENGE_TTL_SECS,
        };

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| RouterConfig::parse_origins(&v))
            .unwrap_or_default();

        Ok(Self {
            host,
            port,
            required_suffix,
            reverse_api_url: endpoint_var("ENS_REVERSE_API_URL"),
            subgraph_url: endpoint_var("ENS_SUBGRAPH_URL"),
            subgraph_api_key,
            lookup_timeout,
            fallback_table: env::var("FALLBACK_TABLE").ok().filter(|s| !s.is_empty()),
            fallback_table_path: env::var("FALLBACK_TABLE_PATH")
                .ok()
                .filter(|s| !s.is_empty()),
            enable_demo_fallback: env_flag("ENABLE_DEMO_FALLBACK", false),
            require_signature: env_flag("REQUIRE_SIGNATURE", false),
            challenge_ttl_secs,
            enable_rate_limiting: env_flag("ENABLE_RATE_LIMITING", false),
            rate_limit_config: RateLimitConfig::from_env(),
            cors_allowed_origins,
            json_logs: env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }

    /// Assemble the fallback table from the demo seed, the JSON file and the
    /// inline list, later sources overriding earlier ones
    fn load_fallback(&self) -> Result<Option<StaticFallbackDirectory>> {
        if !self.enable_demo_fallback
            && self.fallback_table.is_none()
            && self.fallback_table_path.is_none()
        {
            return Ok(None);
        }

        let directory = if self.enable_demo_fallback {
            StaticFallbackDirectory::demo()
        } else {
            StaticFallbackDirectory::new()
        };

        if let Some(path) = &self.fallback_table_path {
            let from_file = StaticFallbackDirectory::from_json_file(path)
                .with_context(|| format!("Failed to load FALLBACK_TABLE_PATH {}", path))?;
            directory.extend(from_file);
        }

        if let Some(pairs) = &self.fallback_table {
            let inline = StaticFallbackDirectory::from_pairs(pairs)
                .context("Failed to parse FALLBACK_TABLE")?;
            directory.extend(inline);
        }

        Ok(Some(directory))
    }
}

fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,reqwest=warn"));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(config.json_logs);

    info!("ENS Access Gate v{}", env!("CARGO_PKG_VERSION"));
    info!("Initializing lookup sources...");

    let http_config = HttpLookupConfig::default().with_timeout(config.lookup_timeout);
    let mut verifier = AccessVerifier::new(&config.required_suffix);

    match &config.reverse_api_url {
        Some(url) => {
            let resolver = EnsReverseResolver::new(url.clone(), &http_config)
                .context("Failed to create reverse resolver")?;
            info!("   ✓ Reverse resolution via {}", resolver.base_url());
            verifier = verifier.with_resolver(Arc::new(resolver));
        }
        None => info!("   ○ Reverse resolution disabled"),
    }

    match &config.subgraph_url {
        Some(url) => {
            let registry =
                EnsSubgraphClient::new(url.clone(), config.subgraph_api_key.clone(), &http_config)
                    .context("Failed to create subgraph client")?
                    .with_name_suffix(verifier.required_suffix());
            info!("   ✓ Owned-names scan via {}", registry.url());
            verifier = verifier.with_registry(Arc::new(registry));
        }
        None => info!("   ○ Owned-names scan disabled"),
    }

    match config.load_fallback()? {
        Some(directory) => {
            info!("   ✓ Fallback table loaded ({} entries)", directory.len());
            if config.enable_demo_fallback {
                warn!("   ⚠ Demo fallback accounts are enabled");
            }
            verifier = verifier.with_fallback(Arc::new(directory));
        }
        None => info!("   ○ Fallback table disabled"),
    }

    info!("   ✓ Required suffix: {}", verifier.required_suffix());

    let challenge_ttl = chrono::TimeDelta::try_seconds(config.challenge_ttl_secs)
        .context("Challenge TTL out of range")?;
    let challenges = ChallengeService::new(challenge_ttl);
    let app_state = AppState::with_challenges(
        Arc::new(verifier),
        Arc::new(challenges),
        config.require_signature,
    );
    if config.require_signature {
        info!(
            "   ✓ Signed challenges required (ttl: {}s)",
            config.challenge_ttl_secs
        );
    } else {
        info!("   ○ Signed challenges optional");
    }

    let rate_limit = if config.enable_rate_limiting {
        info!(
            "   ✓ Rate limiting enabled ({} rps, burst {})",
            config.rate_limit_config.requests_per_second, config.rate_limit_config.burst_size
        );
        Some(config.rate_limit_config)
    } else {
        info!("   ○ Rate limiting disabled");
        None
    };

    let router = create_router_with_config(
        Arc::new(app_state),
        RouterConfig {
            cors_allowed_origins: config.cors_allowed_origins.clone(),
            rate_limit,
        },
    );

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("🚀 Server starting on http://{}", addr);
    info!("📖 Swagger UI available at http://{}/swagger-ui", addr);
    info!("📄 OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
