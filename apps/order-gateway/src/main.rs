//! Order Gateway Binary
//!
//! Wires the gateway components from environment configuration and runs
//! the reconciliation sweep until shutdown.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin order-gateway
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `APCA_API_KEY_ID`: Broker API key
//! - `APCA_API_SECRET_KEY`: Broker API secret
//! - `TRADING_ENV`: PAPER | LIVE (no default; the gateway refuses to
//!   start when the paper/live flag cannot be determined)
//!
//! ## Optional
//! - `RATE_LIMIT_CAPACITY`: Token bucket capacity (default: 200)
//! - `RATE_LIMIT_REFILL_PER_SEC`: Token refill rate (default: 3.33)
//! - `RECONCILE_INTERVAL_SECS`: Sweep period (default: 30)
//! - `RECONCILE_STALENESS_SECS`: Order age before re-check (default: 60)
//! - `BARS_CACHE_TTL_SECS`: Bar cache TTL (default: 60)
//! - `ASSET_CACHE_TTL_SECS`: Asset catalog TTL (default: 3600)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use tokio_util::sync::CancellationToken;

use order_gateway::application::services::{
    AssetCatalog, OrderService, OrderServiceConfig, RateLimiter, RateLimiterConfig,
    ReconciliationSweep, SweepConfig,
};
use order_gateway::infrastructure::broker::alpaca::{
    AlpacaBrokerAdapter, AlpacaConfig, AlpacaEnvironment,
};
use order_gateway::infrastructure::tracking::InMemoryOrderTracker;

/// Parsed configuration from environment variables.
struct GatewayConfig {
    environment: AlpacaEnvironment,
    api_key: String,
    api_secret: String,
    rate_limiter: RateLimiterConfig,
    sweep: SweepConfig,
    bars_cache_ttl: Duration,
    asset_cache_ttl: Duration,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    init_tracing();

    tracing::info!("Starting order gateway");

    let config = parse_config()?;
    log_config(&config);

    let broker = Arc::new(
        AlpacaBrokerAdapter::new(&AlpacaConfig::new(
            config.api_key.clone(),
            config.api_secret.clone(),
            config.environment,
        ))
        .context("failed to initialize broker adapter")?,
    );
    let limiter = Arc::new(RateLimiter::new(config.rate_limiter.clone()));
    let tracker = Arc::new(InMemoryOrderTracker::new());
    let assets = Arc::new(AssetCatalog::new(
        Arc::clone(&broker),
        Arc::clone(&limiter),
        config.asset_cache_ttl,
    ));
    let orders = Arc::new(OrderService::new(
        Arc::clone(&broker),
        Arc::clone(&tracker),
        Arc::clone(&limiter),
        Arc::clone(&assets),
        OrderServiceConfig::default(),
    ));
    // The request/response boundary (GatewayAPI) lives outside this
    // binary; it consumes `orders` and a `MarketDataService` built over
    // the same broker and limiter. Here we only keep the tracked orders
    // reconciled.
    let shutdown = CancellationToken::new();
    let sweep =
        ReconciliationSweep::new(Arc::clone(&orders), Arc::clone(&tracker), config.sweep.clone());
    let sweep_handle = sweep.spawn(shutdown.clone());

    tracing::info!("Order gateway ready");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("Shutdown signal received");

    shutdown.cancel();
    sweep_handle.await.context("sweep task panicked")?;

    tracing::info!("Order gateway stopped");
    Ok(())
}

/// Load a .env file when present.
fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

/// Initialize the tracing subscriber with environment filter.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("order_gateway=info")),
        )
        .init();
}

/// Parse configuration from environment variables.
fn parse_config() -> anyhow::Result<GatewayConfig> {
    // Accidental live submission is an unacceptable failure mode, so the
    // paper/live selector has no default and no fallback.
    let Ok(env) = std::env::var("TRADING_ENV") else {
        bail!("TRADING_ENV is required (PAPER or LIVE); refusing to guess");
    };
    let Some(environment) = AlpacaEnvironment::parse(&env) else {
        bail!("TRADING_ENV must be PAPER or LIVE, got '{env}'");
    };

    let api_key = std::env::var("APCA_API_KEY_ID").unwrap_or_default();
    let api_secret = std::env::var("APCA_API_SECRET_KEY").unwrap_or_default();
    if api_key.is_empty() || api_secret.is_empty() {
        bail!("APCA_API_KEY_ID and APCA_API_SECRET_KEY environment variables are required");
    }

    let rate_limiter = RateLimiterConfig {
        capacity: env_parse("RATE_LIMIT_CAPACITY", 200),
        refill_per_sec: env_parse("RATE_LIMIT_REFILL_PER_SEC", 200.0 / 60.0),
        acquire_timeout: Duration::from_secs(10),
    };

    let sweep = SweepConfig {
        interval: Duration::from_secs(env_parse("RECONCILE_INTERVAL_SECS", 30)),
        staleness: Duration::from_secs(env_parse("RECONCILE_STALENESS_SECS", 60)),
    };

    Ok(GatewayConfig {
        environment,
        api_key,
        api_secret,
        rate_limiter,
        sweep,
        bars_cache_ttl: Duration::from_secs(env_parse("BARS_CACHE_TTL_SECS", 60)),
        asset_cache_ttl: Duration::from_secs(env_parse("ASSET_CACHE_TTL_SECS", 3600)),
    })
}

/// Parse an environment variable, falling back to a default.
fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

/// Log the parsed configuration.
fn log_config(config: &GatewayConfig) {
    tracing::info!(
        environment = %config.environment,
        rate_limit_capacity = config.rate_limiter.capacity,
        rate_limit_refill_per_sec = config.rate_limiter.refill_per_sec,
        reconcile_interval_secs = config.sweep.interval.as_secs(),
        reconcile_staleness_secs = config.sweep.staleness.as_secs(),
        bars_cache_ttl_secs = config.bars_cache_ttl.as_secs(),
        asset_cache_ttl_secs = config.asset_cache_ttl.as_secs(),
        "Configuration loaded"
    );
}
