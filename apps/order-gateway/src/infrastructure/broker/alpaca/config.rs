//! Alpaca adapter configuration.

use std::time::Duration;

/// Environment for the Alpaca API.
///
/// There is deliberately no `Default`: the caller must state paper or
/// live explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlpacaEnvironment {
    /// Paper trading (simulated).
    Paper,
    /// Live trading (real money).
    Live,
}

impl AlpacaEnvironment {
    /// Parse from a configuration string ("PAPER" / "LIVE").
    ///
    /// Anything else is `None`; the binary refuses to start rather than
    /// guess, since accidental live submission is unacceptable.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "PAPER" => Some(Self::Paper),
            "LIVE" => Some(Self::Live),
            _ => None,
        }
    }

    /// Get the base URL for the trading API.
    #[must_use]
    pub const fn trading_base_url(&self) -> &'static str {
        match self {
            Self::Paper => "https://paper-api.alpaca.markets",
            Self::Live => "https://api.alpaca.markets",
        }
    }

    /// Get the base URL for the market data API.
    #[must_use]
    pub const fn data_base_url(&self) -> &'static str {
        "https://data.alpaca.markets"
    }

    /// Check if this is live trading.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }
}

impl std::fmt::Display for AlpacaEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Paper => write!(f, "PAPER"),
            Self::Live => write!(f, "LIVE"),
        }
    }
}

/// Configuration for the Alpaca broker adapter.
#[derive(Debug, Clone)]
pub struct AlpacaConfig {
    /// API key.
    pub api_key: String,
    /// API secret.
    pub api_secret: String,
    /// Trading environment.
    pub environment: AlpacaEnvironment,
    /// HTTP request timeout.
    pub timeout: Duration,
    /// Retry policy for idempotent calls.
    pub retry: RetryConfig,
    /// Override for the trading base URL (tests).
    pub trading_base_url: Option<String>,
    /// Override for the data base URL (tests).
    pub data_base_url: Option<String>,
}

impl AlpacaConfig {
    /// Create a new configuration.
    #[must_use]
    pub fn new(api_key: String, api_secret: String, environment: AlpacaEnvironment) -> Self {
        Self {
            api_key,
            api_secret,
            environment,
            timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
            trading_base_url: None,
            data_base_url: None,
        }
    }

    /// Set the HTTP timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry configuration.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Override both base URLs (for tests against a local server).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.trading_base_url = Some(base_url.clone());
        self.data_base_url = Some(base_url);
        self
    }

    /// Get the trading API base URL.
    #[must_use]
    pub fn trading_base_url(&self) -> &str {
        self.trading_base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.trading_base_url())
    }

    /// Get the data API base URL.
    #[must_use]
    pub fn data_base_url(&self) -> &str {
        self.data_base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.data_base_url())
    }
}

/// Retry configuration for idempotent calls.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Initial backoff duration.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}
