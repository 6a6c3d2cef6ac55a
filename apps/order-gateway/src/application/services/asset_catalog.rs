//! Cached asset reference data.
//!
//! The asset catalog is static broker reference data (what is tradeable,
//! what supports fractional quantities). It changes rarely, so one
//! rate-limited fetch is shared across callers and cached with a bounded
//! TTL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::application::GatewayError;
use crate::application::ports::BrokerPort;
use crate::application::services::RateLimiter;
use crate::domain::account::Asset;
use crate::domain::shared::Symbol;

/// Result of checking a symbol against the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolCheck {
    /// The symbol exists and accepts orders.
    Tradeable,
    /// The symbol exists but the broker will not accept orders for it.
    Untradeable,
    /// The symbol is absent from a fresh catalog.
    NotFound,
    /// The catalog could not be consulted; no judgment.
    Unknown,
}

#[derive(Debug)]
struct Snapshot {
    by_symbol: HashMap<Symbol, Asset>,
    fetched_at: Instant,
}

/// TTL-cached view of the broker's asset catalog.
pub struct AssetCatalog<B> {
    broker: Arc<B>,
    limiter: Arc<RateLimiter>,
    ttl: Duration,
    cache: RwLock<Option<Snapshot>>,
}

impl<B: BrokerPort> AssetCatalog<B> {
    /// Create a new catalog with the given cache TTL.
    pub fn new(broker: Arc<B>, limiter: Arc<RateLimiter>, ttl: Duration) -> Self {
        Self {
            broker,
            limiter,
            ttl,
            cache: RwLock::new(None),
        }
    }

    /// List all active assets, from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns error when the cache is cold or expired and the broker
    /// fetch fails.
    pub async fn assets(&self) -> Result<Vec<Asset>, GatewayError> {
        if let Some(assets) = self.read_fresh(|s| s.by_symbol.values().cloned().collect()).await {
            return Ok(assets);
        }
        self.refresh().await?;
        self.read_fresh(|s| s.by_symbol.values().cloned().collect())
            .await
            .ok_or_else(|| GatewayError::InvariantViolation {
                message: "asset cache empty immediately after refresh".to_string(),
            })
    }

    /// Check whether a symbol is known and tradeable.
    ///
    /// Never fails: when the catalog cannot be fetched and nothing fresh
    /// is cached, the answer is `Unknown` and callers decide whether to
    /// proceed.
    pub async fn check(&self, symbol: &Symbol) -> SymbolCheck {
        if let Some(check) = self.read_fresh(|s| lookup(s, symbol)).await {
            return check;
        }
        if let Err(error) = self.refresh().await {
            tracing::warn!(%symbol, %error, "Asset catalog unavailable, skipping symbol check");
            return SymbolCheck::Unknown;
        }
        self.read_fresh(|s| lookup(s, symbol))
            .await
            .unwrap_or(SymbolCheck::Unknown)
    }

    /// Drop the cached snapshot.
    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }

    async fn read_fresh<R>(&self, f: impl FnOnce(&Snapshot) -> R) -> Option<R> {
        let cache = self.cache.read().await;
        match cache.as_ref() {
            Some(snapshot) if snapshot.fetched_at.elapsed() <= self.ttl => Some(f(snapshot)),
            _ => None,
        }
    }

    async fn refresh(&self) -> Result<(), GatewayError> {
        self.limiter
            .acquire()
            .await
            .map_err(|_| GatewayError::RateLimitTimeout)?;

        let assets = self.broker.list_assets().await?;
        let by_symbol = assets
            .into_iter()
            .map(|asset| (asset.symbol.clone(), asset))
            .collect::<HashMap<_, _>>();

        tracing::debug!(count = by_symbol.len(), "Asset catalog refreshed");

        *self.cache.write().await = Some(Snapshot {
            by_symbol,
            fetched_at: Instant::now(),
        });
        Ok(())
    }
}

fn lookup(snapshot: &Snapshot, symbol: &Symbol) -> SymbolCheck {
    match snapshot.by_symbol.get(symbol) {
        Some(asset) if asset.tradeable => SymbolCheck::Tradeable,
        Some(_) => SymbolCheck::Untradeable,
        None => SymbolCheck::NotFound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::application::ports::{
        BrokerError, CancelOrderRequest, ListOrdersRequest, OrderStatusReport,
        SubmitOrderRequest,
    };
    use crate::application::services::RateLimiterConfig;
    use crate::domain::account::{Account, Position};
    use crate::domain::market_data::{Bar, BarsQuery};
    use crate::domain::shared::OrderId;

    struct MockBroker {
        assets: Option<Vec<Asset>>,
        list_calls: AtomicUsize,
    }

    impl MockBroker {
        fn with_assets(assets: Vec<Asset>) -> Self {
            Self {
                assets: Some(assets),
                list_calls: AtomicUsize::new(0),
            }
        }

        fn unavailable() -> Self {
            Self {
                assets: None,
                list_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl BrokerPort for MockBroker {
        async fn get_account(&self) -> Result<Account, BrokerError> {
            unimplemented!("not used in catalog tests")
        }

        async fn list_positions(&self) -> Result<Vec<Position>, BrokerError> {
            unimplemented!("not used in catalog tests")
        }

        async fn list_orders(
            &self,
            _request: ListOrdersRequest,
        ) -> Result<Vec<OrderStatusReport>, BrokerError> {
            unimplemented!("not used in catalog tests")
        }

        async fn get_order_by_client_id(
            &self,
            _client_order_id: &OrderId,
        ) -> Result<OrderStatusReport, BrokerError> {
            unimplemented!("not used in catalog tests")
        }

        async fn submit_order(
            &self,
            _request: SubmitOrderRequest,
        ) -> Result<OrderStatusReport, BrokerError> {
            unimplemented!("not used in catalog tests")
        }

        async fn cancel_order(&self, _request: CancelOrderRequest) -> Result<(), BrokerError> {
            unimplemented!("not used in catalog tests")
        }

        async fn get_bars(&self, _query: &BarsQuery) -> Result<Vec<Bar>, BrokerError> {
            unimplemented!("not used in catalog tests")
        }

        async fn list_assets(&self) -> Result<Vec<Asset>, BrokerError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.assets.clone().ok_or(BrokerError::Unavailable {
                message: "connection refused".to_string(),
            })
        }
    }

    fn asset(symbol: &str, tradeable: bool) -> Asset {
        Asset {
            symbol: Symbol::new(symbol),
            tradeable,
            fractionable: true,
        }
    }

    fn catalog(broker: MockBroker, ttl: Duration) -> AssetCatalog<MockBroker> {
        AssetCatalog::new(
            Arc::new(broker),
            Arc::new(RateLimiter::new(RateLimiterConfig::default())),
            ttl,
        )
    }

    #[tokio::test]
    async fn check_tradeable_symbol() {
        let catalog = catalog(
            MockBroker::with_assets(vec![asset("AAPL", true)]),
            Duration::from_secs(60),
        );

        assert_eq!(catalog.check(&Symbol::new("AAPL")).await, SymbolCheck::Tradeable);
    }

    #[tokio::test]
    async fn check_untradeable_symbol() {
        let catalog = catalog(
            MockBroker::with_assets(vec![asset("DELISTED", false)]),
            Duration::from_secs(60),
        );

        assert_eq!(
            catalog.check(&Symbol::new("DELISTED")).await,
            SymbolCheck::Untradeable
        );
    }

    #[tokio::test]
    async fn check_unknown_symbol_in_fresh_catalog() {
        let catalog = catalog(
            MockBroker::with_assets(vec![asset("AAPL", true)]),
            Duration::from_secs(60),
        );

        assert_eq!(
            catalog.check(&Symbol::new("NOSUCH")).await,
            SymbolCheck::NotFound
        );
    }

    #[tokio::test]
    async fn check_unavailable_catalog_is_unknown() {
        let catalog = catalog(MockBroker::unavailable(), Duration::from_secs(60));

        assert_eq!(
            catalog.check(&Symbol::new("AAPL")).await,
            SymbolCheck::Unknown
        );
    }

    #[tokio::test]
    async fn second_check_within_ttl_hits_cache() {
        let catalog = catalog(
            MockBroker::with_assets(vec![asset("AAPL", true)]),
            Duration::from_secs(60),
        );

        catalog.check(&Symbol::new("AAPL")).await;
        catalog.check(&Symbol::new("AAPL")).await;

        assert_eq!(catalog.broker.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_cache_refetches() {
        let catalog = catalog(
            MockBroker::with_assets(vec![asset("AAPL", true)]),
            Duration::from_millis(10),
        );

        catalog.check(&Symbol::new("AAPL")).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        catalog.check(&Symbol::new("AAPL")).await;

        assert_eq!(catalog.broker.list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_drops_cache() {
        let catalog = catalog(
            MockBroker::with_assets(vec![asset("AAPL", true)]),
            Duration::from_secs(60),
        );

        catalog.check(&Symbol::new("AAPL")).await;
        catalog.invalidate().await;
        catalog.check(&Symbol::new("AAPL")).await;

        assert_eq!(catalog.broker.list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn assets_returns_catalog() {
        let catalog = catalog(
            MockBroker::with_assets(vec![asset("AAPL", true), asset("MSFT", true)]),
            Duration::from_secs(60),
        );

        let assets = catalog.assets().await.unwrap();
        assert_eq!(assets.len(), 2);
    }

    #[tokio::test]
    async fn assets_surfaces_fetch_error() {
        let catalog = catalog(MockBroker::unavailable(), Duration::from_secs(60));
        assert!(catalog.assets().await.is_err());
    }
}
