//! Market data service.
//!
//! Fetches and normalizes OHLCV bar series, independent of order flow.
//! A short-TTL cache serves repeat queries when a prior fetch fully
//! covers the requested range; expired entries are never served.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::application::GatewayError;
use crate::application::ports::BrokerPort;
use crate::application::services::RateLimiter;
use crate::domain::market_data::{Adjustment, Bar, BarsQuery, Timeframe, normalize_bars};
use crate::domain::shared::Symbol;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    symbol: Symbol,
    timeframe: Timeframe,
    adjustment: Adjustment,
}

impl CacheKey {
    fn for_query(query: &BarsQuery) -> Self {
        Self {
            symbol: query.symbol.clone(),
            timeframe: query.timeframe,
            adjustment: query.adjustment,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    query: BarsQuery,
    bars: Vec<Bar>,
    fetched_at: Instant,
}

/// Bar-fetching service with a range-covering TTL cache.
pub struct MarketDataService<B> {
    broker: Arc<B>,
    limiter: Arc<RateLimiter>,
    ttl: Duration,
    cache: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl<B: BrokerPort> MarketDataService<B> {
    /// Create a new service with the given cache TTL.
    pub fn new(broker: Arc<B>, limiter: Arc<RateLimiter>, ttl: Duration) -> Self {
        Self {
            broker,
            limiter,
            ttl,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch bars for a validated query.
    ///
    /// Output is strictly ascending by open time with no duplicate
    /// timestamps. Served from cache, with zero broker calls, when a
    /// prior fetch within the TTL fully covers the requested range.
    ///
    /// # Errors
    ///
    /// Returns error on rate-limit timeout or broker failure.
    pub async fn get_bars(&self, query: &BarsQuery) -> Result<Vec<Bar>, GatewayError> {
        if let Some(bars) = self.serve_from_cache(query).await {
            tracing::debug!(
                symbol = %query.symbol,
                timeframe = %query.timeframe,
                "Serving bars from cache"
            );
            return Ok(bars);
        }

        self.limiter
            .acquire()
            .await
            .map_err(|_| GatewayError::RateLimitTimeout)?;

        let bars = normalize_bars(self.broker.get_bars(query).await?);

        tracing::debug!(
            symbol = %query.symbol,
            timeframe = %query.timeframe,
            count = bars.len(),
            "Fetched bars from broker"
        );

        let mut cache = self.cache.write().await;
        cache.insert(
            CacheKey::for_query(query),
            CacheEntry {
                query: query.clone(),
                bars: bars.clone(),
                fetched_at: Instant::now(),
            },
        );
        drop(cache);

        Ok(slice_to_range(&bars, query))
    }

    /// Drop every cached entry for a symbol.
    pub async fn invalidate(&self, symbol: &Symbol) {
        let mut cache = self.cache.write().await;
        cache.retain(|key, _| &key.symbol != symbol);
    }

    async fn serve_from_cache(&self, query: &BarsQuery) -> Option<Vec<Bar>> {
        let cache = self.cache.read().await;
        let entry = cache.get(&CacheKey::for_query(query))?;
        if entry.fetched_at.elapsed() > self.ttl {
            return None;
        }
        if !entry.query.covers(query) {
            return None;
        }
        Some(slice_to_range(&entry.bars, query))
    }
}

/// Restrict a normalized series to the query's [start, end] window.
fn slice_to_range(bars: &[Bar], query: &BarsQuery) -> Vec<Bar> {
    bars.iter()
        .filter(|bar| bar.open_time >= query.start && bar.open_time <= query.end)
        .cloned()
        .collect()
}
