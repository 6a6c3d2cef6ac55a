//! Alpaca broker adapter implementing `BrokerPort`.

use async_trait::async_trait;

use crate::application::ports::{
    BrokerError, BrokerPort, CancelOrderRequest, ListOrdersRequest, OrderStatusReport,
    SubmitOrderRequest,
};
use crate::domain::account::{Account, Asset, Position};
use crate::domain::market_data::{Bar, BarsQuery};
use crate::domain::order_lifecycle::{OrderSide, OrderType, TimeInForce};
use crate::domain::shared::OrderId;

use super::api_types::{
    AlpacaAccountResponse, AlpacaAssetResponse, AlpacaBarsResponse, AlpacaOrderRequest,
    AlpacaOrderResponse, AlpacaPositionResponse,
};
use super::config::{AlpacaConfig, AlpacaEnvironment};
use super::error::AlpacaError;
use super::http_client::AlpacaHttpClient;

/// Default page size for bar requests (the API maximum).
const BARS_PAGE_LIMIT: u32 = 10_000;

/// Alpaca Markets broker adapter.
#[derive(Debug, Clone)]
pub struct AlpacaBrokerAdapter {
    client: AlpacaHttpClient,
    environment: AlpacaEnvironment,
}

impl AlpacaBrokerAdapter {
    /// Create a new Alpaca broker adapter.
    ///
    /// # Errors
    ///
    /// Returns error when credentials are missing.
    pub fn new(config: &AlpacaConfig) -> Result<Self, AlpacaError> {
        let client = AlpacaHttpClient::new(config)?;
        Ok(Self {
            client,
            environment: config.environment,
        })
    }

    /// Check if this adapter submits real-money orders.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.environment.is_live()
    }

    /// Convert a `SubmitOrderRequest` to the Alpaca wire format.
    fn to_alpaca_order_request(request: &SubmitOrderRequest) -> AlpacaOrderRequest {
        let side = match request.side {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        };

        let order_type = match request.order_type {
            OrderType::Market => "market",
            OrderType::Limit => "limit",
            OrderType::Stop => "stop",
            OrderType::StopLimit => "stop_limit",
        };

        let time_in_force = match request.time_in_force {
            TimeInForce::Day => "day",
            TimeInForce::Gtc => "gtc",
            TimeInForce::Ioc => "ioc",
            TimeInForce::Fok => "fok",
        };

        AlpacaOrderRequest {
            symbol: request.symbol.as_str().to_string(),
            qty: request.quantity.amount().to_string(),
            side: side.to_string(),
            order_type: order_type.to_string(),
            time_in_force: time_in_force.to_string(),
            limit_price: request.limit_price.map(|p| p.amount().to_string()),
            stop_price: request.stop_price.map(|p| p.amount().to_string()),
            client_order_id: request.client_order_id.as_str().to_string(),
        }
    }
}

#[async_trait]
impl BrokerPort for AlpacaBrokerAdapter {
    async fn get_account(&self) -> Result<Account, BrokerError> {
        let response: AlpacaAccountResponse = self
            .client
            .get("/v2/account")
            .await
            .map_err(BrokerError::from)?;

        Ok(response.to_account(!self.is_live()))
    }

    async fn list_positions(&self) -> Result<Vec<Position>, BrokerError> {
        let responses: Vec<AlpacaPositionResponse> = self
            .client
            .get("/v2/positions")
            .await
            .map_err(BrokerError::from)?;

        Ok(responses
            .iter()
            .map(AlpacaPositionResponse::to_position)
            .collect())
    }

    async fn list_orders(
        &self,
        request: ListOrdersRequest,
    ) -> Result<Vec<OrderStatusReport>, BrokerError> {
        let limit = request.limit.unwrap_or(50).clamp(1, 500);
        let responses: Vec<AlpacaOrderResponse> = self
            .client
            .get(&format!(
                "/v2/orders?status={}&limit={limit}",
                request.scope.as_str()
            ))
            .await
            .map_err(BrokerError::from)?;

        Ok(responses
            .iter()
            .map(AlpacaOrderResponse::to_status_report)
            .collect())
    }

    async fn get_order_by_client_id(
        &self,
        client_order_id: &OrderId,
    ) -> Result<OrderStatusReport, BrokerError> {
        let response: AlpacaOrderResponse = self
            .client
            .get(&format!(
                "/v2/orders:by_client_order_id?client_order_id={}",
                client_order_id.as_str()
            ))
            .await
            .map_err(BrokerError::from)?;

        Ok(response.to_status_report())
    }

    async fn submit_order(
        &self,
        request: SubmitOrderRequest,
    ) -> Result<OrderStatusReport, BrokerError> {
        if self.is_live() {
            tracing::warn!(
                client_order_id = %request.client_order_id,
                symbol = %request.symbol,
                "Submitting LIVE order - this will execute real trades"
            );
        }

        let alpaca_request = Self::to_alpaca_order_request(&request);

        tracing::info!(
            client_order_id = %request.client_order_id,
            symbol = %request.symbol,
            side = %alpaca_request.side,
            order_type = %alpaca_request.order_type,
            qty = %alpaca_request.qty,
            limit_price = ?alpaca_request.limit_price,
            "Submitting order to Alpaca"
        );

        let response: AlpacaOrderResponse = self
            .client
            .post_once("/v2/orders", &alpaca_request)
            .await
            .map_err(BrokerError::from)?;

        tracing::info!(
            client_order_id = %request.client_order_id,
            broker_order_id = %response.id,
            status = %response.status,
            "Order submitted"
        );

        Ok(response.to_status_report())
    }

    async fn cancel_order(&self, request: CancelOrderRequest) -> Result<(), BrokerError> {
        if let Some(broker_id) = &request.broker_order_id {
            tracing::info!(broker_order_id = %broker_id, "Canceling order by broker ID");
            self.client
                .delete(&format!("/v2/orders/{}", broker_id.as_str()))
                .await
                .map_err(BrokerError::from)
        } else if let Some(client_id) = &request.client_order_id {
            tracing::info!(client_order_id = %client_id, "Canceling order by client ID");
            self.client
                .delete(&format!(
                    "/v2/orders:by_client_order_id?client_order_id={}",
                    client_id.as_str()
                ))
                .await
                .map_err(BrokerError::from)
        } else {
            Err(BrokerError::Unknown {
                message: "CancelOrderRequest must have either broker_order_id or client_order_id"
                    .to_string(),
            })
        }
    }

    async fn get_bars(&self, query: &BarsQuery) -> Result<Vec<Bar>, BrokerError> {
        let mut bars = Vec::new();
        let mut page_token: Option<String> = None;

        // The "Z" form keeps the query string free of '+', which would
        // otherwise decode as a space.
        let start = query
            .start
            .as_datetime()
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        let end = query
            .end
            .as_datetime()
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true);

        loop {
            let mut path = format!(
                "/v2/stocks/{}/bars?timeframe={}&start={start}&end={end}&adjustment={}&limit={BARS_PAGE_LIMIT}",
                query.symbol.as_str(),
                query.timeframe.as_str(),
                query.adjustment.as_str(),
            );
            if let Some(token) = &page_token {
                path.push_str(&format!("&page_token={token}"));
            }

            let response: AlpacaBarsResponse = self
                .client
                .data_get(&path)
                .await
                .map_err(BrokerError::from)?;

            for bar in response.bars.unwrap_or_default() {
                match bar.to_bar(&query.symbol, query.timeframe) {
                    Some(bar) => bars.push(bar),
                    None => {
                        tracing::warn!(
                            symbol = %query.symbol,
                            raw_time = %bar.t,
                            "Dropping bar with unparseable timestamp"
                        );
                    }
                }
            }

            match response.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(bars)
    }

    async fn list_assets(&self) -> Result<Vec<Asset>, BrokerError> {
        let responses: Vec<AlpacaAssetResponse> = self
            .client
            .get("/v2/assets?status=active&asset_class=us_equity")
            .await
            .map_err(BrokerError::from)?;

        Ok(responses.iter().map(AlpacaAssetResponse::to_asset).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::domain::market_data::Timeframe;
    use crate::domain::order_lifecycle::OrderStatus;
    use crate::domain::shared::{Money, Quantity, Symbol, Timestamp};

    fn market_request(key: &str) -> SubmitOrderRequest {
        SubmitOrderRequest {
            client_order_id: OrderId::new(key),
            symbol: Symbol::new("AAPL"),
            side: OrderSide::Buy,
            order_type: OrderType::Market,
            quantity: Quantity::from_i64(100),
            limit_price: None,
            stop_price: None,
            time_in_force: TimeInForce::Day,
        }
    }

    async fn adapter(server: &MockServer) -> AlpacaBrokerAdapter {
        let config = AlpacaConfig::new(
            "test-key".to_string(),
            "test-secret".to_string(),
            AlpacaEnvironment::Paper,
        )
        .with_base_url(server.uri());
        AlpacaBrokerAdapter::new(&config).unwrap()
    }

    fn order_body(id: &str, client_id: &str, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "client_order_id": client_id,
            "symbol": "AAPL",
            "status": status,
            "filled_qty": "0",
            "filled_avg_price": null,
            "updated_at": "2026-01-15T10:00:00Z"
        })
    }

    #[test]
    fn to_alpaca_order_request_market_buy() {
        let request = AlpacaBrokerAdapter::to_alpaca_order_request(&market_request("k1"));

        assert_eq!(request.symbol, "AAPL");
        assert_eq!(request.side, "buy");
        assert_eq!(request.order_type, "market");
        assert_eq!(request.time_in_force, "day");
        assert_eq!(request.qty, "100");
        assert_eq!(request.client_order_id, "k1");
        assert!(request.limit_price.is_none());
        assert!(request.stop_price.is_none());
    }

    #[test]
    fn to_alpaca_order_request_stop_limit_sell() {
        let mut request = market_request("k2");
        request.side = OrderSide::Sell;
        request.order_type = OrderType::StopLimit;
        request.limit_price = Some(Money::new(dec!(149.50)));
        request.stop_price = Some(Money::new(dec!(150.00)));
        request.time_in_force = TimeInForce::Gtc;

        let wire = AlpacaBrokerAdapter::to_alpaca_order_request(&request);
        assert_eq!(wire.side, "sell");
        assert_eq!(wire.order_type, "stop_limit");
        assert_eq!(wire.time_in_force, "gtc");
        assert_eq!(wire.limit_price.as_deref(), Some("149.50"));
        assert_eq!(wire.stop_price.as_deref(), Some("150.00"));
    }

    #[tokio::test]
    async fn submit_order_posts_and_maps_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/orders"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(order_body("broker-1", "k1", "accepted")),
            )
            .mount(&server)
            .await;

        let report = adapter(&server).await.submit_order(market_request("k1")).await.unwrap();

        assert_eq!(report.client_order_id.as_str(), "k1");
        assert_eq!(report.report.status, OrderStatus::Accepted);
        assert_eq!(
            report.report.broker_order_id.as_ref().unwrap().as_str(),
            "broker-1"
        );

        // Verify the wire body carried the idempotency key.
        let requests = server.received_requests().await.unwrap();
        let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(sent["client_order_id"], "k1");
        assert_eq!(sent["qty"], "100");
    }

    #[tokio::test]
    async fn get_account_maps_paper_flag() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/account"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "acct-1",
                "cash": "25000.50",
                "buying_power": "100000",
                "portfolio_value": "31000.25"
            })))
            .mount(&server)
            .await;

        let account = adapter(&server).await.get_account().await.unwrap();
        assert!(account.paper_trading);
        assert_eq!(account.cash, dec!(25000.50));
    }

    #[tokio::test]
    async fn list_positions_maps_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/positions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "symbol": "AAPL",
                "qty": "-5",
                "avg_entry_price": "150.00",
                "market_value": "-760.00",
                "unrealized_pl": "-10.00"
            }])))
            .mount(&server)
            .await;

        let positions = adapter(&server).await.list_positions().await.unwrap();
        assert_eq!(positions.len(), 1);
        assert!(positions[0].is_short());
    }

    #[tokio::test]
    async fn list_orders_clamps_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/orders"))
            .and(query_param("status", "all"))
            .and(query_param("limit", "500"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let orders = adapter(&server)
            .await
            .list_orders(ListOrdersRequest {
                scope: crate::application::ports::OrderScope::All,
                limit: Some(9999),
            })
            .await
            .unwrap();
        assert!(orders.is_empty());
    }

    #[tokio::test]
    async fn get_order_by_client_id_hits_lookup_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/orders:by_client_order_id"))
            .and(query_param("client_order_id", "k1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(order_body("broker-1", "k1", "filled")),
            )
            .mount(&server)
            .await;

        let report = adapter(&server)
            .await
            .get_order_by_client_id(&OrderId::new("k1"))
            .await
            .unwrap();
        assert_eq!(report.report.status, OrderStatus::Filled);
    }

    #[tokio::test]
    async fn cancel_by_broker_id_deletes() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v2/orders/broker-1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        adapter(&server)
            .await
            .cancel_order(CancelOrderRequest::by_broker_id(
                crate::domain::shared::BrokerId::new("broker-1"),
            ))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn cancel_without_any_id_is_an_error() {
        let server = MockServer::start().await;
        let result = adapter(&server)
            .await
            .cancel_order(CancelOrderRequest {
                broker_order_id: None,
                client_order_id: None,
            })
            .await;
        assert!(matches!(result, Err(BrokerError::Unknown { .. })));
    }

    #[tokio::test]
    async fn get_bars_pages_through_results() {
        let server = MockServer::start().await;

        let page_one = json!({
            "bars": [
                {"t": "2026-01-05T05:00:00Z", "o": 150.0, "h": 151.0, "l": 149.0, "c": 150.5, "v": 1000},
                {"t": "2026-01-06T05:00:00Z", "o": 150.5, "h": 152.0, "l": 150.0, "c": 151.5, "v": 1100}
            ],
            "next_page_token": "page-2"
        });
        let page_two = json!({
            "bars": [
                {"t": "2026-01-07T05:00:00Z", "o": 151.5, "h": 153.0, "l": 151.0, "c": 152.0, "v": 900}
            ],
            "next_page_token": null
        });

        Mock::given(method("GET"))
            .and(path("/v2/stocks/AAPL/bars"))
            .and(query_param("page_token", "page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_two))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/stocks/AAPL/bars"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_one))
            .mount(&server)
            .await;

        let query = BarsQuery::new(
            Symbol::new("AAPL"),
            Timeframe::OneDay,
            Timestamp::parse("2026-01-01T00:00:00Z").unwrap(),
            Timestamp::parse("2026-01-31T00:00:00Z").unwrap(),
        )
        .unwrap();

        let bars = adapter(&server).await.get_bars(&query).await.unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[2].volume, 900);
    }

    #[tokio::test]
    async fn get_bars_empty_range() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/stocks/AAPL/bars"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "bars": null,
                "next_page_token": null
            })))
            .mount(&server)
            .await;

        let query = BarsQuery::new(
            Symbol::new("AAPL"),
            Timeframe::OneDay,
            Timestamp::parse("2026-01-01T00:00:00Z").unwrap(),
            Timestamp::parse("2026-01-02T00:00:00Z").unwrap(),
        )
        .unwrap();

        let bars = adapter(&server).await.get_bars(&query).await.unwrap();
        assert!(bars.is_empty());
    }

    #[tokio::test]
    async fn list_assets_maps_tradable_flag() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/assets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"symbol": "AAPL", "tradable": true, "fractionable": true},
                {"symbol": "DELISTED", "tradable": false, "fractionable": false}
            ])))
            .mount(&server)
            .await;

        let assets = adapter(&server).await.list_assets().await.unwrap();
        assert_eq!(assets.len(), 2);
        assert!(assets[0].tradeable);
        assert!(!assets[1].tradeable);
    }

    #[tokio::test]
    async fn submit_order_rejection_preserves_broker_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/orders"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "code": 40310000,
                "message": "insufficient buying power"
            })))
            .mount(&server)
            .await;

        let result = adapter(&server).await.submit_order(market_request("k1")).await;
        match result {
            Err(BrokerError::Validation { code, message }) => {
                assert_eq!(code, "40310000");
                assert!(message.contains("buying power"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
