//! Alpaca API request and response types.
//!
//! These map directly to Alpaca's REST wire format and are converted to
//! the fixed internal schema at this boundary; nothing downstream
//! depends on the broker's shapes. Monetary fields on trading endpoints
//! arrive as JSON strings; bar fields arrive as numbers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::ports::OrderStatusReport;
use crate::domain::account::{Account, Asset, Position};
use crate::domain::market_data::{Bar, Timeframe};
use crate::domain::order_lifecycle::{OrderStatus, StatusReport};
use crate::domain::shared::{BrokerId, Money, OrderId, Quantity, Symbol, Timestamp};

// ============================================================================
// Order Types
// ============================================================================

/// Order request for the Alpaca API.
#[derive(Debug, Clone, Serialize)]
pub struct AlpacaOrderRequest {
    /// Stock symbol.
    pub symbol: String,
    /// Quantity (shares), serialized as a string.
    pub qty: String,
    /// Order side.
    pub side: String,
    /// Order type.
    #[serde(rename = "type")]
    pub order_type: String,
    /// Time in force.
    pub time_in_force: String,
    /// Limit price (for limit orders).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<String>,
    /// Stop price (for stop orders).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<String>,
    /// Client order ID (the gateway's idempotency key).
    pub client_order_id: String,
}

/// Order response from the Alpaca API.
#[derive(Debug, Clone, Deserialize)]
pub struct AlpacaOrderResponse {
    /// Broker order ID.
    pub id: String,
    /// Client order ID.
    pub client_order_id: String,
    /// Symbol.
    pub symbol: String,
    /// Order status.
    pub status: String,
    /// Filled quantity (as string).
    #[serde(default)]
    pub filled_qty: Option<String>,
    /// Average fill price (as string).
    #[serde(default)]
    pub filled_avg_price: Option<String>,
    /// Last update timestamp.
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl AlpacaOrderResponse {
    /// Convert to the internal status report schema.
    #[must_use]
    pub fn to_status_report(&self) -> OrderStatusReport {
        let filled_quantity = self
            .filled_qty
            .as_deref()
            .and_then(|q| q.parse::<Decimal>().ok())
            .map_or(Quantity::ZERO, Quantity::new);

        let average_fill_price = self
            .filled_avg_price
            .as_deref()
            .and_then(|p| p.parse::<Decimal>().ok())
            .map(Money::new);

        let at = self
            .updated_at
            .as_deref()
            .and_then(|ts| Timestamp::parse(ts).ok())
            .unwrap_or_else(Timestamp::now);

        OrderStatusReport {
            client_order_id: OrderId::new(&self.client_order_id),
            report: StatusReport {
                status: parse_order_status(&self.status),
                broker_order_id: Some(BrokerId::new(&self.id)),
                filled_quantity,
                average_fill_price,
                at,
            },
        }
    }
}

/// Parse an Alpaca order status string to the internal `OrderStatus`.
///
/// Alpaca has more states than the gateway tracks; everything that means
/// "working at the broker" collapses to `Accepted`, and anything
/// unrecognized stays `PendingNew` so the sweep keeps watching it.
pub fn parse_order_status(status: &str) -> OrderStatus {
    match status.to_lowercase().as_str() {
        "new" | "accepted" | "accepted_for_bidding" | "replaced" | "pending_replace" => {
            OrderStatus::Accepted
        }
        "pending_new" => OrderStatus::PendingNew,
        "partially_filled" => OrderStatus::PartiallyFilled,
        "filled" => OrderStatus::Filled,
        "canceled" | "pending_cancel" => OrderStatus::Canceled,
        "rejected" | "stopped" => OrderStatus::Rejected,
        "expired" | "done_for_day" => OrderStatus::Expired,
        _ => OrderStatus::PendingNew,
    }
}

// ============================================================================
// Account / Position / Asset Types
// ============================================================================

/// Account response from the Alpaca API.
#[derive(Debug, Clone, Deserialize)]
pub struct AlpacaAccountResponse {
    /// Account ID.
    pub id: String,
    /// Cash balance.
    pub cash: String,
    /// Buying power.
    pub buying_power: String,
    /// Total portfolio value.
    pub portfolio_value: String,
}

impl AlpacaAccountResponse {
    /// Convert to the internal account snapshot.
    #[must_use]
    pub fn to_account(&self, paper_trading: bool) -> Account {
        Account {
            id: self.id.clone(),
            cash: parse_decimal(&self.cash),
            buying_power: parse_decimal(&self.buying_power),
            portfolio_value: parse_decimal(&self.portfolio_value),
            paper_trading,
        }
    }
}

/// Position response from the Alpaca API.
#[derive(Debug, Clone, Deserialize)]
pub struct AlpacaPositionResponse {
    /// Symbol.
    pub symbol: String,
    /// Signed quantity.
    pub qty: String,
    /// Average entry price.
    pub avg_entry_price: String,
    /// Market value.
    pub market_value: String,
    /// Unrealized P&L.
    pub unrealized_pl: String,
}

impl AlpacaPositionResponse {
    /// Convert to the internal position snapshot.
    #[must_use]
    pub fn to_position(&self) -> Position {
        Position {
            symbol: Symbol::new(&self.symbol),
            quantity: parse_decimal(&self.qty),
            average_entry_price: parse_decimal(&self.avg_entry_price),
            market_value: parse_decimal(&self.market_value),
            unrealized_pnl: parse_decimal(&self.unrealized_pl),
        }
    }
}

/// Asset response from the Alpaca API.
#[derive(Debug, Clone, Deserialize)]
pub struct AlpacaAssetResponse {
    /// Symbol.
    pub symbol: String,
    /// Whether the asset accepts orders.
    pub tradable: bool,
    /// Whether fractional quantities are supported.
    #[serde(default)]
    pub fractionable: bool,
}

impl AlpacaAssetResponse {
    /// Convert to the internal asset schema.
    #[must_use]
    pub fn to_asset(&self) -> Asset {
        Asset {
            symbol: Symbol::new(&self.symbol),
            tradeable: self.tradable,
            fractionable: self.fractionable,
        }
    }
}

// ============================================================================
// Bar Types
// ============================================================================

/// One bar from the data API.
#[derive(Debug, Clone, Deserialize)]
pub struct AlpacaBar {
    /// Bar open time (RFC 3339).
    pub t: String,
    /// Open price.
    pub o: Decimal,
    /// High price.
    pub h: Decimal,
    /// Low price.
    pub l: Decimal,
    /// Close price.
    pub c: Decimal,
    /// Volume.
    pub v: u64,
}

impl AlpacaBar {
    /// Convert to the internal bar schema.
    ///
    /// Returns `None` when the timestamp is unparseable; the adapter
    /// drops such bars rather than inventing a time.
    #[must_use]
    pub fn to_bar(&self, symbol: &Symbol, timeframe: Timeframe) -> Option<Bar> {
        let open_time = Timestamp::parse(&self.t).ok()?;
        Some(Bar {
            symbol: symbol.clone(),
            timeframe,
            open_time,
            open: self.o,
            high: self.h,
            low: self.l,
            close: self.c,
            volume: self.v,
        })
    }
}

/// One page of bars from the data API.
#[derive(Debug, Clone, Deserialize)]
pub struct AlpacaBarsResponse {
    /// Bars in this page (absent when the range is empty).
    #[serde(default)]
    pub bars: Option<Vec<AlpacaBar>>,
    /// Pagination token for the next page.
    #[serde(default)]
    pub next_page_token: Option<String>,
}

// ============================================================================
// Error Types
// ============================================================================

/// Error response body from the Alpaca API.
///
/// Alpaca sends `code` as a JSON number (e.g. 40310000).
#[derive(Debug, Clone, Deserialize)]
pub struct AlpacaErrorResponse {
    /// Error code.
    #[serde(default)]
    pub code: Option<i64>,
    /// Error message.
    pub message: String,
}

fn parse_decimal(value: &str) -> Decimal {
    value.parse().unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parse_order_status_working_states() {
        assert_eq!(parse_order_status("new"), OrderStatus::Accepted);
        assert_eq!(parse_order_status("accepted"), OrderStatus::Accepted);
        assert_eq!(parse_order_status("pending_new"), OrderStatus::PendingNew);
    }

    #[test]
    fn parse_order_status_fills() {
        assert_eq!(
            parse_order_status("partially_filled"),
            OrderStatus::PartiallyFilled
        );
        assert_eq!(parse_order_status("filled"), OrderStatus::Filled);
    }

    #[test]
    fn parse_order_status_terminal_states() {
        assert_eq!(parse_order_status("canceled"), OrderStatus::Canceled);
        assert_eq!(parse_order_status("rejected"), OrderStatus::Rejected);
        assert_eq!(parse_order_status("expired"), OrderStatus::Expired);
        assert_eq!(parse_order_status("done_for_day"), OrderStatus::Expired);
    }

    #[test]
    fn parse_order_status_unknown_stays_pending() {
        assert_eq!(parse_order_status("calculated"), OrderStatus::PendingNew);
        assert_eq!(parse_order_status(""), OrderStatus::PendingNew);
    }

    #[test]
    fn order_response_to_status_report() {
        let response = AlpacaOrderResponse {
            id: "broker-123".to_string(),
            client_order_id: "client-456".to_string(),
            symbol: "AAPL".to_string(),
            status: "partially_filled".to_string(),
            filled_qty: Some("50".to_string()),
            filled_avg_price: Some("150.25".to_string()),
            updated_at: Some("2026-01-15T10:05:00Z".to_string()),
        };

        let report = response.to_status_report();
        assert_eq!(report.client_order_id.as_str(), "client-456");
        assert_eq!(
            report.report.broker_order_id.as_ref().unwrap().as_str(),
            "broker-123"
        );
        assert_eq!(report.report.status, OrderStatus::PartiallyFilled);
        assert_eq!(report.report.filled_quantity, Quantity::from_i64(50));
        assert_eq!(
            report.report.average_fill_price,
            Some(Money::new(dec!(150.25)))
        );
    }

    #[test]
    fn order_response_tolerates_missing_fill_fields() {
        let response = AlpacaOrderResponse {
            id: "broker-123".to_string(),
            client_order_id: "client-456".to_string(),
            symbol: "AAPL".to_string(),
            status: "new".to_string(),
            filled_qty: None,
            filled_avg_price: None,
            updated_at: None,
        };

        let report = response.to_status_report();
        assert_eq!(report.report.filled_quantity, Quantity::ZERO);
        assert!(report.report.average_fill_price.is_none());
    }

    #[test]
    fn account_response_to_account() {
        let response = AlpacaAccountResponse {
            id: "acct-1".to_string(),
            cash: "25000.50".to_string(),
            buying_power: "100000".to_string(),
            portfolio_value: "31000.25".to_string(),
        };

        let account = response.to_account(true);
        assert_eq!(account.cash, dec!(25000.50));
        assert_eq!(account.buying_power, dec!(100000));
        assert!(account.paper_trading);
    }

    #[test]
    fn position_response_to_position() {
        let response = AlpacaPositionResponse {
            symbol: "AAPL".to_string(),
            qty: "-10".to_string(),
            avg_entry_price: "150.00".to_string(),
            market_value: "-1520.00".to_string(),
            unrealized_pl: "-20.00".to_string(),
        };

        let position = response.to_position();
        assert_eq!(position.quantity, dec!(-10));
        assert!(position.is_short());
    }

    #[test]
    fn asset_response_to_asset() {
        let response = AlpacaAssetResponse {
            symbol: "aapl".to_string(),
            tradable: true,
            fractionable: false,
        };

        let asset = response.to_asset();
        assert_eq!(asset.symbol.as_str(), "AAPL");
        assert!(asset.tradeable);
        assert!(!asset.fractionable);
    }

    #[test]
    fn bar_to_domain_bar() {
        let bar = AlpacaBar {
            t: "2026-01-15T05:00:00Z".to_string(),
            o: dec!(150),
            h: dec!(152.5),
            l: dec!(149.75),
            c: dec!(151),
            v: 12_345_678,
        };

        let domain = bar.to_bar(&Symbol::new("AAPL"), Timeframe::OneDay).unwrap();
        assert_eq!(domain.high, dec!(152.5));
        assert_eq!(domain.volume, 12_345_678);
    }

    #[test]
    fn bar_with_bad_timestamp_dropped() {
        let bar = AlpacaBar {
            t: "not-a-time".to_string(),
            o: dec!(1),
            h: dec!(1),
            l: dec!(1),
            c: dec!(1),
            v: 0,
        };
        assert!(bar.to_bar(&Symbol::new("AAPL"), Timeframe::OneDay).is_none());
    }

    #[test]
    fn error_response_with_numeric_code() {
        let body = r#"{"code": 40310000, "message": "insufficient buying power"}"#;
        let parsed: AlpacaErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.code, Some(40_310_000));
    }

    #[test]
    fn error_response_without_code() {
        let body = r#"{"message": "forbidden"}"#;
        let parsed: AlpacaErrorResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.code.is_none());
    }

    #[test]
    fn bars_response_with_empty_range() {
        let body = r#"{"bars": null, "next_page_token": null}"#;
        let parsed: AlpacaBarsResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.bars.is_none());
        assert!(parsed.next_page_token.is_none());
    }

    #[test]
    fn order_request_serializes_broker_field_names() {
        let request = AlpacaOrderRequest {
            symbol: "AAPL".to_string(),
            qty: "1".to_string(),
            side: "buy".to_string(),
            order_type: "market".to_string(),
            time_in_force: "day".to_string(),
            limit_price: None,
            stop_price: None,
            client_order_id: "k1".to_string(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["type"], "market");
        assert_eq!(json["client_order_id"], "k1");
        assert!(json.get("limit_price").is_none());
    }
}
