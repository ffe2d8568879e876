//! Wire shapes of the exchange REST and stream payloads.
//!
//! Numbers arrive as decimal strings; conversion happens in `helpers::converter`
//! and in the feed handlers.

use serde::{ Deserialize, Serialize };

/// `GET /api/v3/exchangeInfo`
#[derive(Debug, Deserialize)]
pub struct ExchangeInfo {
    pub symbols: Vec<RawSymbol>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSymbol {
    pub symbol: String,
    #[serde(default)]
    pub status: String,
    pub base_asset: String,
    pub quote_asset: String,
    #[serde(default = "default_asset_precision")]
    pub quote_asset_precision: u8,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub permission_sets: Vec<Vec<String>>,
    #[serde(default)]
    pub is_spot_trading_allowed: bool,
    #[serde(default)]
    pub filters: Vec<RawFilter>,
}

fn default_asset_precision() -> u8 {
    8
}

/// Only the LOT_SIZE filter is read; the remaining filter kinds keep their type tag
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFilter {
    pub filter_type: String,
    #[serde(default)]
    pub step_size: Option<String>,
}

/// `GET /api/v3/ticker/bookTicker`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuote {
    pub symbol: String,
    pub bid_price: String,
    pub ask_price: String,
}

/// `GET /sapi/v1/asset/tradeFee`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFee {
    pub symbol: String,
    pub maker_commission: String,
    pub taker_commission: String,
}

/// `POST /sapi/v3/asset/getUserAsset`
#[derive(Debug, Clone, Deserialize)]
pub struct RawBalance {
    pub asset: String,
    pub free: String,
}

/// `POST /api/v3/userDataStream`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenKeyResponse {
    pub listen_key: String,
}

/// Structured rejection body, e.g. `{"code":-2014,"msg":"API-key format invalid."}`
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub code: i64,
    pub msg: String,
}

/// `POST /api/v3/order` with the FULL response type
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub symbol: String,
    pub order_id: u64,
    #[serde(default)]
    pub status: String,
    pub executed_qty: String,
    pub cummulative_quote_qty: String,
}

/// `<symbol>@bookTicker` stream event
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BookTickerEvent {
    #[serde(rename = "u", default)]
    pub update_id: Option<u64>,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "b")]
    pub bid: String,
    #[serde(rename = "a")]
    pub ask: String,
}

/// User-data stream event; only `outboundAccountPosition` carries balances
#[derive(Debug, Clone, Deserialize)]
pub struct AccountEvent {
    #[serde(rename = "e")]
    pub event_type: String,
    #[serde(rename = "B", default)]
    pub balances: Vec<StreamBalance>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamBalance {
    #[serde(rename = "a")]
    pub asset: String,
    #[serde(rename = "f")]
    pub free: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_exchange_info_symbol() {
        let json =
            r#"{"symbols":[{"symbol":"ETHBTC","status":"TRADING","baseAsset":"ETH","quoteAsset":"BTC",
            "quoteAssetPrecision":8,"permissions":["SPOT","MARGIN"],"isSpotTradingAllowed":true,
            "filters":[{"filterType":"PRICE_FILTER","minPrice":"0.00001","tickSize":"0.00001"},
                       {"filterType":"LOT_SIZE","minQty":"0.0001","maxQty":"100000","stepSize":"0.00010000"}]}]}"#;
        let info: ExchangeInfo = serde_json::from_str(json).unwrap();
        let s = &info.symbols[0];
        assert_eq!(s.symbol, "ETHBTC");
        assert_eq!(s.filters.len(), 2);
        assert_eq!(s.filters[1].step_size.as_deref(), Some("0.00010000"));
        assert!(s.filters[0].step_size.is_none());
    }

    #[test]
    fn decodes_order_fill() {
        let json =
            r#"{"symbol":"BTCUSDT","orderId":28,"clientOrderId":"x","transactTime":1,
            "executedQty":"0.00100000","cummulativeQuoteQty":"50.01000000","status":"FILLED","fills":[]}"#;
        let o: OrderResponse = serde_json::from_str(json).unwrap();
        assert_eq!(o.order_id, 28);
        assert_eq!(o.executed_qty, "0.00100000");
        assert_eq!(o.cummulative_quote_qty, "50.01000000");
    }

    #[test]
    fn account_events_without_balances_decode_empty() {
        let e: AccountEvent = serde_json
            ::from_str(r#"{"e":"balanceUpdate","E":1,"a":"BTC","d":"1.0"}"#)
            .unwrap();
        assert_eq!(e.event_type, "balanceUpdate");
        assert!(e.balances.is_empty());
    }
}
