use async_trait::async_trait;
use anyhow::Result;
use reqwest::{ Client as HttpClient, Method, StatusCode, Url };
use serde::de::DeserializeOwned;
use tracing::{ debug, info, warn };
use std::time::{ Duration, Instant };
use std::sync::Arc;

use crate::enums::side::OrderSide;
use crate::exchange::client::{ ExchangeClient, FillResult, OrderAmount };
use crate::exchange::endpoints::Endpoints;
use crate::exchange::error::ExchangeError;
use crate::exchange::signer::Signer;
use crate::models::binance_models::{
    ApiErrorBody,
    ExchangeInfo,
    ListenKeyResponse,
    OrderResponse,
    RawBalance,
    RawFee,
    RawQuote,
    RawSymbol,
};

const API_KEY_HEADER: &str = "X-MBX-APIKEY";
const RECV_WINDOW: &str = "10000";

// Shared singleton client for connection pooling
lazy_static::lazy_static! {
    static ref HTTP_CLIENT: HttpClient = HttpClient::builder()
        .timeout(Duration::from_secs(10))
        .tcp_nodelay(true) // Disable Nagle's algorithm for low latency
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .pool_idle_timeout(Some(Duration::from_secs(30)))
        .pool_max_idle_per_host(10)
        .build()
        .expect("Failed to create HTTP client");
}

pub struct BinanceClient {
    endpoints: Endpoints,

    /// API key for authenticated requests
    api_key: Arc<str>,

    /// Signs the query string of SIGNED endpoints
    signer: Signer,
}

impl BinanceClient {
    pub fn new(endpoints: Endpoints, api_key: &str, api_secret: &str) -> Self {
        Self {
            endpoints,
            api_key: api_key.into(),
            signer: Signer::new(api_secret),
        }
    }

    #[inline]
    fn endpoint(url: Result<Url>) -> Result<Url, ExchangeError> {
        url.map_err(|e| ExchangeError::Transport(e.to_string()))
    }

    /// Unauthenticated GET
    async fn get_public<T: DeserializeOwned>(&self, url: Url) -> Result<T, ExchangeError> {
        let response = HTTP_CLIENT.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        classify(status, &body)
    }

    /// Request carrying only the API key header (listen key management)
    async fn keyed<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        params: &[(&str, &str)]
    ) -> Result<T, ExchangeError> {
        let response = HTTP_CLIENT.request(method, url)
            .header(API_KEY_HEADER, self.api_key.as_ref())
            .query(params)
            .send().await?;
        let status = response.status();
        let body = response.text().await?;
        classify(status, &body)
    }

    /// SIGNED request: timestamp and recvWindow appended, then the HMAC signature
    async fn signed<T: DeserializeOwned>(
        &self,
        method: Method,
        mut url: Url,
        params: &[(&str, String)]
    ) -> Result<T, ExchangeError> {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let query = signed_query(&self.signer, params, timestamp)?;
        url.set_query(Some(&query));

        let response = HTTP_CLIENT.request(method, url)
            .header(API_KEY_HEADER, self.api_key.as_ref())
            .send().await?;
        let status = response.status();
        let body = response.text().await?;
        classify(status, &body)
    }
}

/// `k=v&..&recvWindow=..&timestamp=..&signature=..`
pub fn signed_query(
    signer: &Signer,
    params: &[(&str, String)],
    timestamp: i64
) -> Result<String, ExchangeError> {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        query.append_pair(key, value);
    }
    query.append_pair("recvWindow", RECV_WINDOW);
    query.append_pair("timestamp", &timestamp.to_string());
    let mut query = query.finish();

    let signature = signer.sign(&query)?;
    query.push_str("&signature=");
    query.push_str(&signature);
    Ok(query)
}

/// Map a response to a value or an error.
///
/// A `{code, msg}` body is a rejection whatever the status; other non-success
/// statuses are transport failures.
pub fn classify<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, ExchangeError> {
    if let Ok(err) = serde_json::from_str::<ApiErrorBody>(body) {
        warn!(code = err.code, msg = %err.msg, "Binance rejected request");
        return Err(ExchangeError::Rejected { code: err.code, msg: err.msg });
    }
    if !status.is_success() {
        return Err(ExchangeError::Transport(format!("HTTP {} - {}", status, body)));
    }
    serde_json::from_str(body).map_err(|e| ExchangeError::Decode(e.to_string()))
}

fn parse_amount(value: &str, field: &str) -> Result<f64, ExchangeError> {
    value.parse::<f64>().map_err(|e| ExchangeError::Decode(format!("{} '{}': {}", field, value, e)))
}

impl TryFrom<OrderResponse> for FillResult {
    type Error = ExchangeError;

    fn try_from(order: OrderResponse) -> Result<Self, Self::Error> {
        Ok(FillResult {
            order_id: order.order_id,
            executed_qty: parse_amount(&order.executed_qty, "executedQty")?,
            quote_qty: parse_amount(&order.cummulative_quote_qty, "cummulativeQuoteQty")?,
            status: order.status,
        })
    }
}

#[async_trait]
impl ExchangeClient for BinanceClient {
    fn name(&self) -> &str {
        "Binance"
    }

    async fn fetch_symbols(&self) -> Result<Vec<RawSymbol>, ExchangeError> {
        let start = Instant::now();
        let info: ExchangeInfo = self.get_public(Self::endpoint(self.endpoints.exchange_info())?).await?;
        info!("Fetched {} symbols from Binance in {:.2?}", info.symbols.len(), start.elapsed());
        Ok(info.symbols)
    }

    async fn fetch_top_of_book(&self) -> Result<Vec<RawQuote>, ExchangeError> {
        let quotes: Vec<RawQuote> = self.get_public(Self::endpoint(self.endpoints.book_ticker())?).await?;
        debug!("Fetched {} book tickers", quotes.len());
        Ok(quotes)
    }

    async fn fetch_fee_schedule(&self) -> Result<Vec<RawFee>, ExchangeError> {
        self.signed(Method::GET, Self::endpoint(self.endpoints.trade_fee())?, &[]).await
    }

    async fn fetch_balances(&self) -> Result<Vec<RawBalance>, ExchangeError> {
        self.signed(Method::POST, Self::endpoint(self.endpoints.user_asset())?, &[]).await
    }

    async fn fetch_session_token(&self) -> Result<String, ExchangeError> {
        let url = Self::endpoint(self.endpoints.user_data_stream())?;
        let response: ListenKeyResponse = self.keyed(Method::POST, url, &[]).await?;
        Ok(response.listen_key)
    }

    async fn renew_session_token(&self, token: &str) -> Result<(), ExchangeError> {
        let url = Self::endpoint(self.endpoints.user_data_stream())?;
        let _: serde_json::Value = self.keyed(Method::PUT, url, &[("listenKey", token)]).await?;
        Ok(())
    }

    async fn place_market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        amount: OrderAmount
    ) -> Result<FillResult, ExchangeError> {
        let (amount_key, amount_value) = amount.param();
        let params = [
            ("symbol", symbol.to_string()),
            ("side", side.to_string()),
            ("type", "MARKET".to_string()),
            (amount_key, amount_value),
            ("newOrderRespType", "FULL".to_string()),
        ];

        let order: OrderResponse = self.signed(Method::POST, Self::endpoint(self.endpoints.order())?, &params).await?;
        debug!(symbol, %side, order_id = order.order_id, status = %order.status, "Market order filled");
        FillResult::try_from(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_error_body_is_a_rejection() {
        let body = r#"{"code":-2010,"msg":"Account has insufficient balance for requested action."}"#;
        let result: Result<OrderResponse, _> = classify(StatusCode::BAD_REQUEST, body);
        assert_eq!(
            result.unwrap_err(),
            ExchangeError::Rejected {
                code: -2010,
                msg: "Account has insufficient balance for requested action.".to_string(),
            }
        );

        // Same body with a 200 status is still a rejection
        let result: Result<OrderResponse, _> = classify(StatusCode::OK, body);
        assert!(matches!(result, Err(ExchangeError::Rejected { code: -2010, .. })));
    }

    #[test]
    fn unstructured_failure_is_transport() {
        let result: Result<Vec<RawQuote>, _> = classify(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        let err = result.unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn malformed_success_body_is_decode_error() {
        let result: Result<Vec<RawQuote>, _> = classify(StatusCode::OK, r#"{"unexpected":true}"#);
        assert!(matches!(result, Err(ExchangeError::Decode(_))));
    }

    #[test]
    fn success_body_decodes() {
        let body = r#"[{"symbol":"BTCUSDT","bidPrice":"50000.00","bidQty":"1","askPrice":"50010.00","askQty":"2"}]"#;
        let quotes: Vec<RawQuote> = classify(StatusCode::OK, body).unwrap();
        assert_eq!(quotes[0].ask_price, "50010.00");
    }

    #[test]
    fn signed_query_appends_window_timestamp_and_signature() {
        let signer = Signer::new("secret");
        let query = signed_query(
            &signer,
            &[
                ("symbol", "BTCUSDT".to_string()),
                ("side", "BUY".to_string()),
            ],
            1_700_000_000_000
        ).unwrap();

        let (unsigned, signature) = query.split_once("&signature=").unwrap();
        assert_eq!(unsigned, "symbol=BTCUSDT&side=BUY&recvWindow=10000&timestamp=1700000000000");
        assert_eq!(signature, signer.sign(unsigned).unwrap());
        assert_eq!(signature.len(), 64);
    }

    #[test]
    fn order_response_maps_to_fill() {
        let order = OrderResponse {
            symbol: "BTCUSDT".to_string(),
            order_id: 7,
            status: "FILLED".to_string(),
            executed_qty: "0.002".to_string(),
            cummulative_quote_qty: "100.02".to_string(),
        };
        let fill = FillResult::try_from(order).unwrap();
        assert_eq!(fill.executed_qty, 0.002);
        assert_eq!(fill.quote_qty, 100.02);
    }
}
