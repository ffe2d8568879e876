use async_trait::async_trait;

use crate::enums::side::OrderSide;
use crate::exchange::error::ExchangeError;
use crate::helpers::precision::{ format_quantity, round_down };
use crate::models::binance_models::{ RawBalance, RawFee, RawQuote, RawSymbol };

/// Amount sent with a market order
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderAmount {
    /// Quantity of the base asset (`quantity`)
    Base {
        qty: f64,
        precision: u8,
    },
    /// Amount of the quote asset to spend (`quoteOrderQty`)
    Quote {
        qty: f64,
        precision: u8,
    },
}

impl OrderAmount {
    /// Amount actually submitted: `qty` floored to `precision`
    #[inline]
    pub fn value(&self) -> f64 {
        match *self {
            | OrderAmount::Base { qty, precision }
            | OrderAmount::Quote { qty, precision } => round_down(qty, precision),
        }
    }

    /// Query parameter name and formatted value
    pub fn param(&self) -> (&'static str, String) {
        match *self {
            OrderAmount::Base { qty, precision } => ("quantity", format_quantity(qty, precision)),
            OrderAmount::Quote { qty, precision } => ("quoteOrderQty", format_quantity(qty, precision)),
        }
    }
}

/// Executed amounts of a filled market order, gross of commission
#[derive(Debug, Clone, PartialEq)]
pub struct FillResult {
    pub order_id: u64,
    pub status: String,
    /// Base asset quantity
    pub executed_qty: f64,
    /// Quote asset quantity
    pub quote_qty: f64,
}

impl FillResult {
    /// Amount of the asset received by an order on `side`
    #[inline]
    pub fn received(&self, side: OrderSide) -> f64 {
        if side.spends_quote() { self.executed_qty } else { self.quote_qty }
    }

    /// Amount of the asset given up by an order on `side`
    #[inline]
    pub fn spent(&self, side: OrderSide) -> f64 {
        if side.spends_quote() { self.quote_qty } else { self.executed_qty }
    }
}

/// Request/response surface of the exchange.
///
/// Each call is a single request; nothing is retried here.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Get the name of the exchange
    fn name(&self) -> &str;

    async fn fetch_symbols(&self) -> Result<Vec<RawSymbol>, ExchangeError>;

    async fn fetch_top_of_book(&self) -> Result<Vec<RawQuote>, ExchangeError>;

    async fn fetch_fee_schedule(&self) -> Result<Vec<RawFee>, ExchangeError>;

    async fn fetch_balances(&self) -> Result<Vec<RawBalance>, ExchangeError>;

    /// Issue a user-data stream listen key
    async fn fetch_session_token(&self) -> Result<String, ExchangeError>;

    /// Extend the validity of a listen key
    async fn renew_session_token(&self, token: &str) -> Result<(), ExchangeError>;

    async fn place_market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        amount: OrderAmount
    ) -> Result<FillResult, ExchangeError>;
}
