use std::sync::Arc;
use std::sync::atomic::{ AtomicU64, Ordering };

use async_trait::async_trait;
use tracing::info;

use crate::enums::side::OrderSide;
use crate::exchange::client::{ ExchangeClient, FillResult, OrderAmount };
use crate::exchange::error::ExchangeError;
use crate::market::store::PriceStore;
use crate::models::binance_models::{ RawBalance, RawFee, RawQuote, RawSymbol };

/// Simulated order placement on top of a real client.
///
/// Market orders fill instantly at the stored top of book (ask for buys, bid
/// for sells). Every other call goes to the wrapped client.
pub struct PaperExchange {
    inner: Arc<dyn ExchangeClient>,
    store: Arc<PriceStore>,
    next_order_id: AtomicU64,
}

impl PaperExchange {
    pub fn new(inner: Arc<dyn ExchangeClient>, store: Arc<PriceStore>) -> Self {
        Self { inner, store, next_order_id: AtomicU64::new(1) }
    }
}

#[async_trait]
impl ExchangeClient for PaperExchange {
    fn name(&self) -> &str {
        "Paper"
    }

    async fn fetch_symbols(&self) -> Result<Vec<RawSymbol>, ExchangeError> {
        self.inner.fetch_symbols().await
    }

    async fn fetch_top_of_book(&self) -> Result<Vec<RawQuote>, ExchangeError> {
        self.inner.fetch_top_of_book().await
    }

    async fn fetch_fee_schedule(&self) -> Result<Vec<RawFee>, ExchangeError> {
        self.inner.fetch_fee_schedule().await
    }

    async fn fetch_balances(&self) -> Result<Vec<RawBalance>, ExchangeError> {
        self.inner.fetch_balances().await
    }

    async fn fetch_session_token(&self) -> Result<String, ExchangeError> {
        self.inner.fetch_session_token().await
    }

    async fn renew_session_token(&self, token: &str) -> Result<(), ExchangeError> {
        self.inner.renew_session_token(token).await
    }

    async fn place_market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        amount: OrderAmount
    ) -> Result<FillResult, ExchangeError> {
        let quote = self.store.read_quote(symbol).ok_or_else(|| ExchangeError::Rejected {
            code: -1121,
            msg: "Invalid symbol.".to_string(),
        })?;

        let price = match side {
            OrderSide::Buy => quote.ask,
            OrderSide::Sell => quote.bid,
        };
        if !price.is_finite() || price <= 0.0 {
            return Err(ExchangeError::Rejected { code: -2010, msg: "No liquidity at top of book.".to_string() });
        }
        if !(amount.value() > 0.0) {
            return Err(ExchangeError::Rejected { code: -1013, msg: "Filter failure: LOT_SIZE".to_string() });
        }

        // Fill exactly what a live order would carry
        let qty = amount.value();
        let (executed_qty, quote_qty) = match amount {
            OrderAmount::Base { .. } => (qty, qty * price),
            OrderAmount::Quote { .. } => (qty / price, qty),
        };

        let order_id = self.next_order_id.fetch_add(1, Ordering::Relaxed);
        info!(symbol, %side, price, executed_qty, quote_qty, order_id, "Paper fill");

        Ok(FillResult { order_id, status: "FILLED".to_string(), executed_qty, quote_qty })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{ ScriptedExchange, symbol };

    fn paper() -> PaperExchange {
        let store = Arc::new(PriceStore::from_symbols([symbol("BTC", "USDT", 50000.0, 50010.0)]));
        PaperExchange::new(Arc::new(ScriptedExchange::new()), store)
    }

    #[tokio::test]
    async fn buys_at_ask_and_sells_at_bid() {
        let paper = paper();

        let buy = paper
            .place_market_order("BTCUSDT", OrderSide::Buy, OrderAmount::Quote { qty: 500.1, precision: 2 }).await
            .unwrap();
        assert!((buy.executed_qty - 0.01).abs() < 1e-12);
        assert_eq!(buy.quote_qty, 500.1);

        let sell = paper
            .place_market_order("BTCUSDT", OrderSide::Sell, OrderAmount::Base { qty: 0.01, precision: 5 }).await
            .unwrap();
        assert_eq!(sell.executed_qty, 0.01);
        assert_eq!(sell.quote_qty, 500.0);
        assert_ne!(buy.order_id, sell.order_id);
    }

    #[tokio::test]
    async fn rejects_unknown_symbol_and_empty_amount() {
        let paper = paper();
        let err = paper
            .place_market_order("ETHUSDT", OrderSide::Buy, OrderAmount::Quote { qty: 1.0, precision: 2 }).await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::Rejected { code: -1121, .. }));

        let err = paper
            .place_market_order("BTCUSDT", OrderSide::Sell, OrderAmount::Base { qty: 0.0, precision: 5 }).await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::Rejected { code: -1013, .. }));

        // 0.4 at precision 0 is nothing once floored
        let err = paper
            .place_market_order("BTCUSDT", OrderSide::Sell, OrderAmount::Base { qty: 0.4, precision: 0 }).await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::Rejected { code: -1013, .. }));
    }

    #[tokio::test]
    async fn fills_the_floored_amount_that_would_be_sent() {
        let paper = paper();
        let amount = OrderAmount::Base { qty: 0.0199999, precision: 3 };

        let fill = paper.place_market_order("BTCUSDT", OrderSide::Sell, amount).await.unwrap();

        assert_eq!(amount.param().1, "0.019");
        assert_eq!(fill.executed_qty, 0.019);
        assert_eq!(fill.executed_qty, amount.value());
    }
}
