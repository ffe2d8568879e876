//! Scripted collaborators for tests: an exchange that records orders and a
//! feed connector that replays canned frames.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{ AtomicUsize, Ordering };

use async_trait::async_trait;
use parking_lot::Mutex;
use url::Url;

use crate::enums::side::OrderSide;
use crate::exchange::client::{ ExchangeClient, FillResult, OrderAmount };
use crate::exchange::error::ExchangeError;
use crate::market::feed::{ FeedConnection, FeedConnector, FeedError };
use crate::market::store::PriceStore;
use crate::models::binance_models::{ RawBalance, RawFee, RawFilter, RawQuote, RawSymbol };
use crate::models::symbol::Symbol;

pub fn symbol_with_fee(base: &str, quote: &str, bid: f64, ask: f64, fee: f64) -> Symbol {
    Symbol {
        ticker: format!("{}{}", base, quote).into(),
        base_asset: base.into(),
        quote_asset: quote.into(),
        qty_precision: 8,
        quote_precision: 8,
        maker_fee: fee,
        taker_fee: fee,
        bid,
        ask,
    }
}

/// Symbol with exchange-like precisions instead of 8/8
pub fn symbol_with_precision(
    base: &str,
    quote: &str,
    bid: f64,
    ask: f64,
    qty_precision: u8,
    quote_precision: u8
) -> Symbol {
    Symbol { qty_precision, quote_precision, ..symbol_with_fee(base, quote, bid, ask, 0.001) }
}

pub fn symbol(base: &str, quote: &str, bid: f64, ask: f64) -> Symbol {
    symbol_with_fee(base, quote, bid, ask, 0.001)
}

pub fn raw_symbol(base: &str, quote: &str, step: &str) -> RawSymbol {
    RawSymbol {
        symbol: format!("{}{}", base, quote),
        status: "TRADING".to_string(),
        base_asset: base.to_string(),
        quote_asset: quote.to_string(),
        quote_asset_precision: 8,
        permissions: vec!["SPOT".to_string()],
        permission_sets: Vec::new(),
        is_spot_trading_allowed: true,
        filters: vec![RawFilter { filter_type: "LOT_SIZE".to_string(), step_size: Some(step.to_string()) }],
    }
}

pub fn raw_quote(ticker: &str, bid: &str, ask: &str) -> RawQuote {
    RawQuote { symbol: ticker.to_string(), bid_price: bid.to_string(), ask_price: ask.to_string() }
}

/// Exchange double. Orders fill at the attached store's top of book.
#[derive(Default)]
pub struct ScriptedExchange {
    store: Option<Arc<PriceStore>>,
    symbols: Vec<RawSymbol>,
    quotes: Vec<RawQuote>,
    fees: Vec<RawFee>,
    balances: Vec<RawBalance>,
    fail_order_at: Option<usize>,
    fail_renewal: bool,
    orders: Mutex<Vec<(String, OrderSide, OrderAmount)>>,
    pub renewals: AtomicUsize,
}

impl ScriptedExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: Arc<PriceStore>) -> Self {
        Self { store: Some(store), ..Self::default() }
    }

    pub fn with_metadata(mut self, symbols: Vec<RawSymbol>, quotes: Vec<RawQuote>) -> Self {
        self.symbols = symbols;
        self.quotes = quotes;
        self
    }

    pub fn with_balances(mut self, balances: &[(&str, &str)]) -> Self {
        self.balances = balances
            .iter()
            .map(|(asset, free)| RawBalance { asset: asset.to_string(), free: free.to_string() })
            .collect();
        self
    }

    /// The order with this zero-based index is rejected
    pub fn fail_order(mut self, index: usize) -> Self {
        self.fail_order_at = Some(index);
        self
    }

    pub fn fail_renewal(mut self) -> Self {
        self.fail_renewal = true;
        self
    }

    pub fn orders(&self) -> Vec<(String, OrderSide, OrderAmount)> {
        self.orders.lock().clone()
    }
}

#[async_trait]
impl ExchangeClient for ScriptedExchange {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn fetch_symbols(&self) -> Result<Vec<RawSymbol>, ExchangeError> {
        Ok(self.symbols.clone())
    }

    async fn fetch_top_of_book(&self) -> Result<Vec<RawQuote>, ExchangeError> {
        Ok(self.quotes.clone())
    }

    async fn fetch_fee_schedule(&self) -> Result<Vec<RawFee>, ExchangeError> {
        Ok(self.fees.clone())
    }

    async fn fetch_balances(&self) -> Result<Vec<RawBalance>, ExchangeError> {
        Ok(self.balances.clone())
    }

    async fn fetch_session_token(&self) -> Result<String, ExchangeError> {
        Ok("listen-key".to_string())
    }

    async fn renew_session_token(&self, _token: &str) -> Result<(), ExchangeError> {
        self.renewals.fetch_add(1, Ordering::SeqCst);
        if self.fail_renewal {
            return Err(ExchangeError::Transport("connection reset".to_string()));
        }
        Ok(())
    }

    async fn place_market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        amount: OrderAmount
    ) -> Result<FillResult, ExchangeError> {
        let index = {
            let mut orders = self.orders.lock();
            orders.push((symbol.to_string(), side, amount));
            orders.len() - 1
        };
        if self.fail_order_at == Some(index) {
            return Err(ExchangeError::Rejected { code: -2010, msg: "insufficient balance".to_string() });
        }

        let quote = self.store
            .as_ref()
            .and_then(|store| store.read_quote(symbol))
            .ok_or_else(|| ExchangeError::Rejected { code: -1121, msg: "Invalid symbol.".to_string() })?;
        let price = if side.spends_quote() { quote.ask } else { quote.bid };
        let qty = amount.value();
        let (executed_qty, quote_qty) = match amount {
            OrderAmount::Base { .. } => (qty, qty * price),
            OrderAmount::Quote { .. } => (qty / price, qty),
        };

        Ok(FillResult { order_id: (index as u64) + 1, status: "FILLED".to_string(), executed_qty, quote_qty })
    }
}

/// Outcome of one connection attempt
pub enum Connect {
    /// Connection that yields these frames, then idles until closed
    Accept(Vec<Result<String, FeedError>>),
    Refuse,
}

pub struct ScriptedConnector {
    script: Mutex<VecDeque<Connect>>,
    pub connects: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
}

impl ScriptedConnector {
    pub fn new(script: Vec<Connect>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            connects: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl FeedConnector for ScriptedConnector {
    async fn connect(&self, url: &Url) -> Result<Box<dyn FeedConnection>, FeedError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().pop_front();
        match next {
            Some(Connect::Accept(frames)) =>
                Ok(
                    Box::new(ScriptedConnection {
                        frames: frames.into(),
                        closes: self.closes.clone(),
                    })
                ),
            Some(Connect::Refuse) | None => Err(FeedError::Connect(format!("{} refused", url))),
        }
    }
}

struct ScriptedConnection {
    frames: VecDeque<Result<String, FeedError>>,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl FeedConnection for ScriptedConnection {
    async fn next_text(&mut self) -> Result<String, FeedError> {
        match self.frames.pop_front() {
            Some(frame) => frame,
            None => futures::future::pending().await,
        }
    }

    async fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}
