// src/market/store.rs

use std::sync::Arc;

use ahash::AHashMap;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::models::symbol::Symbol;

/// Read-only view over the quote table handed to evaluation closures
pub struct QuoteBook<'a> {
    symbols: &'a AHashMap<Arc<str>, Symbol>,
}

impl<'a> QuoteBook<'a> {
    #[inline]
    pub fn get(&self, ticker: &str) -> Option<&'a Symbol> {
        self.symbols.get(ticker)
    }
}

/// Shared quote and balance table.
///
/// Quotes live behind a single reader/writer lock so that an update and the
/// evaluation it triggers see one consistent snapshot. Balances are advisory
/// sizing inputs and sit in a concurrent map with last-writer-wins semantics.
#[derive(Debug, Default)]
pub struct PriceStore {
    symbols: RwLock<AHashMap<Arc<str>, Symbol>>,
    balances: DashMap<Arc<str>, f64>,
}

impl PriceStore {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_symbols(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        let store = Self::new();
        for symbol in symbols {
            store.insert_symbol(symbol);
        }
        store
    }

    /// Register a symbol with its static attributes and initial quote
    pub fn insert_symbol(&self, symbol: Symbol) {
        self.symbols.write().insert(symbol.ticker.clone(), symbol);
    }

    /// Replace the quote of a known ticker. Returns false for unknown tickers.
    #[inline]
    pub fn upsert_quote(&self, ticker: &str, bid: f64, ask: f64) -> bool {
        let mut symbols = self.symbols.write();
        match symbols.get_mut(ticker) {
            Some(symbol) => {
                symbol.bid = bid;
                symbol.ask = ask;
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn read_quote(&self, ticker: &str) -> Option<Symbol> {
        self.symbols.read().get(ticker).cloned()
    }

    /// Apply a quote update and run `evaluate` before the write lock is released.
    ///
    /// `evaluate` must not block or perform I/O. Returns None for unknown tickers.
    pub fn apply_and_evaluate<R>(
        &self,
        ticker: &str,
        bid: f64,
        ask: f64,
        evaluate: impl FnOnce(&QuoteBook<'_>) -> R
    ) -> Option<R> {
        let mut symbols = self.symbols.write();
        let symbol = symbols.get_mut(ticker)?;
        symbol.bid = bid;
        symbol.ask = ask;

        let book = QuoteBook { symbols: &*symbols };
        Some(evaluate(&book))
    }

    /// Run `f` against a consistent read snapshot of every quote
    pub fn snapshot<R>(&self, f: impl FnOnce(&QuoteBook<'_>) -> R) -> R {
        let symbols = self.symbols.read();
        f(&(QuoteBook { symbols: &*symbols }))
    }

    #[inline]
    pub fn upsert_balance(&self, asset: &str, amount: f64) {
        match self.balances.get_mut(asset) {
            Some(mut entry) => {
                *entry = amount;
            }
            None => {
                self.balances.insert(asset.into(), amount);
            }
        }
        debug!(asset, amount, "Balance updated");
    }

    /// Free balance of `asset`, zero when never seen
    #[inline]
    pub fn read_balance(&self, asset: &str) -> f64 {
        self.balances
            .get(asset)
            .map(|entry| *entry)
            .unwrap_or(0.0)
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.read().len()
    }
}
