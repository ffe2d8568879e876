use std::sync::Arc;

use ahash::AHashMap;
use smallvec::SmallVec;

use crate::market::store::QuoteBook;
use crate::models::{ opportunity::{ OpportunityKind, OpportunityRecord, PricePoint }, symbol::Symbol };

/// Sell the crypto on the `high` pair, convert the proceeds between quote
/// assets at `conversion`, buy back on the `low` pair. A fee is charged on each
/// of the three steps.
#[inline]
pub fn cross_quote_yield(high: f64, low: f64, fee: f64, conversion: f64) -> f64 {
    let to_quote = high * (1.0 - fee);
    let converted = to_quote * (1.0 - fee) * conversion;
    let back_to_crypto = converted * (1.0 - fee);
    back_to_crypto / low
}

#[derive(Debug, Clone)]
pub struct SpreadSettings {
    /// Quote asset the crypto is sold into
    pub quote: String,
    /// Other quote assets it may be bought back with
    pub peers: Vec<String>,
    pub fee: f64,
    pub conversion: f64,
    pub threshold: f64,
}

/// Watches the same crypto quoted in different assets. Monitor only, never traded.
#[derive(Debug)]
pub struct SpreadMonitor {
    settings: SpreadSettings,
    by_base: AHashMap<Arc<str>, SmallVec<[Arc<str>; 4]>>,
}

impl SpreadMonitor {
    pub fn new(settings: SpreadSettings, tracked: &[Symbol]) -> Self {
        let mut by_base: AHashMap<Arc<str>, SmallVec<[Arc<str>; 4]>> = AHashMap::new();
        let comparable = |asset: &str| asset == settings.quote || settings.peers.iter().any(|p| p == asset);
        for symbol in tracked.iter().filter(|s| comparable(s.quote_asset.as_ref())) {
            by_base.entry(symbol.base_asset.clone()).or_default().push(symbol.ticker.clone());
        }
        // A single listing cannot form a spread
        by_base.retain(|_, tickers| tickers.len() > 1);
        Self { settings, by_base }
    }

    #[inline]
    pub fn watches(&self, base_asset: &str) -> bool {
        self.by_base.contains_key(base_asset)
    }

    /// Record a spread for `base_asset` when it clears the threshold
    pub fn scan(&self, book: &QuoteBook<'_>, base_asset: &str) -> Option<OpportunityRecord> {
        let tickers = self.by_base.get(base_asset)?;

        let mut high: Option<&Symbol> = None;
        let mut low: Option<&Symbol> = None;
        for ticker in tickers {
            let Some(symbol) = book.get(ticker) else {
                continue;
            };
            if !symbol.has_usable_quote() {
                continue;
            }
            if
                symbol.quote_asset.as_ref() == self.settings.quote &&
                high.is_none_or(|h| symbol.bid > h.bid)
            {
                high = Some(symbol);
            }
            if low.is_none_or(|l| symbol.ask < l.ask) {
                low = Some(symbol);
            }
        }

        let (high, low) = (high?, low?);
        if high.ticker == low.ticker {
            return None;
        }

        let value = cross_quote_yield(high.bid, low.ask, self.settings.fee, self.settings.conversion);
        if value <= self.settings.threshold {
            return None;
        }

        Some(
            OpportunityRecord::new(
                OpportunityKind::Spread,
                PricePoint::new(high.ticker.as_ref(), high.bid),
                PricePoint::new(low.ticker.as_ref(), low.ask),
                value
            )
        )
    }
}
