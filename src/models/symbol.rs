use std::fmt;
use std::sync::Arc;

use crate::enums::fee_kind::FeeKind;
use crate::enums::side::OrderSide;

/// Tradable pair with its live top-of-book quote.
///
/// Precision and fee attributes are fixed at construction; only `bid` and
/// `ask` change afterwards, and only through the price store.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub ticker: Arc<str>, // Using Arc<str> to reduce clone costs
    pub base_asset: Arc<str>,
    pub quote_asset: Arc<str>,
    /// Decimals allowed for a base-asset order quantity (LOT_SIZE step)
    pub qty_precision: u8,
    /// Decimals allowed for a quote-asset order amount
    pub quote_precision: u8,
    pub maker_fee: f64,
    pub taker_fee: f64,
    pub bid: f64,
    pub ask: f64,
}

impl Symbol {
    #[inline]
    pub fn fee(&self, kind: FeeKind) -> f64 {
        match kind {
            FeeKind::Maker => self.maker_fee,
            FeeKind::Taker => self.taker_fee,
        }
    }

    /// Both sides are finite and strictly positive
    #[inline]
    pub fn has_usable_quote(&self) -> bool {
        self.bid.is_finite() && self.ask.is_finite() && self.bid > 0.0 && self.ask > 0.0
    }

    /// Asset spent by an order on this pair
    #[inline]
    pub fn spent_asset(&self, side: OrderSide) -> &Arc<str> {
        if side.spends_quote() { &self.quote_asset } else { &self.base_asset }
    }

    /// Asset received by an order on this pair
    #[inline]
    pub fn received_asset(&self, side: OrderSide) -> &Arc<str> {
        if side.spends_quote() { &self.base_asset } else { &self.quote_asset }
    }

    /// Decimal precision of the amount sent with an order on this pair
    #[inline]
    pub fn order_precision(&self, side: OrderSide) -> u8 {
        if side.spends_quote() { self.quote_precision } else { self.qty_precision }
    }
}

impl fmt::Display for Symbol {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base_asset, self.quote_asset)
    }
}
