//! Round-trip yield of a triangle over the current top of book.
//!
//! Forward buys pair1, buys pair2 and sells pair3; reverse buys pair3, sells
//! pair2 and sells pair1. Both are net of the per-leg fee.

use crate::enums::{ direction::Direction, fee_kind::FeeKind };
use crate::market::store::QuoteBook;
use crate::models::{ symbol::Symbol, triangle::Triangle };

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Yields {
    pub forward: f64,
    pub reverse: f64,
}

impl Yields {
    #[inline]
    pub fn get(&self, direction: Direction) -> f64 {
        match direction {
            Direction::Forward => self.forward,
            Direction::Reverse => self.reverse,
        }
    }
}

#[inline]
pub fn forward_yield(pair1: &Symbol, pair2: &Symbol, pair3: &Symbol, fee_kind: FeeKind) -> f64 {
    (1.0 / pair1.ask) *
        (1.0 - pair1.fee(fee_kind)) *
        (1.0 / pair2.ask) *
        (1.0 - pair2.fee(fee_kind)) *
        pair3.bid *
        (1.0 - pair3.fee(fee_kind))
}

#[inline]
pub fn reverse_yield(pair1: &Symbol, pair2: &Symbol, pair3: &Symbol, fee_kind: FeeKind) -> f64 {
    (1.0 / pair3.ask) *
        (1.0 - pair3.fee(fee_kind)) *
        pair2.bid *
        (1.0 - pair2.fee(fee_kind)) *
        pair1.bid *
        (1.0 - pair1.fee(fee_kind))
}

/// Both yields of `triangle`, or None when a pair is unknown or its quote is
/// zero, negative or not finite.
pub fn evaluate(book: &QuoteBook<'_>, triangle: &Triangle, fee_kind: FeeKind) -> Option<Yields> {
    let pair1 = book.get(triangle.pair1())?;
    let pair2 = book.get(triangle.pair2())?;
    let pair3 = book.get(triangle.pair3())?;

    if !(pair1.has_usable_quote() && pair2.has_usable_quote() && pair3.has_usable_quote()) {
        return None;
    }

    Some(Yields {
        forward: forward_yield(pair1, pair2, pair3, fee_kind),
        reverse: reverse_yield(pair1, pair2, pair3, fee_kind),
    })
}
