use std::fmt;
use std::sync::Arc;

use crate::enums::direction::Direction;
use crate::enums::side::OrderSide;

/// Closed cycle base -> intermediate -> ticker -> base over three pairs.
///
/// The pair tickers are derived by concatenating asset codes:
/// pair1 = intermediate+base, pair2 = ticker+intermediate, pair3 = ticker+base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triangle {
    pub base: Arc<str>,
    pub intermediate: Arc<str>,
    pub ticker: Arc<str>,
    pairs: [Arc<str>; 3],
}

impl Triangle {
    pub fn new(base: Arc<str>, intermediate: Arc<str>, ticker: Arc<str>) -> Self {
        let pairs = derive_pairs(&base, &intermediate, &ticker);
        Self { base, intermediate, ticker, pairs }
    }

    #[inline]
    pub fn pair1(&self) -> &str {
        &self.pairs[0]
    }

    #[inline]
    pub fn pair2(&self) -> &str {
        &self.pairs[1]
    }

    #[inline]
    pub fn pair3(&self) -> &str {
        &self.pairs[2]
    }

    #[inline]
    pub fn pairs(&self) -> &[Arc<str>; 3] {
        &self.pairs
    }

    #[inline]
    pub fn contains(&self, ticker: &str) -> bool {
        self.pairs.iter().any(|p| p.as_ref() == ticker)
    }

    /// Pair tickers and order sides of the three legs, in execution order
    pub fn legs(&self, direction: Direction) -> [(Arc<str>, OrderSide); 3] {
        let [s1, s2, s3] = direction.sides();
        match direction {
            Direction::Forward =>
                [
                    (self.pairs[0].clone(), s1),
                    (self.pairs[1].clone(), s2),
                    (self.pairs[2].clone(), s3),
                ],
            Direction::Reverse =>
                [
                    (self.pairs[2].clone(), s1),
                    (self.pairs[1].clone(), s2),
                    (self.pairs[0].clone(), s3),
                ],
        }
    }
}

/// Pair tickers of the cycle (base, intermediate, ticker)
pub fn derive_pairs(base: &str, intermediate: &str, ticker: &str) -> [Arc<str>; 3] {
    [
        format!("{}{}", intermediate, base).into(),
        format!("{}{}", ticker, intermediate).into(),
        format!("{}{}", ticker, base).into(),
    ]
}

impl fmt::Display for Triangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {} → {}", self.pairs[0], self.pairs[1], self.pairs[2])
    }
}
