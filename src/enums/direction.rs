use serde::{ Deserialize, Serialize };
use strum_macros::{ Display, EnumString };

use super::side::OrderSide;

/// Traversal direction of a triangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// buy pair1, buy pair2, sell pair3
    Forward,
    /// buy pair3, sell pair2, sell pair1
    Reverse,
}

impl Direction {
    /// Order sides of the three legs, in execution order
    #[inline]
    pub fn sides(&self) -> [OrderSide; 3] {
        match self {
            Direction::Forward => [OrderSide::Buy, OrderSide::Buy, OrderSide::Sell],
            Direction::Reverse => [OrderSide::Buy, OrderSide::Sell, OrderSide::Sell],
        }
    }
}
