use serde::{ Deserialize, Serialize };
use strum_macros::{ AsRefStr, Display, EnumString };

/// Side of a market order as the exchange spells it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Buying spends the quote asset, selling spends the base asset
    #[inline]
    pub fn spends_quote(&self) -> bool {
        matches!(self, OrderSide::Buy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parses_and_prints_exchange_spelling() {
        assert_eq!(OrderSide::from_str("buy").unwrap(), OrderSide::Buy);
        assert_eq!(OrderSide::from_str("SELL").unwrap(), OrderSide::Sell);
        assert_eq!(OrderSide::Buy.to_string(), "BUY");
        assert_eq!(OrderSide::Sell.as_ref(), "SELL");
    }
}
