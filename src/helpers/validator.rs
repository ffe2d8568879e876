use crate::models::binance_models::{ RawQuote, RawSymbol };

const LOT_SIZE: &str = "LOT_SIZE";
const SPOT: &str = "SPOT";

/// Accept a symbol for trading.
///
/// The ticker must match the quote's ticker, both sides of the quote must be
/// non-zero, the symbol must carry SPOT permission and a LOT_SIZE filter.
/// Returns the index of that filter so the caller can read its step size.
pub fn validate(symbol: &RawSymbol, quote: &RawQuote) -> Option<usize> {
    if symbol.symbol != quote.symbol {
        return None;
    }
    if !is_non_zero(&quote.bid_price) || !is_non_zero(&quote.ask_price) {
        return None;
    }
    if !has_spot_permission(symbol) {
        return None;
    }
    symbol.filters
        .iter()
        .position(|f| f.filter_type == LOT_SIZE && f.step_size.is_some())
}

#[inline]
fn is_non_zero(price: &str) -> bool {
    price
        .parse::<f64>()
        .map(|p| p != 0.0)
        .unwrap_or(false)
}

fn has_spot_permission(symbol: &RawSymbol) -> bool {
    // Newer exchangeInfo payloads move permissions into permissionSets
    symbol.permissions.iter().any(|p| p == SPOT) ||
        symbol.permission_sets.iter().flatten().any(|p| p == SPOT) ||
        symbol.is_spot_trading_allowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::binance_models::RawFilter;

    fn raw_symbol(ticker: &str) -> RawSymbol {
        RawSymbol {
            symbol: ticker.to_string(),
            status: "TRADING".to_string(),
            base_asset: "ETH".to_string(),
            quote_asset: "BTC".to_string(),
            quote_asset_precision: 8,
            permissions: vec!["SPOT".to_string()],
            permission_sets: Vec::new(),
            is_spot_trading_allowed: false,
            filters: vec![
                RawFilter { filter_type: "PRICE_FILTER".to_string(), step_size: None },
                RawFilter {
                    filter_type: "LOT_SIZE".to_string(),
                    step_size: Some("0.00010000".to_string()),
                }
            ],
        }
    }

    fn raw_quote(ticker: &str, bid: &str, ask: &str) -> RawQuote {
        RawQuote {
            symbol: ticker.to_string(),
            bid_price: bid.to_string(),
            ask_price: ask.to_string(),
        }
    }

    #[test]
    fn accepts_spot_symbol_and_returns_lot_size_index() {
        let index = validate(&raw_symbol("ETHBTC"), &raw_quote("ETHBTC", "0.06", "0.0601"));
        assert_eq!(index, Some(1));
    }

    #[test]
    fn rejects_mismatched_ticker() {
        assert_eq!(validate(&raw_symbol("ETHBTC"), &raw_quote("BNBBTC", "0.06", "0.0601")), None);
    }

    #[test]
    fn rejects_zero_quotes() {
        let s = raw_symbol("ETHBTC");
        assert_eq!(validate(&s, &raw_quote("ETHBTC", "0.00000000", "0.0601")), None);
        assert_eq!(validate(&s, &raw_quote("ETHBTC", "0.06", "0.00000000")), None);
    }

    #[test]
    fn rejects_missing_spot_permission() {
        let mut s = raw_symbol("ETHBTC");
        s.permissions = vec!["MARGIN".to_string()];
        assert_eq!(validate(&s, &raw_quote("ETHBTC", "0.06", "0.0601")), None);

        s.permission_sets = vec![vec!["MARGIN".to_string(), "SPOT".to_string()]];
        assert_eq!(validate(&s, &raw_quote("ETHBTC", "0.06", "0.0601")), Some(1));
    }

    #[test]
    fn rejects_missing_lot_size() {
        let mut s = raw_symbol("ETHBTC");
        s.filters.truncate(1);
        assert_eq!(validate(&s, &raw_quote("ETHBTC", "0.06", "0.0601")), None);
    }
}
