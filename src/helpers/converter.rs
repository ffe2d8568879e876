use std::collections::{ BTreeMap, HashMap, HashSet };

use anyhow::{ Context, Result };
use tracing::debug;

use crate::helpers::{ precision::precision_from_step, validator::validate };
use crate::models::binance_models::{ RawBalance, RawFee, RawQuote, RawSymbol };
use crate::models::symbol::Symbol;

#[inline]
fn parse_decimal(value: &str, field: &str, ticker: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .with_context(|| format!("Invalid {} '{}' for {}", field, value, ticker))
}

/// Join exchange metadata, top-of-book and fee schedule into validated symbols.
///
/// Tickers missing from the fee schedule are charged `default_fee` on both sides.
pub fn to_symbols(
    raw_symbols: &[RawSymbol],
    quotes: &[RawQuote],
    fees: &[RawFee],
    default_fee: f64
) -> Result<Vec<Symbol>> {
    let quotes_by_ticker: HashMap<&str, &RawQuote> = quotes
        .iter()
        .map(|q| (q.symbol.as_str(), q))
        .collect();

    let mut fees_by_ticker: HashMap<&str, (f64, f64)> = HashMap::with_capacity(fees.len());
    for fee in fees {
        let maker = parse_decimal(&fee.maker_commission, "makerCommission", &fee.symbol)?;
        let taker = parse_decimal(&fee.taker_commission, "takerCommission", &fee.symbol)?;
        fees_by_ticker.insert(fee.symbol.as_str(), (maker, taker));
    }

    let mut symbols = Vec::with_capacity(raw_symbols.len() / 2);

    for raw in raw_symbols {
        let Some(quote) = quotes_by_ticker.get(raw.symbol.as_str()) else {
            continue;
        };
        let Some(lot_size) = validate(raw, quote) else {
            continue;
        };

        let step = raw.filters[lot_size].step_size.as_deref().unwrap_or("1");
        let (maker_fee, taker_fee) = fees_by_ticker
            .get(raw.symbol.as_str())
            .copied()
            .unwrap_or((default_fee, default_fee));

        symbols.push(Symbol {
            ticker: raw.symbol.as_str().into(),
            base_asset: raw.base_asset.as_str().into(),
            quote_asset: raw.quote_asset.as_str().into(),
            qty_precision: precision_from_step(step),
            quote_precision: raw.quote_asset_precision,
            maker_fee,
            taker_fee,
            bid: parse_decimal(&quote.bid_price, "bidPrice", &raw.symbol)?,
            ask: parse_decimal(&quote.ask_price, "askPrice", &raw.symbol)?,
        });
    }

    debug!(accepted = symbols.len(), total = raw_symbols.len(), "Converted exchange symbols");

    Ok(symbols)
}

/// Free balance per asset
pub fn to_wallet(balances: &[RawBalance]) -> Result<HashMap<String, f64>> {
    balances
        .iter()
        .map(|b| Ok((b.asset.clone(), parse_decimal(&b.free, "free", &b.asset)?)))
        .collect()
}

/// Keep only symbols whose two assets both belong to the configured universe.
///
/// An empty universe keeps everything.
pub fn filter_universe(symbols: Vec<Symbol>, universe: &BTreeMap<String, Vec<String>>) -> Vec<Symbol> {
    if universe.is_empty() {
        return symbols;
    }

    let assets: HashSet<&str> = universe
        .iter()
        .flat_map(|(crypto, quotes)| {
            std::iter::once(crypto.as_str()).chain(quotes.iter().map(String::as_str))
        })
        .collect();

    symbols
        .into_iter()
        .filter(|s| assets.contains(s.base_asset.as_ref()) && assets.contains(s.quote_asset.as_ref()))
        .collect()
}
