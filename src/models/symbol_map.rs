use std::{ collections::HashSet, sync::Arc };

use ahash::AHashMap;
use tracing::{ info, warn };

use super::{ symbol::Symbol, triangle::{ Triangle, derive_pairs } };

/// Triangles found for a set of base assets, plus every symbol they touch
#[derive(Debug, Clone, Default)]
pub struct Generated {
    pub triangles: Vec<Triangle>,
    /// Deduplicated by ticker, in discovery order
    pub tracked: Vec<Symbol>,
}

/// Validated symbols indexed for cycle search
#[derive(Debug, Clone, Default)]
pub struct SymbolMap {
    symbols: Vec<Symbol>,
    by_ticker: AHashMap<Arc<str>, usize>,
    by_quote: AHashMap<Arc<str>, Vec<usize>>,
}

impl SymbolMap {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from symbols
    pub fn from_symbols(symbols: Vec<Symbol>) -> Self {
        let mut map = Self::new();
        for symbol in symbols {
            map.add_symbol(symbol);
        }
        map
    }

    /// Symbols whose ticker is not `base + quote` cannot be reached by the
    /// pair derivation and are left out of the indices.
    pub fn add_symbol(&mut self, symbol: Symbol) {
        if symbol.ticker.len() != symbol.base_asset.len() + symbol.quote_asset.len() ||
            !symbol.ticker.starts_with(symbol.base_asset.as_ref()) ||
            !symbol.ticker.ends_with(symbol.quote_asset.as_ref())
        {
            warn!(ticker = %symbol.ticker, "Ticker is not base+quote, skipping");
            return;
        }
        if self.by_ticker.contains_key(&symbol.ticker) {
            return;
        }

        let index = self.symbols.len();
        self.by_ticker.insert(symbol.ticker.clone(), index);
        self.by_quote
            .entry(symbol.quote_asset.clone())
            .or_insert_with(|| Vec::with_capacity(10))
            .push(index);
        self.symbols.push(symbol);
    }

    #[inline]
    pub fn get(&self, ticker: &str) -> Option<&Symbol> {
        self.by_ticker.get(ticker).map(|&i| &self.symbols[i])
    }

    #[inline]
    fn quoted_in(&self, asset: &str) -> &[usize] {
        self.by_quote
            .get(asset)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Enumerate every cycle base -> S1.base -> S2.base -> base.
    ///
    /// S1 is quoted in the base, S2 is quoted in S1's base asset and S3 closes
    /// the cycle with S2's base asset quoted in the base. Equivalent triangles
    /// reached from different bases are all kept. A non-zero `max_triangles`
    /// truncates the result; the tracked set only covers retained triangles.
    pub fn find_triangles(&self, bases: &[String], max_triangles: usize) -> Generated {
        let start = std::time::Instant::now();
        let mut found: Vec<(Triangle, [usize; 3])> = Vec::new();

        for base in bases {
            let base = base.as_str();
            let first_legs = self.quoted_in(base);
            if first_legs.is_empty() {
                warn!("Base asset {} not found as quote in any symbol", base);
                continue;
            }

            for &i1 in first_legs {
                let s1 = &self.symbols[i1];
                for &i2 in self.quoted_in(&s1.base_asset) {
                    let s2 = &self.symbols[i2];
                    if s2.base_asset.as_ref() == base {
                        continue;
                    }
                    for &i3 in first_legs {
                        let s3 = &self.symbols[i3];
                        if s3.base_asset != s2.base_asset {
                            continue;
                        }
                        let triangle = Triangle::new(
                            s3.quote_asset.clone(),
                            s1.base_asset.clone(),
                            s2.base_asset.clone()
                        );
                        found.push((triangle, [i1, i2, i3]));
                    }
                }
            }
        }

        info!("Found {} triangles for bases {:?}", found.len(), bases);

        if max_triangles > 0 && found.len() > max_triangles {
            found.truncate(max_triangles);
            info!("Truncated to {} triangles", max_triangles);
        }

        let mut seen: HashSet<usize> = HashSet::new();
        let mut tracked = Vec::new();
        let mut triangles = Vec::with_capacity(found.len());
        for (triangle, indices) in found {
            for index in indices {
                if seen.insert(index) {
                    tracked.push(self.symbols[index].clone());
                }
            }
            triangles.push(triangle);
        }

        info!(
            triangles = triangles.len(),
            tracked = tracked.len(),
            "Generated triangles in {:?}",
            start.elapsed()
        );

        Generated { triangles, tracked }
    }
}

/// Build the search index and enumerate triangles in one go
pub fn generate(symbols: Vec<Symbol>, bases: &[String], max_triangles: usize) -> Generated {
    SymbolMap::from_symbols(symbols).find_triangles(bases, max_triangles)
}

/// Every pair ticker of every triangle is present in `tracked`
pub fn covers_all_pairs(generated: &Generated) -> bool {
    let tickers: HashSet<&str> = generated.tracked
        .iter()
        .map(|s| s.ticker.as_ref())
        .collect();
    generated.triangles.iter().all(|t| {
        derive_pairs(&t.base, &t.intermediate, &t.ticker)
            .iter()
            .all(|p| tickers.contains(p.as_ref()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::symbol;

    fn bases(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_cycle_is_found_once() {
        let symbols = vec![symbol("B", "A", 1.0, 1.0), symbol("C", "B", 1.0, 1.0), symbol("C", "A", 1.0, 1.0)];
        let generated = generate(symbols, &bases(&["A"]), 1000);

        assert_eq!(generated.triangles.len(), 1);
        let t = &generated.triangles[0];
        assert_eq!((t.base.as_ref(), t.intermediate.as_ref(), t.ticker.as_ref()), ("A", "B", "C"));
        assert_eq!(generated.tracked.len(), 3);
        assert!(covers_all_pairs(&generated));
    }

    #[test]
    fn empty_base_set_yields_nothing() {
        let symbols = vec![symbol("B", "A", 1.0, 1.0), symbol("C", "B", 1.0, 1.0), symbol("C", "A", 1.0, 1.0)];
        let generated = generate(symbols, &[], 1000);
        assert!(generated.triangles.is_empty());
        assert!(generated.tracked.is_empty());
    }

    #[test]
    fn base_without_cycle_is_not_an_error() {
        let symbols = vec![symbol("B", "A", 1.0, 1.0), symbol("C", "B", 1.0, 1.0)];
        let generated = generate(symbols, &bases(&["A", "Z"]), 1000);
        assert!(generated.triangles.is_empty());
    }

    #[test]
    fn tracked_set_covers_every_pair_across_bases() {
        let symbols = vec![
            symbol("BTC", "USDT", 50000.0, 50010.0),
            symbol("ETH", "BTC", 0.06, 0.0601),
            symbol("ETH", "USDT", 3005.0, 3006.0),
            symbol("BNB", "BTC", 0.01, 0.0101),
            symbol("BNB", "USDT", 500.0, 500.5),
            symbol("BNB", "ETH", 0.16, 0.1601),
            symbol("BTC", "USDC", 50000.0, 50010.0),
        ];
        let generated = generate(symbols, &bases(&["USDT", "BTC"]), 0);

        // USDT: BTC->ETH, BTC->BNB, ETH->BNB; BTC roots need X/BTC -> Y/X -> Y/BTC: ETH->BNB
        assert_eq!(generated.triangles.len(), 4);
        assert!(covers_all_pairs(&generated));
        assert!(generated.triangles.iter().all(|t| t.base != t.intermediate && t.intermediate != t.ticker));

        let tickers: HashSet<&str> = generated.tracked.iter().map(|s| s.ticker.as_ref()).collect();
        assert_eq!(tickers.len(), generated.tracked.len());
        assert!(!tickers.contains("BTCUSDC"));
    }

    #[test]
    fn truncation_keeps_tracked_consistent() {
        let symbols = vec![
            symbol("BTC", "USDT", 1.0, 1.0),
            symbol("ETH", "BTC", 1.0, 1.0),
            symbol("ETH", "USDT", 1.0, 1.0),
            symbol("BNB", "BTC", 1.0, 1.0),
            symbol("BNB", "USDT", 1.0, 1.0),
        ];
        let generated = generate(symbols, &bases(&["USDT"]), 1);
        assert_eq!(generated.triangles.len(), 1);
        assert_eq!(generated.tracked.len(), 3);
        assert!(covers_all_pairs(&generated));
    }

    #[test]
    fn skips_tickers_that_are_not_concatenations() {
        let mut odd = symbol("B", "A", 1.0, 1.0);
        odd.ticker = "XYZ".into();
        let map = SymbolMap::from_symbols(vec![odd]);
        assert!(map.is_empty());
    }
}
