use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{ Context, Result };
use tracing::{ info, warn };

use crate::{
    app::bootstrap,
    config::Config,
    exchange::{ binance::BinanceClient, client::ExchangeClient, endpoints::Endpoints },
    models::symbol_map::{ covers_all_pairs, Generated },
};

/// Triangles per base asset
pub fn count_by_base(generated: &Generated) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for triangle in &generated.triangles {
        *counts.entry(triangle.base.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Print the triangle universe and exit; no balances, no streams
pub fn run_scan(config: Config) -> Result<()> {
    let endpoints = Endpoints::new(&config.rest_url, &config.ws_url)?;
    let client: Arc<dyn ExchangeClient> = Arc::new(
        BinanceClient::new(endpoints, &config.api_key, &config.secret_key)
    );

    let rt = tokio::runtime::Builder
        ::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    let generated = rt.block_on(bootstrap::load_triangles(client.as_ref(), &config))?;

    for (base, count) in count_by_base(&generated) {
        info!("{}: {} triangles", base, count);
    }
    bootstrap::log_sample(&generated, 20);

    if !covers_all_pairs(&generated) {
        warn!("Some triangle pairs are missing from the tracked set");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::symbol_map::generate;
    use crate::testkit::symbol;

    #[test]
    fn counts_triangles_per_base() {
        let generated = generate(
            vec![
                symbol("BTC", "USDT", 50000.0, 50010.0),
                symbol("ETH", "BTC", 0.06, 0.0601),
                symbol("ETH", "USDT", 3005.0, 3006.0)
            ],
            &["USDT".to_string(), "BTC".to_string()],
            0
        );

        let counts = count_by_base(&generated);
        assert_eq!(counts.values().sum::<usize>(), generated.triangles.len());
        assert_eq!(counts.get("USDT"), Some(&1));
    }
}
