use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use anyhow::{ anyhow, bail, Context, Result };
use tracing::{ info, warn };

use crate::{
    config::Config,
    exchange::{ client::ExchangeClient, error::ExchangeError },
    helpers::converter::{ filter_universe, to_symbols, to_wallet },
    market::store::PriceStore,
    models::symbol_map::{ generate, Generated },
    API_TIMEOUT,
};

/// A single REST call bounded by `API_TIMEOUT`
async fn fetch<T>(what: &str, call: impl Future<Output = Result<T, ExchangeError>>) -> Result<T> {
    match tokio::time::timeout(API_TIMEOUT, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(anyhow!("Failed to fetch {}: {}", what, e)),
        Err(_) => Err(anyhow!("Timed out while fetching {}", what)),
    }
}

/// Symbols, quotes and fees joined into the triangle universe
pub async fn load_triangles(client: &dyn ExchangeClient, config: &Config) -> Result<Generated> {
    let raw_symbols = fetch("symbols", client.fetch_symbols()).await?;
    let quotes = fetch("top of book", client.fetch_top_of_book()).await?;
    let fees = fetch("fee schedule", client.fetch_fee_schedule()).await?;

    info!(
        "✓ Fetched {} symbols, {} quotes and {} fee entries from {}",
        raw_symbols.len(),
        quotes.len(),
        fees.len(),
        client.name()
    );

    let symbols = to_symbols(&raw_symbols, &quotes, &fees, config.fee).context(
        "Failed to convert exchange metadata"
    )?;
    let accepted = symbols.len();
    let symbols = filter_universe(symbols, &config.universe);

    info!("✓ {} symbols validated, {} left after the universe filter", accepted, symbols.len());

    let generated = generate(symbols, &config.base_assets, config.max_triangles);
    if generated.triangles.is_empty() {
        bail!("No triangular paths found for base assets {:?}", config.base_assets);
    }

    Ok(generated)
}

pub async fn load_wallet(client: &dyn ExchangeClient) -> Result<HashMap<String, f64>> {
    let balances = fetch("balances", client.fetch_balances()).await?;
    let wallet = to_wallet(&balances).context("Failed to convert balances")?;

    if wallet.is_empty() {
        warn!("Wallet is empty, every trade sequence will abort on its first leg");
    }

    Ok(wallet)
}

/// Seed the shared store with tracked symbols and the wallet
pub fn seed_store(generated: &Generated, wallet: &HashMap<String, f64>) -> Arc<PriceStore> {
    let store = PriceStore::from_symbols(generated.tracked.iter().cloned());
    for (asset, free) in wallet {
        store.upsert_balance(asset, *free);
    }
    Arc::new(store)
}

pub fn log_sample(generated: &Generated, count: usize) {
    let sample = generated.triangles
        .iter()
        .take(count)
        .enumerate()
        .map(|(i, t)| format!("{:3}. {} → {} → {}", i + 1, t.pair1(), t.pair2(), t.pair3()))
        .collect::<Vec<_>>()
        .join("\n");

    info!(
        "Found {} triangles over {} tracked symbols. Sample paths: \n{}",
        generated.triangles.len(),
        generated.tracked.len(),
        sample
    );
}
