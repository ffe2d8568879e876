use std::sync::Arc;

use tracing::debug;

use crate::models::binance_models::AccountEvent;

use super::feed::{ FeedError, FeedHandler };
use super::store::PriceStore;

const ACCOUNT_POSITION: &str = "outboundAccountPosition";

/// Applies user-data balance snapshots to the price store
pub struct AccountHandler {
    store: Arc<PriceStore>,
}

impl AccountHandler {
    pub fn new(store: Arc<PriceStore>) -> Self {
        Self { store }
    }
}

impl FeedHandler for AccountHandler {
    fn on_text(&mut self, text: &str) -> Result<(), FeedError> {
        let event: AccountEvent = serde_json
            ::from_str(text)
            .map_err(|e| FeedError::Decode(e.to_string()))?;

        if event.event_type != ACCOUNT_POSITION {
            debug!(event = %event.event_type, "Ignoring user data event");
            return Ok(());
        }

        for balance in &event.balances {
            let free = balance.free
                .parse::<f64>()
                .map_err(|e| FeedError::Decode(format!("free '{}': {}", balance.free, e)))?;
            self.store.upsert_balance(&balance.asset, free);
        }
        Ok(())
    }
}
