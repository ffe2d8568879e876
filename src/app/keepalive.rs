use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{ debug, warn };

use crate::exchange::client::ExchangeClient;
use crate::market::feed::wait_for_shutdown;

const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Renew the user-data listen key every `interval` until shutdown.
///
/// Failures are only logged; the account stream drops once the key expires.
/// Returns the number of failed renewals.
pub async fn run_keepalive(
    client: Arc<dyn ExchangeClient>,
    token: String,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>
) -> usize {
    // a zero period would panic inside tokio
    let mut ticker = tokio::time::interval(interval.max(MIN_INTERVAL));
    // the first tick completes immediately and the key is fresh
    ticker.tick().await;
    let mut failures = 0usize;

    loop {
        tokio::select! {
            biased;
            _ = wait_for_shutdown(&mut shutdown) => return failures,
            _ = ticker.tick() => {}
        }

        match tokio::time::timeout(crate::API_TIMEOUT, client.renew_session_token(&token)).await {
            Ok(Ok(())) => debug!("Session token renewed"),
            Ok(Err(e)) => {
                failures += 1;
                warn!(error = %e, transient = e.is_transient(), failures, "Failed to renew session token");
            }
            Err(_) => {
                failures += 1;
                warn!(failures, "Timed out renewing session token");
            }
        }
    }
}
