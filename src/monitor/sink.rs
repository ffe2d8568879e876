// src/monitor/sink.rs
use std::sync::Arc;
use std::sync::atomic::{ AtomicU64, Ordering };
use std::time::Duration;

use tokio::sync::{ mpsc, watch };
use tokio::sync::mpsc::error::TrySendError;
use tracing::{ debug, info, warn };

use crate::market::feed::wait_for_shutdown;
use crate::models::opportunity::OpportunityRecord;

use super::jsonl_store::OpportunityStore;

/// Non-blocking producer side of the opportunity pipeline
#[derive(Clone)]
pub struct OpportunitySink {
    tx: mpsc::Sender<OpportunityRecord>,
    dropped: Arc<AtomicU64>,
}

impl OpportunitySink {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<OpportunityRecord>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx, dropped: Arc::new(AtomicU64::new(0)) }, rx)
    }

    /// Never waits; records are dropped and counted when the channel is full
    pub fn push(&self, record: OpportunityRecord) {
        match self.tx.try_send(record) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if dropped.is_power_of_two() {
                    warn!(dropped, "Opportunity channel full, dropping records");
                }
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Opportunity flusher stopped, record discarded");
            }
        }
    }

    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FlushSettings {
    pub batch_size: usize,
    pub interval: Duration,
}

fn commit<S: OpportunityStore>(store: &mut S, pending: &mut usize) -> usize {
    match store.commit() {
        Ok(count) => {
            *pending = 0;
            count
        }
        Err(err) => {
            warn!(error = %err, pending = *pending, "Failed to commit opportunities");
            0
        }
    }
}

/// Drain the channel into `store`, committing on batch size, on every interval
/// tick with pending records, and once more at shutdown. Returns the number of
/// records committed.
pub async fn run_flusher<S: OpportunityStore>(
    mut rx: mpsc::Receiver<OpportunityRecord>,
    mut store: S,
    settings: FlushSettings,
    mut shutdown: watch::Receiver<bool>
) -> usize {
    let mut interval = tokio::time::interval(settings.interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let batch_size = settings.batch_size.max(1);
    let mut pending = 0usize;
    let mut committed = 0usize;

    loop {
        tokio::select! {
            biased;
            _ = wait_for_shutdown(&mut shutdown) => break,
            maybe = rx.recv() => match maybe {
                Some(record) => {
                    store.push(record);
                    pending += 1;
                    if pending >= batch_size {
                        committed += commit(&mut store, &mut pending);
                    }
                }
                None => break,
            },
            _ = interval.tick() => {
                if pending > 0 {
                    committed += commit(&mut store, &mut pending);
                }
            }
        }
    }

    while let Ok(record) = rx.try_recv() {
        store.push(record);
        pending += 1;
    }
    committed += commit(&mut store, &mut pending);

    info!(committed, "Opportunity flusher stopped");
    committed
}
