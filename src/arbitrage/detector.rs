// src/arbitrage/detector.rs

use std::sync::Arc;
use std::sync::atomic::{ AtomicUsize, Ordering };
use std::time::Duration;

use ahash::AHashMap;
use smallvec::SmallVec;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{ debug, info };

use crate::arbitrage::{ evaluator::evaluate, spread::SpreadMonitor };
use crate::enums::{ direction::Direction, fee_kind::FeeKind };
use crate::executor::sequencer::{ SequenceOutcome, TradePlan, TradeSequencer };
use crate::market::feed::wait_for_shutdown;
use crate::market::store::{ PriceStore, QuoteBook };
use crate::market::ticker::QuoteListener;
use crate::models::opportunity::{ OpportunityKind, OpportunityRecord, PricePoint };
use crate::models::triangle::Triangle;
use crate::monitor::sink::OpportunitySink;

const STATS_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
pub struct DetectorSettings {
    pub fee_kind: FeeKind,
    /// Margin above break-even, e.g. 0.001 trades above a yield of 1.001
    pub min_profit: f64,
}

#[derive(Debug, Default)]
struct DetectorStats {
    updates: AtomicUsize,
    opportunities: AtomicUsize,
    started: AtomicUsize,
    declined: AtomicUsize,
}

/// Triangle above the threshold in one direction
#[derive(Debug, Clone)]
pub struct Candidate {
    pub triangle: usize,
    pub direction: Direction,
    pub value: f64,
    pub record: OpportunityRecord,
}

/// Event-driven evaluation: every quote update re-evaluates the triangles
/// containing that ticker while the store's write lock is held, then hands the
/// best candidate to the sequencer after the lock is released.
pub struct Detector {
    triangles: Arc<[Triangle]>,
    by_ticker: AHashMap<Arc<str>, SmallVec<[usize; 8]>>,
    store: Arc<PriceStore>,
    sequencer: Arc<TradeSequencer>,
    sink: OpportunitySink,
    spread: Option<SpreadMonitor>,
    threshold: f64,
    settings: DetectorSettings,
    stats: DetectorStats,
}

impl Detector {
    pub fn new(
        triangles: Vec<Triangle>,
        store: Arc<PriceStore>,
        sequencer: Arc<TradeSequencer>,
        sink: OpportunitySink,
        spread: Option<SpreadMonitor>,
        settings: DetectorSettings
    ) -> Self {
        let mut by_ticker: AHashMap<Arc<str>, SmallVec<[usize; 8]>> = AHashMap::with_capacity(
            triangles.len() * 3
        );
        for (i, triangle) in triangles.iter().enumerate() {
            for pair in triangle.pairs() {
                by_ticker.entry(pair.clone()).or_default().push(i);
            }
        }

        Self {
            triangles: triangles.into(),
            by_ticker,
            store,
            sequencer,
            sink,
            spread,
            threshold: 1.0 + settings.min_profit,
            settings,
            stats: DetectorStats::default(),
        }
    }

    #[inline]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Candidate record: `high` is the exit leg's bid, `low` the entry leg's ask
    fn record(&self, book: &QuoteBook<'_>, triangle: &Triangle, direction: Direction, value: f64) -> OpportunityRecord {
        let (entry, exit) = match direction {
            Direction::Forward => (triangle.pair1(), triangle.pair3()),
            Direction::Reverse => (triangle.pair3(), triangle.pair1()),
        };
        let ask = book.get(entry).map_or(0.0, |s| s.ask);
        let bid = book.get(exit).map_or(0.0, |s| s.bid);
        OpportunityRecord::new(
            OpportunityKind::Candidate,
            PricePoint::new(exit, bid),
            PricePoint::new(entry, ask),
            value
        ).with_route(direction, triangle.to_string())
    }

    /// Pure evaluation over a locked snapshot; no I/O
    fn scan(&self, book: &QuoteBook<'_>, ticker: &str) -> (Vec<Candidate>, Option<OpportunityRecord>) {
        let mut candidates = Vec::new();
        if let Some(indices) = self.by_ticker.get(ticker) {
            for &index in indices {
                let triangle = &self.triangles[index];
                let Some(yields) = evaluate(book, triangle, self.settings.fee_kind) else {
                    continue;
                };
                for direction in [Direction::Forward, Direction::Reverse] {
                    let value = yields.get(direction);
                    if value > self.threshold {
                        candidates.push(Candidate {
                            triangle: index,
                            direction,
                            value,
                            record: self.record(book, triangle, direction, value),
                        });
                    }
                }
            }
        }

        let spread = self.spread.as_ref().and_then(|monitor| {
            let base = &book.get(ticker)?.base_asset;
            if monitor.watches(base) { monitor.scan(book, base) } else { None }
        });

        (candidates, spread)
    }

    /// Apply one quote update and act on what it reveals.
    ///
    /// Returns the spawned trade sequence, if one was started.
    pub fn handle_update(&self, ticker: &str, bid: f64, ask: f64) -> Option<JoinHandle<SequenceOutcome>> {
        self.stats.updates.fetch_add(1, Ordering::Relaxed);

        let (candidates, spread) = self.store.apply_and_evaluate(ticker, bid, ask, |book|
            self.scan(book, ticker)
        )?;
        // Write lock released from here on

        if let Some(record) = spread {
            debug!(high = %record.high.ticker, low = %record.low.ticker, value = record.value, "Spread detected");
            self.sink.push(record);
        }

        if candidates.is_empty() {
            return None;
        }
        self.stats.opportunities.fetch_add(candidates.len(), Ordering::Relaxed);

        let best = candidates
            .iter()
            .max_by(|a, b| a.value.total_cmp(&b.value))
            .cloned()?;
        for candidate in candidates {
            self.sink.push(candidate.record);
        }

        let Some(permit) = self.sequencer.try_begin() else {
            self.stats.declined.fetch_add(1, Ordering::Relaxed);
            debug!(ticker, value = best.value, "Sequencer busy, opportunity declined");
            return None;
        };
        self.stats.started.fetch_add(1, Ordering::Relaxed);

        let triangle = self.triangles[best.triangle].clone();
        info!(
            path = %triangle,
            direction = %best.direction,
            value = best.value,
            "Profitable triangle found"
        );

        let plan = TradePlan {
            triangle,
            direction: best.direction,
            expected: best.value,
            record: best.record,
        };
        Some(tokio::spawn(permit.execute(plan)))
    }

    /// Log and reset the counters every minute until shutdown
    pub async fn run_stats_task(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(STATS_INTERVAL);
        interval.tick().await;

        loop {
            tokio::select! {
                _ = wait_for_shutdown(&mut shutdown) => return,
                _ = interval.tick() => {}
            }

            let updates = self.stats.updates.swap(0, Ordering::Relaxed);
            let opportunities = self.stats.opportunities.swap(0, Ordering::Relaxed);
            let started = self.stats.started.swap(0, Ordering::Relaxed);
            let declined = self.stats.declined.swap(0, Ordering::Relaxed);

            info!(
                "Arbitrage stats: {} updates processed, {} opportunities found, {} sequences started, {} declined, {} records dropped",
                updates,
                opportunities,
                started,
                declined,
                self.sink.dropped()
            );
        }
    }
}

impl QuoteListener for Detector {
    #[inline]
    fn on_quote(&self, ticker: &str, bid: f64, ask: f64) {
        self.handle_update(ticker, bid, ask);
    }
}
