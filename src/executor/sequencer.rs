// src/executor/sequencer.rs

use std::sync::Arc;
use std::sync::atomic::{ AtomicU8, Ordering };
use std::time::{ Duration, Instant };

use tracing::{ debug, error, info, warn };

use crate::enums::{ direction::Direction, fee_kind::FeeKind, side::OrderSide };
use crate::exchange::client::{ ExchangeClient, OrderAmount };
use crate::helpers::precision::order_quantity;
use crate::market::store::PriceStore;
use crate::models::opportunity::{ OpportunityKind, OpportunityRecord };
use crate::models::triangle::Triangle;
use crate::monitor::sink::OpportunitySink;

const IDLE: u8 = 0;
const TRADING: u8 = 1;
const COOLDOWN: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Trading,
    Cooldown,
}

#[derive(Debug, Clone, Copy)]
pub struct SequencerSettings {
    pub fee_kind: FeeKind,
    /// Cap on the first leg's spend, 0 = whole balance
    pub trade_amount: f64,
    pub cooldown: Duration,
}

/// A profitable triangle chosen for execution
#[derive(Debug, Clone)]
pub struct TradePlan {
    pub triangle: Triangle,
    pub direction: Direction,
    pub expected: f64,
    /// Candidate record re-emitted as executed or aborted
    pub record: OpportunityRecord,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegFill {
    pub ticker: Arc<str>,
    pub side: OrderSide,
    pub order_id: u64,
    pub spent: f64,
    /// Net of the leg's fee
    pub received: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SequenceOutcome {
    Completed {
        fills: Vec<LegFill>,
        /// Final received amount over first spent amount, both in the base asset
        realized: f64,
    },
    /// Remaining legs were skipped; filled legs are not unwound
    Aborted {
        leg: usize,
        fills: Vec<LegFill>,
        reason: String,
    },
}

/// Places the three legs of a triangle, one sequence at a time system-wide.
///
/// The phase flag is independent from the price store lock and is only held
/// through a [`TradePermit`].
pub struct TradeSequencer {
    phase: AtomicU8,
    client: Arc<dyn ExchangeClient>,
    store: Arc<PriceStore>,
    sink: OpportunitySink,
    settings: SequencerSettings,
}

/// Exclusive right to run one sequence. Dropping it returns the sequencer to idle.
pub struct TradePermit {
    sequencer: Arc<TradeSequencer>,
}

impl Drop for TradePermit {
    fn drop(&mut self) {
        self.sequencer.phase.store(IDLE, Ordering::Release);
        debug!("Trade sequencer idle");
    }
}

impl TradeSequencer {
    pub fn new(
        client: Arc<dyn ExchangeClient>,
        store: Arc<PriceStore>,
        sink: OpportunitySink,
        settings: SequencerSettings
    ) -> Self {
        Self { phase: AtomicU8::new(IDLE), client, store, sink, settings }
    }

    pub fn phase(&self) -> Phase {
        match self.phase.load(Ordering::Acquire) {
            TRADING => Phase::Trading,
            COOLDOWN => Phase::Cooldown,
            _ => Phase::Idle,
        }
    }

    /// Claim the sequencer if idle; None while trading or cooling down
    pub fn try_begin(self: &Arc<Self>) -> Option<TradePermit> {
        self.phase
            .compare_exchange(IDLE, TRADING, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| TradePermit { sequencer: self.clone() })
    }

    async fn run_legs(&self, plan: &TradePlan) -> SequenceOutcome {
        let legs = plan.triangle.legs(plan.direction);
        let mut fills: Vec<LegFill> = Vec::with_capacity(3);

        for (leg, (ticker, side)) in legs.into_iter().enumerate() {
            let abort = |fills: Vec<LegFill>, reason: String| SequenceOutcome::Aborted {
                leg,
                fills,
                reason,
            };

            let Some(symbol) = self.store.read_quote(&ticker) else {
                return abort(fills, format!("unknown symbol {}", ticker));
            };
            let spent_asset = symbol.spent_asset(side).clone();
            let received_asset = symbol.received_asset(side).clone();
            let precision = symbol.order_precision(side);

            let mut available = self.store.read_balance(&spent_asset);
            match fills.last() {
                // Later legs only move what the previous leg delivered
                Some(previous) => {
                    available = available.min(previous.received);
                }
                None if self.settings.trade_amount > 0.0 => {
                    available = available.min(self.settings.trade_amount);
                }
                None => {}
            }
            let (qty, precision) = order_quantity(available, precision);
            if qty <= 0.0 {
                return abort(fills, format!("no {} balance to spend", spent_asset));
            }

            let amount = if side.spends_quote() {
                OrderAmount::Quote { qty, precision }
            } else {
                OrderAmount::Base { qty, precision }
            };

            debug!(leg = leg + 1, %ticker, %side, qty, asset = %spent_asset, "Placing market order");

            let fill = match self.client.place_market_order(&ticker, side, amount).await {
                Ok(fill) => fill,
                Err(err) => {
                    return abort(fills, format!("{} {} failed: {}", side, ticker, err));
                }
            };

            let spent = fill.spent(side);
            let received = fill.received(side) * (1.0 - symbol.fee(self.settings.fee_kind));

            // Provisional balances so the next leg does not wait for the account stream
            let remaining = (self.store.read_balance(&spent_asset) - spent).max(0.0);
            self.store.upsert_balance(&spent_asset, remaining);
            let credited = self.store.read_balance(&received_asset) + received;
            self.store.upsert_balance(&received_asset, credited);

            info!(
                leg = leg + 1,
                %ticker,
                %side,
                order_id = fill.order_id,
                spent,
                received,
                "Leg filled"
            );

            fills.push(LegFill { ticker, side, order_id: fill.order_id, spent, received });
        }

        let realized = match (fills.first(), fills.last()) {
            (Some(first), Some(last)) if first.spent > 0.0 => last.received / first.spent,
            _ => 0.0,
        };
        SequenceOutcome::Completed { fills, realized }
    }
}

impl TradePermit {
    #[inline]
    pub fn sequencer(&self) -> &Arc<TradeSequencer> {
        &self.sequencer
    }

    /// Run the legs, record the outcome, then hold the guard for the cooldown
    pub async fn execute(self, plan: TradePlan) -> SequenceOutcome {
        let sequencer = self.sequencer.clone();
        let start = Instant::now();

        info!(
            path = %plan.triangle,
            direction = %plan.direction,
            expected = plan.expected,
            "Starting trade sequence"
        );

        let outcome = sequencer.run_legs(&plan).await;

        let mut record = plan.record.clone();
        match &outcome {
            SequenceOutcome::Completed { realized, .. } => {
                info!(
                    path = %plan.triangle,
                    direction = %plan.direction,
                    expected = plan.expected,
                    realized,
                    "Trade sequence completed in {:?}",
                    start.elapsed()
                );
                record.kind = OpportunityKind::Executed;
                record.value = *realized;
            }
            SequenceOutcome::Aborted { leg, fills, reason } => {
                if fills.is_empty() {
                    warn!(path = %plan.triangle, leg = leg + 1, %reason, "Trade sequence aborted");
                } else {
                    error!(
                        path = %plan.triangle,
                        leg = leg + 1,
                        filled = fills.len(),
                        %reason,
                        "Trade sequence aborted after partial execution"
                    );
                }
                record.kind = OpportunityKind::Aborted;
            }
        }
        sequencer.sink.push(record);

        sequencer.phase.store(COOLDOWN, Ordering::Release);
        tokio::time::sleep(sequencer.settings.cooldown).await;

        outcome
    }
}
