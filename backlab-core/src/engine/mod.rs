//! Execution engine — the bar-by-bar orchestrating loop.
//!
//! Per timestamp group, per symbol:
//! 1. Advance open positions through the position manager
//! 2. Consult risk admission; denied symbols skip the entry step
//! 3. Query the strategy with history up to and including the current bar
//! 4. Size and open a new position on a valid directional signal
//!
//! After all symbols of a timestamp are processed, one equity point is
//! appended. Positions still open after the final timestamp are force-closed
//! at their symbol's last bar close.
//!
//! Everything is single-threaded and deterministic: state is owned
//! exclusively by the run, and all randomness flows from the configured seed
//! through per-symbol sub-generators.

pub mod equity;

pub use equity::EquityTracker;

use crate::config::EngineConfig;
use crate::costs::{CostModel, Leg, VolatilityTracker};
use crate::domain::{Bar, Direction, EquityPoint, IdGen, Position, PositionSide};
use crate::error::{ConfigError, EngineError};
use crate::feed::MarketData;
use crate::fingerprint::RunFingerprint;
use crate::manager::PositionManager;
use crate::risk::RiskController;
use crate::rng::RunRng;
use crate::strategy::Strategy;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Run-level counters for conditions that never abort a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Entry opportunities skipped while a daily-loss or drawdown halt was
    /// active.
    pub signals_skipped_risk_halt: u64,
    /// Entry opportunities denied by concurrency or per-symbol limits.
    pub entries_denied_caps: u64,
    /// Signals dropped because sizing rejected or errored.
    pub signals_skipped_sizing: u64,
    /// Signals dropped for violating the level-ordering invariant.
    pub strategy_faults: u64,
    pub positions_opened: u64,
    /// True when the caller aborted the run between bars.
    pub aborted: bool,
}

/// Everything a run exposes to downstream consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Every position in its final `Closed` state, in close order.
    pub trades: Vec<Position>,
    /// One point per processed timestamp.
    pub equity_curve: Vec<EquityPoint>,
    pub summary: RunSummary,
    pub final_equity: f64,
    /// Number of timestamp groups processed.
    pub bar_count: usize,
    pub fingerprint: RunFingerprint,
}

/// One engine instance per configuration; each `run` owns its state
/// exclusively for the duration of the run.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
}

/// Mutable state of one run.
struct RunState {
    risk: RiskController,
    manager: PositionManager,
    cost_model: CostModel,
    id_gen: IdGen,
    equity: EquityTracker,
    open: Vec<Position>,
    closed: Vec<Position>,
    history: HashMap<String, Vec<Bar>>,
    vol: HashMap<String, VolatilityTracker>,
    rngs: HashMap<String, StdRng>,
    summary: RunSummary,
}

impl RunState {
    fn new(config: &EngineConfig) -> Self {
        Self {
            risk: RiskController::from_config(config),
            manager: PositionManager::from_config(config),
            cost_model: CostModel::from_config(config),
            id_gen: IdGen::default(),
            equity: EquityTracker::new(),
            open: Vec::new(),
            closed: Vec::new(),
            history: HashMap::new(),
            vol: HashMap::new(),
            rngs: HashMap::new(),
            summary: RunSummary::default(),
        }
    }
}

impl Engine {
    /// Validate the configuration and build an engine. The run never starts
    /// with an invalid config.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run a full backtest.
    pub fn run(
        &self,
        data: &MarketData,
        strategy: &mut dyn Strategy,
    ) -> Result<RunResult, EngineError> {
        self.run_inner(data, strategy, None)
    }

    /// Run a backtest that the caller may abort between bars. An aborted run
    /// force-closes its open positions at the last processed bar; no
    /// partial-bar state is ever exposed.
    pub fn run_with_abort(
        &self,
        data: &MarketData,
        strategy: &mut dyn Strategy,
        abort: &AtomicBool,
    ) -> Result<RunResult, EngineError> {
        self.run_inner(data, strategy, Some(abort))
    }

    fn run_inner(
        &self,
        data: &MarketData,
        strategy: &mut dyn Strategy,
        abort: Option<&AtomicBool>,
    ) -> Result<RunResult, EngineError> {
        let fingerprint = RunFingerprint::of(&self.config);
        let run_rng = RunRng::new(self.config.random_seed);
        let mut st = RunState::new(&self.config);
        let total = data.num_timestamps();

        tracing::info!(
            %fingerprint,
            timestamps = total,
            symbols = data.symbols().len(),
            strategy = strategy.name(),
            "starting backtest run"
        );

        let mut processed = 0;
        for (idx, (ts, bars)) in data.groups().enumerate() {
            if let Some(flag) = abort {
                if flag.load(Ordering::Relaxed) {
                    st.summary.aborted = true;
                    break;
                }
            }

            st.risk.on_bar_open(*ts);
            for bar in bars {
                self.process_bar(&mut st, strategy, &run_rng, ts, bar)?;
            }

            // End-of-data closure happens before the final equity sample so
            // the last point reflects the booked exits.
            if idx + 1 == total {
                finalize_open_positions(&mut st, &run_rng)?;
            }

            let equity = mark_to_market(&st);
            let drawdown = st.risk.on_equity(equity);
            st.equity.push(*ts, equity, drawdown);
            processed += 1;
        }

        if st.summary.aborted {
            finalize_open_positions(&mut st, &run_rng)?;
        }

        debug_assert!(st.open.is_empty());
        debug_assert!(st.closed.iter().all(|p| !p.is_open()));

        let final_equity = st.risk.capital();
        tracing::info!(
            final_equity,
            trades = st.closed.len(),
            bars = processed,
            "backtest run finished"
        );

        Ok(RunResult {
            trades: st.closed,
            equity_curve: st.equity.into_points(),
            summary: st.summary,
            final_equity,
            bar_count: processed,
            fingerprint,
        })
    }

    fn process_bar(
        &self,
        st: &mut RunState,
        strategy: &mut dyn Strategy,
        run_rng: &RunRng,
        ts: &DateTime<Utc>,
        bar: &Bar,
    ) -> Result<(), EngineError> {
        let symbol = bar.symbol.as_str();
        st.history
            .entry(symbol.to_string())
            .or_default()
            .push(bar.clone());
        let vol = st
            .vol
            .entry(symbol.to_string())
            .or_insert_with(|| VolatilityTracker::new(self.config.volatility_lookback));
        vol.observe_close(bar.close);
        let vol_ratio = vol.ratio();

        // Phase 1: advance open positions for this symbol.
        let mut events = Vec::new();
        {
            let rng = st
                .rngs
                .entry(symbol.to_string())
                .or_insert_with(|| run_rng.rng_for(symbol));
            for pos in st.open.iter_mut().filter(|p| p.symbol == bar.symbol) {
                events.extend(st.manager.advance(pos, bar, vol_ratio, rng)?);
            }
        }
        for ev in &events {
            st.risk.record_realized(ev.realized_pnl);
            st.risk
                .register_close(&ev.symbol, ev.quantity * ev.entry_price, ev.fully_closed);
        }
        sweep_closed(&mut st.open, &mut st.closed);

        // Phase 2: admission gate.
        if let Err(reason) = st.risk.admit(symbol) {
            match reason {
                crate::risk::DenyReason::DailyLossHalt | crate::risk::DenyReason::DrawdownHalt => {
                    st.summary.signals_skipped_risk_halt += 1;
                }
                _ => st.summary.entries_denied_caps += 1,
            }
            tracing::trace!(symbol, %reason, "entry step skipped");
            return Ok(());
        }

        // Phase 3: query the strategy.
        let hist = &st.history[symbol];
        let signal = match strategy.evaluate(hist) {
            Some(s) if !s.is_hold() => s,
            _ => return Ok(()),
        };
        if !signal.validate() {
            st.summary.strategy_faults += 1;
            tracing::debug!(symbol, "malformed strategy signal treated as hold");
            return Ok(());
        }

        // Phase 4: size and open.
        let existing = st.risk.symbol_exposure(symbol);
        let sizing = match crate::sizing::size_entry(
            st.risk.capital(),
            &signal,
            hist,
            existing,
            &self.config,
        ) {
            Ok(Some(sizing)) => sizing,
            Ok(None) | Err(_) => {
                st.summary.signals_skipped_sizing += 1;
                return Ok(());
            }
        };

        let side = match signal.direction {
            Direction::Buy => PositionSide::Long,
            Direction::Sell => PositionSide::Short,
            Direction::Hold => unreachable!("hold filtered above"),
        };
        let mut tags = signal.tags.clone();
        if let Some(extra) = strategy.tags(hist) {
            tags.extend(extra);
        }

        let rng = st
            .rngs
            .entry(symbol.to_string())
            .or_insert_with(|| run_rng.rng_for(symbol));
        let quote = st
            .cost_model
            .fill(
                side.entry_side(),
                signal.entry_price,
                sizing.size,
                vol_ratio,
                Leg::Entry,
                rng,
            )
            .map_err(|e| EngineError::InvariantViolation {
                detail: format!("cost model rejected entry fill: {e}"),
                timestamp: *ts,
            })?;

        let position = Position::open(
            st.id_gen.next_position_id(),
            symbol,
            side,
            quote.effective_price,
            sizing.size,
            signal.stop_loss,
            signal.take_profit_1,
            signal.take_profit_2,
            *ts,
            quote.fee,
            quote.price_impact * sizing.size,
            tags,
        );

        // Entry fee is realized money out; book it against capital now.
        st.risk.record_realized(-quote.fee);
        st.risk
            .register_open(symbol, quote.effective_price * sizing.size);
        if st.risk.over_concurrency_limit() {
            return Err(EngineError::InvariantViolation {
                detail: "concurrency limit exceeded after admitted entry".into(),
                timestamp: *ts,
            });
        }
        st.open.push(position);
        st.summary.positions_opened += 1;
        Ok(())
    }
}

/// Move fully-closed positions into the trade log, preserving order.
fn sweep_closed(open: &mut Vec<Position>, closed: &mut Vec<Position>) {
    let mut i = 0;
    while i < open.len() {
        if !open[i].is_open() {
            closed.push(open.remove(i));
        } else {
            i += 1;
        }
    }
}

/// Realized capital plus unrealized mark-to-market of open positions at
/// their symbols' latest closes.
fn mark_to_market(st: &RunState) -> f64 {
    let unrealized: f64 = st
        .open
        .iter()
        .map(|p| {
            let last_close = st
                .history
                .get(&p.symbol)
                .and_then(|h| h.last())
                .map(|b| b.close)
                .unwrap_or(p.entry_price);
            p.unrealized_pnl(last_close)
        })
        .sum();
    st.risk.capital() + unrealized
}

/// Force-close every open position at its symbol's last seen bar.
fn finalize_open_positions(st: &mut RunState, run_rng: &RunRng) -> Result<(), EngineError> {
    while !st.open.is_empty() {
        let mut pos = st.open.remove(0);
        let bar = st
            .history
            .get(&pos.symbol)
            .and_then(|h| h.last())
            .cloned()
            .ok_or_else(|| EngineError::InvariantViolation {
                detail: format!("open position without history: {}", pos.symbol),
                timestamp: pos.open_time,
            })?;
        let vol_ratio = st.vol.get(&pos.symbol).map(|v| v.ratio()).unwrap_or(1.0);
        let ev = {
            let rng = st
                .rngs
                .entry(pos.symbol.clone())
                .or_insert_with(|| run_rng.rng_for(&pos.symbol));
            st.manager.force_close(&mut pos, &bar, vol_ratio, rng)?
        };
        st.risk.record_realized(ev.realized_pnl);
        st.risk
            .register_close(&ev.symbol, ev.quantity * ev.entry_price, true);
        st.closed.push(pos);
    }
    Ok(())
}
