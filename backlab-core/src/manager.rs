//! Position manager — the per-bar lifecycle state machine.
//!
//! For each open position the manager checks whether the bar's `[low, high]`
//! range touches the stop and/or the active take-profit, resolves a same-bar
//! conflict via the configured execution priority, and books the resulting
//! transition through the cost model:
//!
//! - stop touch while `Open`: full close, `StopLoss`
//! - TP1 touch while `Open`: partial close, stop moves to breakeven
//! - breakeven stop touch while `PartiallyClosed`: close remainder
//! - TP2 touch while `PartiallyClosed`: close remainder
//! - final bar with the position still open: force close at the bar close
//!
//! At most one transition fires per position per bar: after a TP1 partial
//! fill, the breakeven stop arms on the next bar. The true intrabar sequence
//! is unknowable from OHLC, and a same-bar fill-then-stop-out would invent
//! one.
//!
//! Gap rule: when the bar opens beyond a touched level, the fill references
//! the open instead of the level — a level the bar never traded through at
//! its own price cannot fill there.

use crate::config::{EngineConfig, ExecutionPriority};
use crate::costs::{CostModel, Leg};
use crate::domain::{Bar, ExitReason, Position, PositionId, PositionStatus};
use crate::error::EngineError;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// What kind of close a [`CloseEvent`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseKind {
    StopLoss,
    PartialTakeProfit,
    BreakevenStop,
    TakeProfit2,
    EndOfData,
}

/// A booked (partial or full) close, emitted for the risk controller and the
/// audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseEvent {
    pub position_id: PositionId,
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub quantity: f64,
    /// Effective fill price, post-cost.
    pub price: f64,
    /// Entry price of the position, for exposure release.
    pub entry_price: f64,
    pub fee: f64,
    pub slippage: f64,
    /// Net of fee.
    pub realized_pnl: f64,
    pub kind: CloseKind,
    /// True when the position reached `Closed` with this event.
    pub fully_closed: bool,
}

/// Which level(s) a bar touched for a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Touch {
    None,
    Stop,
    Target,
    Both,
}

/// Stateless lifecycle driver; all mutable state lives in the positions.
#[derive(Debug)]
pub struct PositionManager {
    cost_model: CostModel,
    priority: ExecutionPriority,
    partial_close_fraction: f64,
}

impl PositionManager {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            cost_model: CostModel::from_config(config),
            priority: config.execution_priority,
            partial_close_fraction: config.partial_close_fraction,
        }
    }

    /// Advance one open position through one bar. Returns the close events
    /// booked (empty when nothing was touched).
    pub fn advance(
        &self,
        position: &mut Position,
        bar: &Bar,
        vol_ratio: f64,
        rng: &mut StdRng,
    ) -> Result<Vec<CloseEvent>, EngineError> {
        if !position.is_open() {
            return Ok(Vec::new());
        }
        debug_assert_eq!(position.symbol, bar.symbol);

        let (target, partial) = match position.status {
            PositionStatus::Open => (position.take_profit_1, true),
            PositionStatus::PartiallyClosed => (position.take_profit_2, false),
            PositionStatus::Closed => unreachable!("guarded by is_open"),
        };

        match self.touch(position, bar, target) {
            Touch::None => Ok(Vec::new()),
            Touch::Stop => self.fill_stop(position, bar, vol_ratio, rng).map(|e| vec![e]),
            Touch::Target => self
                .fill_target(position, bar, target, partial, vol_ratio, rng)
                .map(|e| vec![e]),
            Touch::Both => match self.priority {
                // Entry registers the stop before the target, so FIFO
                // resolves identically to stop-first.
                ExecutionPriority::StopLossFirst | ExecutionPriority::Fifo => {
                    self.fill_stop(position, bar, vol_ratio, rng).map(|e| vec![e])
                }
                ExecutionPriority::TakeProfitFirst => self
                    .fill_target(position, bar, target, partial, vol_ratio, rng)
                    .map(|e| vec![e]),
            },
        }
    }

    /// Force-close at the bar's close price (end of data, or run abort).
    pub fn force_close(
        &self,
        position: &mut Position,
        bar: &Bar,
        vol_ratio: f64,
        rng: &mut StdRng,
    ) -> Result<CloseEvent, EngineError> {
        self.close_full(
            position,
            bar.close,
            bar.timestamp,
            ExitReason::EndOfData,
            CloseKind::EndOfData,
            vol_ratio,
            rng,
        )
    }

    fn touch(&self, position: &Position, bar: &Bar, target: f64) -> Touch {
        use crate::domain::PositionSide::*;
        let (stop_hit, target_hit) = match position.side {
            Long => (bar.low <= position.stop_loss, bar.high >= target),
            Short => (bar.high >= position.stop_loss, bar.low <= target),
        };
        match (stop_hit, target_hit) {
            (true, true) => Touch::Both,
            (true, false) => Touch::Stop,
            (false, true) => Touch::Target,
            (false, false) => Touch::None,
        }
    }

    /// Fill reference price for a touched level, adverse-adjusted for gaps.
    fn reference_price(&self, position: &Position, bar: &Bar, level: f64, is_stop: bool) -> f64 {
        use crate::domain::PositionSide::*;
        // A long stop fills below, a long target above; mirrored for shorts.
        let gapped = match (position.side, is_stop) {
            (Long, true) => bar.open <= level,
            (Long, false) => bar.open >= level,
            (Short, true) => bar.open >= level,
            (Short, false) => bar.open <= level,
        };
        if gapped {
            bar.open
        } else {
            level
        }
    }

    fn fill_stop(
        &self,
        position: &mut Position,
        bar: &Bar,
        vol_ratio: f64,
        rng: &mut StdRng,
    ) -> Result<CloseEvent, EngineError> {
        let price = self.reference_price(position, bar, position.stop_loss, true);
        let (reason, kind) = match position.status {
            PositionStatus::Open => (ExitReason::StopLoss, CloseKind::StopLoss),
            PositionStatus::PartiallyClosed => {
                (ExitReason::StopLossBreakeven, CloseKind::BreakevenStop)
            }
            PositionStatus::Closed => unreachable!("guarded by is_open"),
        };
        self.close_full(position, price, bar.timestamp, reason, kind, vol_ratio, rng)
    }

    fn fill_target(
        &self,
        position: &mut Position,
        bar: &Bar,
        target: f64,
        partial: bool,
        vol_ratio: f64,
        rng: &mut StdRng,
    ) -> Result<CloseEvent, EngineError> {
        let price = self.reference_price(position, bar, target, false);
        if partial {
            let quantity = position.size * self.partial_close_fraction;
            let quote = self
                .cost_model
                .fill(
                    position.side.exit_side(),
                    price,
                    quantity,
                    vol_ratio,
                    Leg::Exit,
                    rng,
                )
                .map_err(|e| EngineError::InvariantViolation {
                    detail: format!("cost model rejected TP1 fill: {e}"),
                    timestamp: bar.timestamp,
                })?;
            let slippage = quote.price_impact * quantity;
            let realized =
                position.take_partial_profit(quantity, quote.effective_price, quote.fee, slippage);
            Ok(CloseEvent {
                position_id: position.id,
                symbol: position.symbol.clone(),
                timestamp: bar.timestamp,
                quantity,
                price: quote.effective_price,
                entry_price: position.entry_price,
                fee: quote.fee,
                slippage,
                realized_pnl: realized,
                kind: CloseKind::PartialTakeProfit,
                fully_closed: false,
            })
        } else {
            self.close_full(
                position,
                price,
                bar.timestamp,
                ExitReason::TakeProfit2,
                CloseKind::TakeProfit2,
                vol_ratio,
                rng,
            )
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn close_full(
        &self,
        position: &mut Position,
        price: f64,
        timestamp: DateTime<Utc>,
        reason: ExitReason,
        kind: CloseKind,
        vol_ratio: f64,
        rng: &mut StdRng,
    ) -> Result<CloseEvent, EngineError> {
        let quantity = position.size;
        let quote = self
            .cost_model
            .fill(
                position.side.exit_side(),
                price,
                quantity,
                vol_ratio,
                Leg::Exit,
                rng,
            )
            .map_err(|e| EngineError::InvariantViolation {
                detail: format!("cost model rejected close fill: {e}"),
                timestamp,
            })?;
        let slippage = quote.price_impact * quantity;
        let realized =
            position.close_all(quote.effective_price, quote.fee, slippage, reason, timestamp);
        Ok(CloseEvent {
            position_id: position.id,
            symbol: position.symbol.clone(),
            timestamp,
            quantity,
            price: quote.effective_price,
            entry_price: position.entry_price,
            fee: quote.fee,
            slippage,
            realized_pnl: realized,
            kind,
            fully_closed: true,
        })
    }
}
