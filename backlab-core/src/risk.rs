//! Risk controller — portfolio-level limits and entry admission.
//!
//! One controller per run, owning the run's `RiskState` exclusively. Two
//! halts gate new entries:
//! - **Daily loss halt**: trips when the day's realized PnL reaches
//!   `-max_daily_loss_pct * capital_at_day_start`; clears at the next UTC
//!   day boundary.
//! - **Drawdown halt**: trips when equity falls `max_drawdown_pct` below its
//!   running peak; permanent for the remainder of the run.
//!
//! Halts never touch open positions — they only deny admission for new ones.
//! Denial is data (a `DenyReason`), not an error.

use crate::config::{EngineConfig, PositionMode};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// Why an entry was denied admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    DailyLossHalt,
    DrawdownHalt,
    MaxConcurrentTrades,
    MaxPositionsForSymbol,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DenyReason::DailyLossHalt => "daily loss halt",
            DenyReason::DrawdownHalt => "drawdown halt",
            DenyReason::MaxConcurrentTrades => "max concurrent trades",
            DenyReason::MaxPositionsForSymbol => "max positions for symbol",
        };
        write!(f, "{name}")
    }
}

/// Run-wide risk state. Owned by the controller; exposed read-only.
#[derive(Debug, Clone)]
pub struct RiskState {
    /// Realized capital: initial capital plus accumulated realized PnL.
    pub capital: f64,
    pub capital_at_day_start: f64,
    pub peak_equity: f64,
    pub current_drawdown_pct: f64,
    pub trading_day: Option<NaiveDate>,
    pub daily_pnl: f64,
    /// Resets at the next day boundary.
    pub daily_halt: bool,
    /// Permanent once set.
    pub drawdown_halt: bool,
    pub open_position_count: usize,
    pub per_symbol_open: BTreeMap<String, usize>,
    /// Entry-priced notional per symbol.
    pub per_symbol_exposure: BTreeMap<String, f64>,
}

/// Stateful risk gate for one run.
#[derive(Debug)]
pub struct RiskController {
    state: RiskState,
    max_daily_loss_pct: f64,
    max_drawdown_pct: f64,
    max_concurrent_trades: usize,
    max_positions_per_symbol: usize,
    position_mode: PositionMode,
}

impl RiskController {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            state: RiskState {
                capital: config.initial_capital,
                capital_at_day_start: config.initial_capital,
                peak_equity: config.initial_capital,
                current_drawdown_pct: 0.0,
                trading_day: None,
                daily_pnl: 0.0,
                daily_halt: false,
                drawdown_halt: false,
                open_position_count: 0,
                per_symbol_open: BTreeMap::new(),
                per_symbol_exposure: BTreeMap::new(),
            },
            max_daily_loss_pct: config.max_daily_loss_pct,
            max_drawdown_pct: config.max_drawdown_pct,
            max_concurrent_trades: config.max_concurrent_trades,
            max_positions_per_symbol: config.max_positions_per_symbol,
            position_mode: config.position_mode,
        }
    }

    pub fn state(&self) -> &RiskState {
        &self.state
    }

    pub fn capital(&self) -> f64 {
        self.state.capital
    }

    pub fn symbol_exposure(&self, symbol: &str) -> f64 {
        self.state
            .per_symbol_exposure
            .get(symbol)
            .copied()
            .unwrap_or(0.0)
    }

    /// Advance the calendar. On the first bar of a new UTC day, daily PnL and
    /// the daily halt reset; the drawdown halt does not.
    pub fn on_bar_open(&mut self, timestamp: DateTime<Utc>) {
        let day = timestamp.date_naive();
        if self.state.trading_day != Some(day) {
            self.state.trading_day = Some(day);
            self.state.daily_pnl = 0.0;
            self.state.daily_halt = false;
            self.state.capital_at_day_start = self.state.capital;
        }
    }

    /// Book a realized fill (net of fees) and re-check the daily loss cap.
    pub fn record_realized(&mut self, pnl: f64) {
        self.state.capital += pnl;
        self.state.daily_pnl += pnl;
        let limit = -self.max_daily_loss_pct * self.state.capital_at_day_start;
        if !self.state.daily_halt && self.state.daily_pnl <= limit {
            self.state.daily_halt = true;
            tracing::warn!(
                daily_pnl = self.state.daily_pnl,
                limit,
                "daily loss cap reached, halting new entries until next day"
            );
        }
    }

    /// Update peak/drawdown from the latest equity sample. Returns the
    /// current drawdown fraction.
    pub fn on_equity(&mut self, equity: f64) -> f64 {
        if equity > self.state.peak_equity {
            self.state.peak_equity = equity;
        }
        let drawdown = if self.state.peak_equity > 0.0 {
            (self.state.peak_equity - equity) / self.state.peak_equity
        } else {
            0.0
        };
        self.state.current_drawdown_pct = drawdown;
        if !self.state.drawdown_halt && drawdown >= self.max_drawdown_pct {
            self.state.drawdown_halt = true;
            tracing::warn!(
                drawdown_pct = drawdown,
                "max drawdown reached, no further entries this run"
            );
        }
        drawdown
    }

    /// Admission check for a candidate entry on `symbol`.
    pub fn admit(&self, symbol: &str) -> Result<(), DenyReason> {
        if self.state.drawdown_halt {
            return Err(DenyReason::DrawdownHalt);
        }
        if self.state.daily_halt {
            return Err(DenyReason::DailyLossHalt);
        }
        if self.state.open_position_count >= self.max_concurrent_trades {
            return Err(DenyReason::MaxConcurrentTrades);
        }
        let symbol_limit = match self.position_mode {
            PositionMode::Netting => 1,
            PositionMode::Hedging => self.max_positions_per_symbol,
        };
        let open_here = self
            .state
            .per_symbol_open
            .get(symbol)
            .copied()
            .unwrap_or(0);
        if open_here >= symbol_limit {
            return Err(DenyReason::MaxPositionsForSymbol);
        }
        Ok(())
    }

    /// Register a freshly opened position.
    pub fn register_open(&mut self, symbol: &str, entry_notional: f64) {
        self.state.open_position_count += 1;
        *self
            .state
            .per_symbol_open
            .entry(symbol.to_string())
            .or_default() += 1;
        *self
            .state
            .per_symbol_exposure
            .entry(symbol.to_string())
            .or_default() += entry_notional;
    }

    /// Release exposure for a (partial or full) close; decrement counters on
    /// full closure.
    pub fn register_close(&mut self, symbol: &str, released_notional: f64, fully_closed: bool) {
        if let Some(exposure) = self.state.per_symbol_exposure.get_mut(symbol) {
            *exposure = (*exposure - released_notional).max(0.0);
        }
        if fully_closed {
            self.state.open_position_count = self.state.open_position_count.saturating_sub(1);
            if let Some(count) = self.state.per_symbol_open.get_mut(symbol) {
                *count = count.saturating_sub(1);
            }
        }
    }

    /// True when the engine may not open positions past this count — used by
    /// the engine's post-open invariant check.
    pub fn over_concurrency_limit(&self) -> bool {
        self.state.open_position_count > self.max_concurrent_trades
    }
}
