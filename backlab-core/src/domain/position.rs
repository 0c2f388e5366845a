//! Position — the lifecycle record of one trade.
//!
//! A position is mutated only through its transition methods
//! (`take_partial_profit`, `close_all`), which enforce the lifecycle
//! invariants in one place: size never grows, the stop tightens to breakeven
//! exactly once, and a closed position has zero size. Callers book fills
//! through these methods; free-form field mutation is not part of the API.

use super::ids::PositionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Side of a fill as seen by the market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Direction of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    /// +1 for long, -1 for short. PnL = `sign * (price - entry) * qty`.
    pub fn sign(self) -> f64 {
        match self {
            PositionSide::Long => 1.0,
            PositionSide::Short => -1.0,
        }
    }

    /// The order side that opens a position of this direction.
    pub fn entry_side(self) -> OrderSide {
        match self {
            PositionSide::Long => OrderSide::Buy,
            PositionSide::Short => OrderSide::Sell,
        }
    }

    /// The order side that reduces or closes a position of this direction.
    pub fn exit_side(self) -> OrderSide {
        match self {
            PositionSide::Long => OrderSide::Sell,
            PositionSide::Short => OrderSide::Buy,
        }
    }
}

/// Lifecycle state. `Open -> PartiallyClosed -> Closed`, with two paths that
/// skip `PartiallyClosed`: a direct stop hit before TP1, and end-of-data
/// closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionStatus {
    Open,
    PartiallyClosed,
    Closed,
}

/// Why a position reached `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    StopLoss,
    StopLossBreakeven,
    TakeProfit2,
    EndOfData,
}

/// One trade, from entry fill to full closure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    // ── Identification ──
    pub id: PositionId,
    pub symbol: String,
    pub side: PositionSide,

    // ── Entry ──
    /// Effective entry price, post-slippage/spread.
    pub entry_price: f64,
    pub open_time: DateTime<Utc>,

    // ── Size ──
    /// Remaining open size. Monotonically decreasing.
    pub size: f64,
    pub original_size: f64,

    // ── Levels ──
    /// Moves to `entry_price` when TP1 fills (breakeven), then never again.
    pub stop_loss: f64,
    pub take_profit_1: f64,
    pub take_profit_2: f64,

    // ── Lifecycle ──
    pub status: PositionStatus,
    pub exit_reason: Option<ExitReason>,
    pub close_time: Option<DateTime<Utc>>,

    // ── Accounting ──
    /// Net of fees. Entry fee is booked here at open time.
    pub realized_pnl: f64,
    pub fees_paid: f64,
    /// Adverse price displacement (slippage + half-spread) in dollars.
    pub slippage_paid: f64,

    // ── Attribution ──
    pub tags: BTreeMap<String, String>,
}

impl Position {
    /// Create a freshly-opened position. `entry_price` is the post-cost
    /// effective fill; `entry_fee` is booked immediately into `fees_paid`
    /// and `realized_pnl`.
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        id: PositionId,
        symbol: impl Into<String>,
        side: PositionSide,
        entry_price: f64,
        size: f64,
        stop_loss: f64,
        take_profit_1: f64,
        take_profit_2: f64,
        open_time: DateTime<Utc>,
        entry_fee: f64,
        entry_slippage: f64,
        tags: BTreeMap<String, String>,
    ) -> Self {
        Self {
            id,
            symbol: symbol.into(),
            side,
            entry_price,
            open_time,
            size,
            original_size: size,
            stop_loss,
            take_profit_1,
            take_profit_2,
            status: PositionStatus::Open,
            exit_reason: None,
            close_time: None,
            realized_pnl: -entry_fee,
            fees_paid: entry_fee,
            slippage_paid: entry_slippage,
            tags,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status != PositionStatus::Closed
    }

    /// Entry-priced notional of the remaining size.
    pub fn notional(&self) -> f64 {
        self.entry_price * self.size
    }

    /// Mark-to-market PnL of the remaining size at `price`.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.side.sign() * (price - self.entry_price) * self.size
    }

    /// Close `quantity` at TP1: books the fill, moves the stop to breakeven,
    /// transitions to `PartiallyClosed`. Returns the realized PnL of the
    /// fill (net of fee).
    pub fn take_partial_profit(
        &mut self,
        quantity: f64,
        effective_price: f64,
        fee: f64,
        slippage: f64,
    ) -> f64 {
        debug_assert_eq!(self.status, PositionStatus::Open, "TP1 fill requires an Open position");
        debug_assert!(quantity > 0.0 && quantity < self.size);
        let realized = self.book_fill(quantity, effective_price, fee, slippage);
        self.stop_loss = self.entry_price;
        self.status = PositionStatus::PartiallyClosed;
        realized
    }

    /// Close the full remaining size and finalize. Returns the realized PnL
    /// of the fill (net of fee).
    pub fn close_all(
        &mut self,
        effective_price: f64,
        fee: f64,
        slippage: f64,
        reason: ExitReason,
        time: DateTime<Utc>,
    ) -> f64 {
        debug_assert!(self.is_open(), "cannot close a Closed position");
        let quantity = self.size;
        let realized = self.book_fill(quantity, effective_price, fee, slippage);
        self.size = 0.0;
        self.status = PositionStatus::Closed;
        self.exit_reason = Some(reason);
        self.close_time = Some(time);
        realized
    }

    fn book_fill(&mut self, quantity: f64, effective_price: f64, fee: f64, slippage: f64) -> f64 {
        let gross = self.side.sign() * (effective_price - self.entry_price) * quantity;
        let realized = gross - fee;
        self.realized_pnl += realized;
        self.fees_paid += fee;
        self.slippage_paid += slippage;
        self.size -= quantity;
        realized
    }
}
