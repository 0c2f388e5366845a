//! Cost model — slippage, spread, and fee calculation.
//!
//! Slippage is directional: buyers pay more, sellers receive less. It scales
//! with the symbol's recent volatility ratio and carries a small seeded
//! jitter drawn from the run-scoped RNG (zero slippage configs never draw,
//! so zero-cost runs stay exactly flat). Half the quoted spread is paid on
//! every leg. Fees apply to the post-slippage notional.

pub mod volatility;

pub use volatility::VolatilityTracker;

use crate::config::EngineConfig;
use crate::domain::OrderSide;
use crate::error::CostError;
use rand::rngs::StdRng;
use rand::Rng;

/// Weight of the volatility ratio in the slippage multiplier.
const VOLATILITY_WEIGHT: f64 = 1.0;

/// Jitter band applied to non-zero slippage, per fill.
const JITTER_LOW: f64 = 0.75;
const JITTER_HIGH: f64 = 1.25;

/// Which fee schedule applies to a fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    Entry,
    Exit,
}

/// Priced fill produced by the cost model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillQuote {
    /// Requested price adjusted against the trader.
    pub effective_price: f64,
    /// Fee on the post-slippage notional.
    pub fee: f64,
    /// Adverse price displacement per unit (slippage + half-spread).
    pub price_impact: f64,
}

/// Pure pricing component. Carries only configuration; the RNG is passed in
/// so determinism stays the caller's responsibility.
#[derive(Debug, Clone)]
pub struct CostModel {
    slippage_base: f64,
    bid_ask_spread: f64,
    fee_entry: f64,
    fee_exit: f64,
}

impl CostModel {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            slippage_base: config.slippage_base,
            bid_ask_spread: config.bid_ask_spread,
            fee_entry: config.fee_entry,
            fee_exit: config.fee_exit,
        }
    }

    pub fn frictionless() -> Self {
        Self {
            slippage_base: 0.0,
            bid_ask_spread: 0.0,
            fee_entry: 0.0,
            fee_exit: 0.0,
        }
    }

    /// Price a fill of `quantity` units at `requested_price`.
    ///
    /// `vol_ratio` is the clamped current/average volatility ratio from
    /// [`VolatilityTracker`]. Fails if the notional is not positive.
    pub fn fill(
        &self,
        side: OrderSide,
        requested_price: f64,
        quantity: f64,
        vol_ratio: f64,
        leg: Leg,
        rng: &mut StdRng,
    ) -> Result<FillQuote, CostError> {
        let notional = requested_price * quantity;
        if notional <= 0.0 || !notional.is_finite() {
            return Err(CostError::InvalidCostInput(notional));
        }

        let slippage = if self.slippage_base > 0.0 {
            let jitter = rng.gen_range(JITTER_LOW..JITTER_HIGH);
            self.slippage_base * (1.0 + VOLATILITY_WEIGHT * vol_ratio) * jitter
        } else {
            0.0
        };
        let price_impact = slippage + self.bid_ask_spread / 2.0;

        let effective_price = match side {
            OrderSide::Buy => requested_price + price_impact,
            OrderSide::Sell => requested_price - price_impact,
        };

        let fee_rate = match leg {
            Leg::Entry => self.fee_entry,
            Leg::Exit => self.fee_exit,
        };
        let fee = effective_price * quantity * fee_rate;

        Ok(FillQuote {
            effective_price,
            fee,
            price_impact,
        })
    }
}
