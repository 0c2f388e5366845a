//! Position sizing — fixed-risk and ATR-based policies with portfolio caps.
//!
//! # Formula
//! ```text
//! risk_dollars  = capital * risk_per_trade
//! stop_distance = |entry - stop|            (fixed-risk)
//!               = ATR(atr_period) * volatility_factor   (ATR policy)
//! size          = risk_dollars / stop_distance
//! ```
//! The raw size is then reduced to respect the leverage cap and the
//! per-asset exposure cap. A size that collapses to zero after the caps is a
//! rejection ("no entry"), not an error.

use crate::config::EngineConfig;
use crate::domain::{Bar, Signal};
use crate::error::SizingError;

/// Sizes below this are treated as zero (rejection).
pub const MIN_SIZE_EPSILON: f64 = 1e-9;

/// Outcome of sizing an admissible entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntrySizing {
    pub size: f64,
    /// The distance actually used for risk sizing.
    pub stop_distance: f64,
}

/// Average True Range over the last `period` bars. `None` until enough
/// history has accumulated.
pub fn atr(bars: &[Bar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period {
        return None;
    }
    let window = &bars[bars.len() - period..];
    let mut sum_tr = 0.0;
    for (i, bar) in window.iter().enumerate() {
        let prev_close = if i > 0 {
            Some(window[i - 1].close)
        } else {
            None
        };
        sum_tr += true_range(bar, prev_close);
    }
    Some(sum_tr / period as f64)
}

fn true_range(bar: &Bar, prev_close: Option<f64>) -> f64 {
    let high_low = bar.high - bar.low;
    match prev_close {
        Some(pc) => {
            let high_prev = (bar.high - pc).abs();
            let low_prev = (bar.low - pc).abs();
            high_low.max(high_prev).max(low_prev)
        }
        None => high_low,
    }
}

/// Size a candidate entry.
///
/// `existing_symbol_notional` is the entry-priced notional already deployed
/// on this symbol, counted against the per-asset cap.
///
/// Returns `Ok(None)` when the caps reduce the size to zero — the entry is
/// simply skipped and counted, per the sizing-rejection policy.
pub fn size_entry(
    capital: f64,
    signal: &Signal,
    history: &[Bar],
    existing_symbol_notional: f64,
    config: &EngineConfig,
) -> Result<Option<EntrySizing>, SizingError> {
    let stop_distance = if config.use_atr_sizing {
        let atr = atr(history, config.atr_period)
            .ok_or(SizingError::InsufficientHistory(config.atr_period))?;
        atr * config.volatility_factor
    } else {
        (signal.entry_price - signal.stop_loss).abs()
    };
    if stop_distance <= 0.0 || !stop_distance.is_finite() {
        return Err(SizingError::NonPositiveStopDistance(stop_distance));
    }

    let mut size = capital * config.risk_per_trade / stop_distance;
    if let Some(hint) = signal.size_hint {
        size = size.min(hint);
    }

    // Leverage cap on total notional for this entry.
    let max_notional = capital * config.max_leverage;
    if size * signal.entry_price > max_notional {
        size = max_notional / signal.entry_price;
    }

    // Per-asset exposure cap.
    let asset_cap = capital * config.per_asset_cap_pct;
    if existing_symbol_notional + size * signal.entry_price > asset_cap {
        size = (asset_cap - existing_symbol_notional) / signal.entry_price;
    }

    if size <= MIN_SIZE_EPSILON {
        return Ok(None);
    }
    Ok(Some(EntrySizing {
        size,
        stop_distance,
    }))
}
