//! Error taxonomy for the engine.
//!
//! Fatal errors (`ConfigError`, `DataError`, invariant violations) abort a run
//! and carry the offending parameter or bar. Recoverable conditions
//! (`CostError`, `SizingError`) are absorbed by the engine loop and surface
//! only through the run summary counters.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Configuration rejected at construction. The run never starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("risk_per_trade must be positive, got {0}")]
    NonPositiveRiskPerTrade(f64),

    #[error("{name} must be non-negative, got {value}")]
    NegativeCostParameter { name: &'static str, value: f64 },

    #[error("partial_close_fraction must be inside (0, 1), got {0}")]
    PartialCloseFractionOutOfRange(f64),

    #[error("{name} must be inside (0, 1], got {value}")]
    LossLimitOutOfRange { name: &'static str, value: f64 },

    #[error("{name} must be positive, got {value}")]
    NonPositiveLimit { name: &'static str, value: f64 },

    #[error("{name} must be at least {min}, got {value}")]
    WindowTooShort {
        name: &'static str,
        min: usize,
        value: usize,
    },
}

/// Malformed market data. Aborts the in-progress run.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("insane bar for {symbol} at {timestamp}: low <= open,close <= high violated")]
    InsaneBar {
        symbol: String,
        timestamp: DateTime<Utc>,
    },

    #[error("non-monotonic timestamp for {symbol} at {timestamp}")]
    NonMonotonicTimestamp {
        symbol: String,
        timestamp: DateTime<Utc>,
    },
}

/// Invalid input to the cost model.
#[derive(Debug, Error)]
pub enum CostError {
    #[error("cost model requires a positive notional, got {0}")]
    InvalidCostInput(f64),
}

/// The sizer could not produce a size for this entry.
#[derive(Debug, Error)]
pub enum SizingError {
    #[error("cannot size an entry with stop distance {0} (must be positive)")]
    NonPositiveStopDistance(f64),

    #[error("insufficient history for ATR({0}) sizing")]
    InsufficientHistory(usize),
}

/// Top-level engine error.
///
/// `InvariantViolation` signals a logic bug inside the engine itself (e.g. an
/// entry slipping past a denied admission). It aborts the run loudly rather
/// than silently corrupting results.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("execution invariant violated at {timestamp}: {detail}")]
    InvariantViolation {
        detail: String,
        timestamp: DateTime<Utc>,
    },
}
