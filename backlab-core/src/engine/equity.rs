//! Equity tracker — the append-only mark-to-market series.

use crate::domain::EquityPoint;
use chrono::{DateTime, Utc};

/// Accumulates one equity sample per processed timestamp.
#[derive(Debug, Clone, Default)]
pub struct EquityTracker {
    points: Vec<EquityPoint>,
}

impl EquityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample. Drawdown is computed by the risk controller, which
    /// owns the running peak.
    pub fn push(&mut self, timestamp: DateTime<Utc>, equity: f64, drawdown_pct: f64) {
        self.points.push(EquityPoint {
            timestamp,
            equity,
            drawdown_pct,
        });
    }

    pub fn points(&self) -> &[EquityPoint] {
        &self.points
    }

    pub fn last_equity(&self) -> Option<f64> {
        self.points.last().map(|p| p.equity)
    }

    pub fn into_points(self) -> Vec<EquityPoint> {
        self.points
    }
}
