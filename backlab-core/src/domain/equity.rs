//! EquityPoint — one mark-to-market sample of the equity curve.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One sample of the equity curve, appended once per processed timestamp.
///
/// `equity` is realized capital plus the unrealized mark-to-market of all
/// open positions at the bar close. `drawdown_pct` is the decline from the
/// running peak as a fraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
    pub drawdown_pct: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn equity_point_serialization_roundtrip() {
        let point = EquityPoint {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            equity: 100_500.0,
            drawdown_pct: 0.0125,
        };
        let json = serde_json::to_string(&point).unwrap();
        let deser: EquityPoint = serde_json::from_str(&json).unwrap();
        assert_eq!(point, deser);
    }
}
