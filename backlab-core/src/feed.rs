//! MarketData — the validated bar feed for one run.
//!
//! The engine does not fetch or cache data; it iterates what it is given.
//! Validation happens once at construction: every bar must pass the OHLC
//! sanity check and each symbol's timestamps must be strictly increasing.
//! Bars are grouped by timestamp so multi-symbol runs process all symbols
//! sharing a timestamp before the equity sample for that instant.

use crate::domain::Bar;
use crate::error::DataError;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

/// Ordered, gap-tolerant multi-symbol bar feed.
#[derive(Debug, Clone)]
pub struct MarketData {
    /// Timestamp -> bars at that instant (one per symbol, input order).
    groups: BTreeMap<DateTime<Utc>, Vec<Bar>>,
    symbols: Vec<String>,
}

impl MarketData {
    /// Build a feed from bars in per-symbol order.
    ///
    /// Symbols may interleave freely, but within one symbol the timestamps
    /// must be strictly increasing. Fails on the first malformed bar or
    /// ordering violation, naming the symbol and timestamp.
    pub fn from_bars(bars: Vec<Bar>) -> Result<Self, DataError> {
        let mut groups: BTreeMap<DateTime<Utc>, Vec<Bar>> = BTreeMap::new();
        let mut last_ts: HashMap<String, DateTime<Utc>> = HashMap::new();
        let mut symbols: Vec<String> = Vec::new();

        for bar in bars {
            if !bar.is_sane() {
                return Err(DataError::InsaneBar {
                    symbol: bar.symbol,
                    timestamp: bar.timestamp,
                });
            }
            match last_ts.get(&bar.symbol) {
                Some(prev) if bar.timestamp <= *prev => {
                    return Err(DataError::NonMonotonicTimestamp {
                        symbol: bar.symbol,
                        timestamp: bar.timestamp,
                    });
                }
                Some(_) => {}
                None => symbols.push(bar.symbol.clone()),
            }
            last_ts.insert(bar.symbol.clone(), bar.timestamp);
            groups.entry(bar.timestamp).or_default().push(bar);
        }

        Ok(Self { groups, symbols })
    }

    /// Number of distinct timestamps (the equity-curve length of a full run).
    pub fn num_timestamps(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Symbols in first-seen order.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Iterate timestamp groups in chronological order.
    pub fn groups(&self) -> impl Iterator<Item = (&DateTime<Utc>, &[Bar])> {
        self.groups.iter().map(|(ts, bars)| (ts, bars.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bar(symbol: &str, day: u32, close: f64) -> Bar {
        Bar::new(
            symbol,
            Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            close - 0.5,
            close + 1.0,
            close - 1.0,
            close,
            1_000.0,
        )
    }

    #[test]
    fn groups_by_timestamp_in_order() {
        use chrono::Datelike;

        let data = MarketData::from_bars(vec![
            bar("ETHUSD", 2, 200.0),
            bar("ETHUSD", 3, 201.0),
            bar("BTCUSD", 2, 100.0),
            bar("BTCUSD", 4, 101.0),
        ])
        .unwrap();

        assert_eq!(data.num_timestamps(), 3);
        let days: Vec<u32> = data
            .groups()
            .map(|(ts, _)| ts.date_naive().day())
            .collect();
        assert_eq!(days, vec![2, 3, 4]);

        let (_, first_group) = data.groups().next().unwrap();
        assert_eq!(first_group.len(), 2);
    }

    #[test]
    fn rejects_insane_bar() {
        let mut b = bar("BTCUSD", 2, 100.0);
        b.high = b.low - 1.0;
        let err = MarketData::from_bars(vec![b]).unwrap_err();
        assert!(matches!(err, DataError::InsaneBar { ref symbol, .. } if symbol == "BTCUSD"));
    }

    #[test]
    fn rejects_non_monotonic_symbol_stream() {
        let err =
            MarketData::from_bars(vec![bar("BTCUSD", 3, 100.0), bar("BTCUSD", 2, 99.0)])
                .unwrap_err();
        assert!(matches!(err, DataError::NonMonotonicTimestamp { .. }));
    }

    #[test]
    fn rejects_duplicate_timestamp_for_symbol() {
        let err =
            MarketData::from_bars(vec![bar("BTCUSD", 2, 100.0), bar("BTCUSD", 2, 100.5)])
                .unwrap_err();
        assert!(matches!(err, DataError::NonMonotonicTimestamp { .. }));
    }

    #[test]
    fn symbols_in_first_seen_order() {
        let data = MarketData::from_bars(vec![
            bar("ETHUSD", 2, 200.0),
            bar("BTCUSD", 2, 100.0),
            bar("ETHUSD", 3, 201.0),
        ])
        .unwrap();
        assert_eq!(data.symbols(), &["ETHUSD".to_string(), "BTCUSD".to_string()]);
    }
}
