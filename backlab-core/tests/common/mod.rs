//! Shared fixtures for engine integration tests.
#![allow(dead_code)] // not every test binary uses every fixture

use backlab_core::domain::{Bar, Signal};
use backlab_core::Strategy;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;

pub const SYMBOL: &str = "BTCUSD";

pub fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
}

pub fn hour(d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, h, 0, 0).unwrap()
}

pub fn bar_at(ts: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar::new(SYMBOL, ts, open, high, low, close, 1_000_000.0)
}

pub fn daily_bar(d: u32, open: f64, high: f64, low: f64, close: f64) -> Bar {
    bar_at(day(d), open, high, low, close)
}

/// Replays predetermined signals keyed by history length: the signal fires
/// on the bar where the symbol's history reaches that many bars.
#[derive(Debug, Clone, Default)]
pub struct ScriptedStrategy {
    signals: HashMap<usize, Signal>,
}

impl ScriptedStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, bar_count: usize, signal: Signal) -> Self {
        self.signals.insert(bar_count, signal);
        self
    }
}

impl Strategy for ScriptedStrategy {
    fn evaluate(&mut self, history: &[Bar]) -> Option<Signal> {
        self.signals.get(&history.len()).cloned()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
