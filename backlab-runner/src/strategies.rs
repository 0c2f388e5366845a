//! Example strategies shipped beside the engine.
//!
//! These exist for tests, demos, and sweeps — signal research is not this
//! workspace's business. `LevelStrategy` replays a predetermined script;
//! `BreakoutStrategy` is a minimal N-bar-high entry with a lowest-low stop.

use backlab_core::domain::{Bar, Signal};
use backlab_core::Strategy;
use std::collections::{BTreeMap, HashMap};

/// Replays predetermined signals keyed by history length: the signal fires
/// on the bar where the symbol's history reaches that many bars. The
/// scripted nature makes engine behavior exactly reproducible in tests.
#[derive(Debug, Clone, Default)]
pub struct LevelStrategy {
    signals: HashMap<usize, Signal>,
}

impl LevelStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, bar_count: usize, signal: Signal) -> Self {
        self.signals.insert(bar_count, signal);
        self
    }
}

impl Strategy for LevelStrategy {
    fn evaluate(&mut self, history: &[Bar]) -> Option<Signal> {
        self.signals.get(&history.len()).cloned()
    }

    fn name(&self) -> &str {
        "levels"
    }
}

/// Long-only N-bar-high breakout.
///
/// Entry when the latest close exceeds the highest high of the previous
/// `lookback` bars. Stop at the window's lowest low; targets at 1R and 2R.
#[derive(Debug, Clone)]
pub struct BreakoutStrategy {
    lookback: usize,
}

impl BreakoutStrategy {
    pub fn new(lookback: usize) -> Self {
        Self {
            lookback: lookback.max(1),
        }
    }
}

impl Strategy for BreakoutStrategy {
    fn evaluate(&mut self, history: &[Bar]) -> Option<Signal> {
        if history.len() < self.lookback + 1 {
            return None;
        }
        let bar = history.last()?;
        let window = &history[history.len() - 1 - self.lookback..history.len() - 1];
        let highest = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let lowest = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);

        if bar.close <= highest {
            return None;
        }
        let entry = bar.close;
        let risk = entry - lowest;
        if risk <= 0.0 {
            return None;
        }
        Some(
            Signal::buy(entry, lowest, entry + risk, entry + 2.0 * risk)
                .with_tag("setup", "breakout"),
        )
    }

    fn tags(&self, _history: &[Bar]) -> Option<BTreeMap<String, String>> {
        let mut tags = BTreeMap::new();
        tags.insert("lookback".to_string(), self.lookback.to_string());
        Some(tags)
    }

    fn name(&self) -> &str {
        "breakout"
    }
}
