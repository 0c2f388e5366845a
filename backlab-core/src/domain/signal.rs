//! Signal — a strategy's directional decision with entry/stop/target levels.
//!
//! Signals cross the strategy boundary untrusted: the engine validates the
//! level-ordering invariant before acting and treats a malformed signal as a
//! hold (counted as a strategy fault, never a run abort).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Directional decision for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Buy,
    Sell,
    Hold,
}

/// Strategy output for one bar of one symbol.
///
/// Tags are an ordered map so serialized trade logs are byte-stable across
/// runs with the same seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit_1: f64,
    pub take_profit_2: f64,
    pub size_hint: Option<f64>,
    pub tags: BTreeMap<String, String>,
}

impl Signal {
    /// A no-action signal.
    pub fn hold() -> Self {
        Self {
            direction: Direction::Hold,
            entry_price: 0.0,
            stop_loss: 0.0,
            take_profit_1: 0.0,
            take_profit_2: 0.0,
            size_hint: None,
            tags: BTreeMap::new(),
        }
    }

    pub fn buy(entry_price: f64, stop_loss: f64, take_profit_1: f64, take_profit_2: f64) -> Self {
        Self {
            direction: Direction::Buy,
            entry_price,
            stop_loss,
            take_profit_1,
            take_profit_2,
            size_hint: None,
            tags: BTreeMap::new(),
        }
    }

    pub fn sell(entry_price: f64, stop_loss: f64, take_profit_1: f64, take_profit_2: f64) -> Self {
        Self {
            direction: Direction::Sell,
            entry_price,
            stop_loss,
            take_profit_1,
            take_profit_2,
            size_hint: None,
            tags: BTreeMap::new(),
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn is_hold(&self) -> bool {
        self.direction == Direction::Hold
    }

    /// Level-ordering invariant.
    ///
    /// Buy: `stop_loss < entry < tp1 < tp2`. Sell: mirrored. All levels must
    /// be finite and positive. Hold signals carry no levels and are always
    /// valid.
    pub fn validate(&self) -> bool {
        if self.is_hold() {
            return true;
        }
        let levels = [
            self.entry_price,
            self.stop_loss,
            self.take_profit_1,
            self.take_profit_2,
        ];
        if levels.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return false;
        }
        if let Some(hint) = self.size_hint {
            if !hint.is_finite() || hint <= 0.0 {
                return false;
            }
        }
        match self.direction {
            Direction::Buy => {
                self.stop_loss < self.entry_price
                    && self.entry_price < self.take_profit_1
                    && self.take_profit_1 < self.take_profit_2
            }
            Direction::Sell => {
                self.stop_loss > self.entry_price
                    && self.entry_price > self.take_profit_1
                    && self.take_profit_1 > self.take_profit_2
            }
            Direction::Hold => true,
        }
    }
}
