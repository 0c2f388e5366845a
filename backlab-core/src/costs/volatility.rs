//! Rolling volatility tracker for slippage scaling.
//!
//! Tracks the standard deviation of close-to-close returns over a fixed
//! lookback window and the run-average of that statistic. The slippage model
//! consumes the ratio current/average, clamped so a data gap cannot produce
//! unbounded slippage.

use std::collections::VecDeque;

/// Upper clamp on the volatility ratio.
const RATIO_CLAMP: f64 = 3.0;

/// Per-symbol rolling return volatility and its run-average.
#[derive(Debug, Clone)]
pub struct VolatilityTracker {
    lookback: usize,
    /// Last `lookback` close-to-close returns.
    returns: VecDeque<f64>,
    last_close: Option<f64>,
    /// Running sum/count of observed window stddevs.
    stddev_sum: f64,
    stddev_count: u64,
    current_stddev: Option<f64>,
}

impl VolatilityTracker {
    pub fn new(lookback: usize) -> Self {
        Self {
            lookback,
            returns: VecDeque::with_capacity(lookback),
            last_close: None,
            stddev_sum: 0.0,
            stddev_count: 0,
            current_stddev: None,
        }
    }

    /// Feed the close of the latest bar.
    pub fn observe_close(&mut self, close: f64) {
        if let Some(prev) = self.last_close {
            if prev > 0.0 {
                let ret = close / prev - 1.0;
                if self.returns.len() == self.lookback {
                    self.returns.pop_front();
                }
                self.returns.push_back(ret);
            }
        }
        self.last_close = Some(close);

        if self.returns.len() == self.lookback {
            let stddev = stddev(self.returns.iter().copied());
            self.current_stddev = Some(stddev);
            self.stddev_sum += stddev;
            self.stddev_count += 1;
        }
    }

    /// Ratio of current window volatility to its run-average, clamped to
    /// `[0, 3]`. Neutral (1.0) until a full window has been observed.
    pub fn ratio(&self) -> f64 {
        let current = match self.current_stddev {
            Some(v) => v,
            None => return 1.0,
        };
        if self.stddev_count == 0 {
            return 1.0;
        }
        let average = self.stddev_sum / self.stddev_count as f64;
        if average <= 0.0 {
            return 1.0;
        }
        (current / average).clamp(0.0, RATIO_CLAMP)
    }
}

fn stddev(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let count = values.clone().count();
    if count == 0 {
        return 0.0;
    }
    let mean = values.clone().sum::<f64>() / count as f64;
    let variance = values.map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
    variance.sqrt()
}
