//! Strategy boundary — the opaque capability the engine consumes.
//!
//! A strategy sees only the bar history up to and including the current bar
//! for one symbol, and answers with an optional [`Signal`]. It never sees
//! portfolio or risk state — the trait signature enforces that. Signals are
//! validated at the boundary; a malformed one is counted as a fault and
//! treated as a hold.

use crate::domain::{Bar, Signal};
use std::collections::BTreeMap;

/// Per-bar decision capability: `history -> Signal`.
///
/// `history` is ordered oldest-first and ends with the current bar.
/// Returning `None` (or a `Hold` signal) means no action.
pub trait Strategy {
    fn evaluate(&mut self, history: &[Bar]) -> Option<Signal>;

    /// Optional attribution tags attached to a position opened on this bar,
    /// merged over the signal's own tags.
    fn tags(&self, _history: &[Bar]) -> Option<BTreeMap<String, String>> {
        None
    }

    /// Name for logging and attribution.
    fn name(&self) -> &str {
        "strategy"
    }
}

/// Strategy that never acts. Useful for cost-free equity baselines.
#[derive(Debug, Clone, Copy, Default)]
pub struct HoldStrategy;

impl Strategy for HoldStrategy {
    fn evaluate(&mut self, _history: &[Bar]) -> Option<Signal> {
        None
    }

    fn name(&self) -> &str {
        "hold"
    }
}
