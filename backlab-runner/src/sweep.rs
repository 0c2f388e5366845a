//! Parameter sweeps — many independent runs, parallelized across runs.
//!
//! Each grid point gets its own engine, strategy instance, and state; runs
//! share nothing, which is what makes rayon safe here. Results come back in
//! grid order regardless of scheduling, so a sweep is as deterministic as a
//! serial loop.

use crate::spec::StrategySpec;
use backlab_core::fingerprint::RunFingerprint;
use backlab_core::{ConfigError, Engine, EngineConfig, EngineError, MarketData, RunSummary};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SweepError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Swept parameter axes. Empty axes fall back to the base config's value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepAxes {
    #[serde(default)]
    pub risk_per_trade: Vec<f64>,
    #[serde(default)]
    pub slippage_base: Vec<f64>,
}

/// One grid point's outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepOutcome {
    pub risk_per_trade: f64,
    pub slippage_base: f64,
    pub final_equity: f64,
    pub trade_count: usize,
    pub summary: RunSummary,
    pub fingerprint: RunFingerprint,
}

/// Run the cartesian grid of `axes` over `base`, in parallel across runs.
pub fn run_sweep(
    base: &EngineConfig,
    axes: &SweepAxes,
    data: &MarketData,
    strategy: &StrategySpec,
) -> Result<Vec<SweepOutcome>, SweepError> {
    let risks = if axes.risk_per_trade.is_empty() {
        vec![base.risk_per_trade]
    } else {
        axes.risk_per_trade.clone()
    };
    let slippages = if axes.slippage_base.is_empty() {
        vec![base.slippage_base]
    } else {
        axes.slippage_base.clone()
    };

    let grid: Vec<(f64, f64)> = risks
        .iter()
        .flat_map(|&risk| slippages.iter().map(move |&slip| (risk, slip)))
        .collect();

    tracing::info!(points = grid.len(), "starting parameter sweep");

    grid.par_iter()
        .map(|&(risk_per_trade, slippage_base)| {
            let config = EngineConfig {
                risk_per_trade,
                slippage_base,
                ..base.clone()
            };
            let engine = Engine::new(config)?;
            let mut strat = strategy.build();
            let result = engine.run(data, strat.as_mut())?;
            Ok(SweepOutcome {
                risk_per_trade,
                slippage_base,
                final_equity: result.final_equity,
                trade_count: result.trades.len(),
                summary: result.summary,
                fingerprint: result.fingerprint,
            })
        })
        .collect()
}
