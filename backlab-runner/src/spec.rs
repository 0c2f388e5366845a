//! Run specifications — TOML-driven configuration for single runs and
//! sweeps. Invalid specs fail before any run starts.

use crate::strategies::BreakoutStrategy;
use crate::sweep::SweepAxes;
use backlab_core::{ConfigError, EngineConfig, HoldStrategy, Strategy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpecError {
    #[error("failed to read spec file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse spec TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Which strategy a spec runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategySpec {
    /// Never trades; equity baseline.
    Hold,
    /// N-bar-high breakout with a lowest-low stop (demo strategy).
    Breakout { lookback: usize },
}

impl StrategySpec {
    pub fn build(&self) -> Box<dyn Strategy> {
        match self {
            StrategySpec::Hold => Box::new(HoldStrategy),
            StrategySpec::Breakout { lookback } => Box::new(BreakoutStrategy::new(*lookback)),
        }
    }
}

/// A single-run specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSpec {
    /// CSV bar file consumed by `ingest::load_csv`.
    pub data_path: PathBuf,
    pub strategy: StrategySpec,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl RunSpec {
    pub fn load(path: &Path) -> Result<Self, SpecError> {
        let text = std::fs::read_to_string(path)?;
        let spec: RunSpec = toml::from_str(&text)?;
        spec.engine.validate()?;
        Ok(spec)
    }
}

/// A sweep specification: a base run plus parameter axes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepSpec {
    pub data_path: PathBuf,
    pub strategy: StrategySpec,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub axes: SweepAxes,
}

impl SweepSpec {
    pub fn load(path: &Path) -> Result<Self, SpecError> {
        let text = std::fs::read_to_string(path)?;
        let spec: SweepSpec = toml::from_str(&text)?;
        spec.engine.validate()?;
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_spec_parses_with_defaults() {
        let toml_text = r#"
            data_path = "bars.csv"

            [strategy]
            kind = "breakout"
            lookback = 20
        "#;
        let spec: RunSpec = toml::from_str(toml_text).unwrap();
        assert!(matches!(spec.strategy, StrategySpec::Breakout { lookback: 20 }));
        // Engine section omitted: defaults apply.
        assert_eq!(spec.engine.initial_capital, 100_000.0);
        assert!(spec.engine.validate().is_ok());
    }

    #[test]
    fn run_spec_overrides_engine_fields() {
        let toml_text = r#"
            data_path = "bars.csv"

            [strategy]
            kind = "hold"

            [engine]
            initial_capital = 25000.0
            risk_per_trade = 0.02
            random_seed = 7
        "#;
        let spec: RunSpec = toml::from_str(toml_text).unwrap();
        assert_eq!(spec.engine.initial_capital, 25_000.0);
        assert_eq!(spec.engine.risk_per_trade, 0.02);
        assert_eq!(spec.engine.random_seed, 7);
    }

    #[test]
    fn sweep_spec_parses_axes() {
        let toml_text = r#"
            data_path = "bars.csv"

            [strategy]
            kind = "breakout"
            lookback = 10

            [axes]
            risk_per_trade = [0.005, 0.01, 0.02]
            slippage_base = [0.0, 0.05]
        "#;
        let spec: SweepSpec = toml::from_str(toml_text).unwrap();
        assert_eq!(spec.axes.risk_per_trade.len(), 3);
        assert_eq!(spec.axes.slippage_base.len(), 2);
    }

    #[test]
    fn invalid_engine_section_rejected_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        std::fs::write(
            &path,
            r#"
                data_path = "bars.csv"

                [strategy]
                kind = "hold"

                [engine]
                risk_per_trade = -0.5
            "#,
        )
        .unwrap();
        assert!(matches!(RunSpec::load(&path), Err(SpecError::Config(_))));
    }
}
