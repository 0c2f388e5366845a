//! Engine configuration — immutable for the duration of a run.
//!
//! All options are validated once at engine construction; a run never starts
//! with an invalid configuration.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// How concurrent positions on the same symbol are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionMode {
    /// At most one open position per symbol.
    Netting,
    /// Up to `max_positions_per_symbol` concurrent positions per symbol,
    /// sides may differ.
    Hedging,
}

/// Tie-break when a bar touches both the stop and a take-profit level.
///
/// Real intrabar sequencing is unrecoverable from OHLC bars, so this is an
/// explicit policy choice, not a guess at hidden market order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionPriority {
    /// Stop wins (conservative).
    StopLossFirst,
    /// Take-profit wins (optimistic).
    TakeProfitFirst,
    /// Levels resolve in registration order. Entry registers the stop before
    /// the target, so this is equivalent to `StopLossFirst`.
    Fifo,
}

/// Full option set for one backtest run.
///
/// Cost parameters (`slippage_base`, `bid_ask_spread`) are in price units;
/// fees (`fee_entry`, `fee_exit`) are fractions of the fill notional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub initial_capital: f64,
    /// Fraction of capital risked per trade (distance to stop).
    pub risk_per_trade: f64,
    pub slippage_base: f64,
    pub bid_ask_spread: f64,
    pub fee_entry: f64,
    pub fee_exit: f64,
    /// Window (bars) for the rolling close-to-close return volatility.
    pub volatility_lookback: usize,
    pub max_concurrent_trades: usize,
    pub max_positions_per_symbol: usize,
    pub position_mode: PositionMode,
    pub execution_priority: ExecutionPriority,
    /// Daily halt trips when daily PnL reaches `-max_daily_loss_pct * capital_at_day_start`.
    pub max_daily_loss_pct: f64,
    /// Permanent halt trips when drawdown from peak equity reaches this fraction.
    pub max_drawdown_pct: f64,
    pub max_leverage: f64,
    /// Cap on a single symbol's notional as a fraction of capital.
    pub per_asset_cap_pct: f64,
    pub use_atr_sizing: bool,
    pub atr_period: usize,
    /// Stop-distance multiplier for ATR sizing.
    pub volatility_factor: f64,
    /// Fraction of the position closed at take-profit 1.
    pub partial_close_fraction: f64,
    pub random_seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            risk_per_trade: 0.01,
            slippage_base: 0.0,
            bid_ask_spread: 0.0,
            fee_entry: 0.0,
            fee_exit: 0.0,
            volatility_lookback: 20,
            max_concurrent_trades: 5,
            max_positions_per_symbol: 1,
            position_mode: PositionMode::Netting,
            execution_priority: ExecutionPriority::StopLossFirst,
            max_daily_loss_pct: 0.05,
            max_drawdown_pct: 0.20,
            max_leverage: 1.0,
            per_asset_cap_pct: 1.0,
            use_atr_sizing: false,
            atr_period: 14,
            volatility_factor: 2.0,
            partial_close_fraction: 0.5,
            random_seed: 42,
        }
    }
}

impl EngineConfig {
    /// Zero-friction config for a given starting capital. Useful in tests and
    /// for isolating strategy PnL from cost assumptions.
    pub fn frictionless(initial_capital: f64) -> Self {
        Self {
            initial_capital,
            ..Self::default()
        }
    }

    /// Validate the option set. Called once at engine construction.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.risk_per_trade <= 0.0 {
            return Err(ConfigError::NonPositiveRiskPerTrade(self.risk_per_trade));
        }
        for (name, value) in [
            ("slippage_base", self.slippage_base),
            ("bid_ask_spread", self.bid_ask_spread),
            ("fee_entry", self.fee_entry),
            ("fee_exit", self.fee_exit),
        ] {
            if value < 0.0 {
                return Err(ConfigError::NegativeCostParameter { name, value });
            }
        }
        if !(self.partial_close_fraction > 0.0 && self.partial_close_fraction < 1.0) {
            return Err(ConfigError::PartialCloseFractionOutOfRange(
                self.partial_close_fraction,
            ));
        }
        for (name, value) in [
            ("max_daily_loss_pct", self.max_daily_loss_pct),
            ("max_drawdown_pct", self.max_drawdown_pct),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::LossLimitOutOfRange { name, value });
            }
        }
        for (name, value) in [
            ("initial_capital", self.initial_capital),
            ("max_leverage", self.max_leverage),
            ("per_asset_cap_pct", self.per_asset_cap_pct),
            ("volatility_factor", self.volatility_factor),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::NonPositiveLimit { name, value });
            }
        }
        if self.volatility_lookback < 2 {
            return Err(ConfigError::WindowTooShort {
                name: "volatility_lookback",
                min: 2,
                value: self.volatility_lookback,
            });
        }
        if self.atr_period < 1 {
            return Err(ConfigError::WindowTooShort {
                name: "atr_period",
                min: 1,
                value: self.atr_period,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_risk_per_trade() {
        let config = EngineConfig {
            risk_per_trade: 0.0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveRiskPerTrade(_))
        ));
    }

    #[test]
    fn rejects_negative_cost_parameter() {
        let config = EngineConfig {
            fee_exit: -0.001,
            ..EngineConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("fee_exit"));
    }

    #[test]
    fn rejects_partial_close_fraction_bounds() {
        for bad in [0.0, 1.0, 1.5, -0.25] {
            let config = EngineConfig {
                partial_close_fraction: bad,
                ..EngineConfig::default()
            };
            assert!(
                config.validate().is_err(),
                "partial_close_fraction {bad} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_loss_limits_outside_unit_interval() {
        let config = EngineConfig {
            max_daily_loss_pct: 1.2,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            max_drawdown_pct: 0.0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());

        // 1.0 is inclusive and allowed.
        let config = EngineConfig {
            max_drawdown_pct: 1.0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_serialization_roundtrip() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deser: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.random_seed, deser.random_seed);
        assert_eq!(config.position_mode, deser.position_mode);
        assert_eq!(config.execution_priority, deser.execution_priority);
    }
}
