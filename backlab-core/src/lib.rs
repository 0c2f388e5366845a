//! Backlab Core — deterministic backtest execution and risk engine.
//!
//! This crate contains the heart of the backtester:
//! - Domain types (bars, signals, positions, equity points)
//! - Cost model with volatility-scaled, seeded slippage
//! - Fixed-risk and ATR position sizing with leverage/exposure caps
//! - Risk controller (daily loss halt, permanent drawdown halt, admission)
//! - Position lifecycle manager (TP1 partial, breakeven stop, TP2, stops)
//! - Bar-by-bar execution loop producing the trade log and equity curve
//!
//! The engine consumes bars and a strategy capability; it owns no data
//! acquisition, no persistence format, and no analytics.

pub mod config;
pub mod costs;
pub mod domain;
pub mod engine;
pub mod error;
pub mod feed;
pub mod fingerprint;
pub mod manager;
pub mod risk;
pub mod rng;
pub mod sizing;
pub mod strategy;

pub use config::{EngineConfig, ExecutionPriority, PositionMode};
pub use engine::{Engine, RunResult, RunSummary};
pub use error::{ConfigError, CostError, DataError, EngineError, SizingError};
pub use feed::MarketData;
pub use strategy::{HoldStrategy, Strategy};
