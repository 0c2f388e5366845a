//! Backlab Runner — orchestration around the engine core.
//!
//! The engine owns no file format or CLI surface; this crate is the caller:
//! - TOML run specifications (`spec`)
//! - CSV bar ingestion into a validated `MarketData` feed (`ingest`)
//! - Cross-run parameter sweeps, parallelized with rayon (`sweep`)
//! - Example strategies used by tests and the demo binary (`strategies`)

pub mod ingest;
pub mod spec;
pub mod strategies;
pub mod sweep;

pub use ingest::load_csv;
pub use spec::{RunSpec, StrategySpec, SweepSpec};
pub use sweep::{run_sweep, SweepAxes, SweepOutcome};
