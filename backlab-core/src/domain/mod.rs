//! Core domain types: bars, signals, positions, equity samples, IDs.

pub mod bar;
pub mod equity;
pub mod ids;
pub mod position;
pub mod signal;

pub use bar::Bar;
pub use equity::EquityPoint;
pub use ids::{IdGen, PositionId};
pub use position::{ExitReason, OrderSide, Position, PositionSide, PositionStatus};
pub use signal::{Direction, Signal};
