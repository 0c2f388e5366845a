//! CSV bar ingestion.
//!
//! Expected columns: `symbol,timestamp,open,high,low,close,volume` with
//! RFC 3339 timestamps. Rows must arrive in per-symbol chronological order;
//! the feed constructor enforces that and the OHLC sanity check, so a bad
//! file fails here with the offending symbol and timestamp, before any run
//! starts.

use backlab_core::domain::Bar;
use backlab_core::{DataError, MarketData};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read bar CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Data(#[from] DataError),
}

#[derive(Debug, Deserialize)]
struct CsvBar {
    symbol: String,
    timestamp: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Load and validate a bar CSV into a run-ready feed.
pub fn load_csv(path: &Path) -> Result<MarketData, IngestError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut bars = Vec::new();
    for row in reader.deserialize::<CsvBar>() {
        let row = row?;
        bars.push(Bar::new(
            row.symbol,
            row.timestamp,
            row.open,
            row.high,
            row.low,
            row.close,
            row.volume,
        ));
    }
    tracing::debug!(bars = bars.len(), path = %path.display(), "loaded bar CSV");
    Ok(MarketData::from_bars(bars)?)
}
