//! Data ingestion for the order-block detector.
//!
//! This crate handles:
//! - Loading daily OHLCV bars from JSON
//! - Deduplication and chronological ordering
//! - Resampling to weekly or monthly bars

pub mod bar_builder;
pub mod loader;

pub use bar_builder::{resample, Timeframe};
pub use loader::{load_bars, load_json_bars, parse_json_bars};
