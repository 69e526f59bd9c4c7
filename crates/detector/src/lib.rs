//! Order-block detection for the ob-detector workspace.
//!
//! This crate handles:
//! - Rolling ATR volatility filter and parsed bar extremes
//! - Leg and pivot tracking per structure length
//! - Structure-break (breakout) detection
//! - Order-block creation and mitigation
//!
//! All state lives in one [`OrderBlockDetector`]; bars are processed in a
//! single forward pass.

pub mod volatility;
pub mod series;
pub mod structure;
pub mod breakout;
pub mod order_blocks;
pub mod engine;

pub use volatility::{ParsedBar, VolatilityFilter, HIGH_VOLATILITY_MULTIPLIER};
pub use series::BarSeries;
pub use structure::StructureTracker;
pub use breakout::detect_breakouts;
pub use order_blocks::OrderBlockStore;
pub use engine::{detect, BarUpdate, OrderBlockDetector};
