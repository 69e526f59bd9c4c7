//! Configuration for the order-block detector.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Detector configuration.
///
/// Every field has a default, so a partial JSON document such as
/// `{"swing_length": 10}` deserializes to a complete configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Lookback for the swing (primary, slower) structure.
    pub swing_length: usize,
    /// Lookback for the internal (secondary, faster) structure.
    pub internal_length: usize,
    /// True-range window used for the volatility estimate.
    pub atr_period: usize,
    /// Cap on each active order-block container. Does not limit history.
    pub max_active_order_blocks: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            swing_length: 50,
            internal_length: 5,
            atr_period: 200,
            max_active_order_blocks: 100,
        }
    }
}

impl DetectorConfig {
    /// Create a configuration with the given structure lengths and default
    /// volatility/capacity settings.
    pub fn with_lengths(swing_length: usize, internal_length: usize) -> Self {
        Self {
            swing_length,
            internal_length,
            ..Self::default()
        }
    }

    /// Parse a configuration from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration can drive a detector.
    pub fn validate(&self) -> Result<()> {
        if self.swing_length == 0 {
            return Err(Error::config("swing_length must be positive"));
        }
        if self.internal_length == 0 {
            return Err(Error::config("internal_length must be positive"));
        }
        if self.swing_length <= self.internal_length {
            return Err(Error::config(format!(
                "swing_length ({}) must be greater than internal_length ({})",
                self.swing_length, self.internal_length
            )));
        }
        if self.atr_period == 0 {
            return Err(Error::config("atr_period must be positive"));
        }
        if self.max_active_order_blocks == 0 {
            return Err(Error::config("max_active_order_blocks must be positive"));
        }
        Ok(())
    }
}
