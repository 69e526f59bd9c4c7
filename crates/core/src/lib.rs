//! Core types and configuration for the order-block detector.
//!
//! This crate provides shared types used across all other crates:
//! - Market data types (bars)
//! - Structure and order-block records
//! - Detector configuration
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::DetectorConfig;
pub use error::{Error, Result};
pub use types::*;
