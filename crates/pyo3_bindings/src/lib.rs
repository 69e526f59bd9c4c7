//! PyO3 bindings for the order-block detector.
//!
//! Exposes to Python:
//! - `Bar` and `OrderBlock` value types
//! - `OrderBlockDetector`, the incremental engine
//! - `load_bars`, the JSON loader with resampling

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use ob_core::{
    Bar as RustBar, DetectorConfig, Error as RustError, OrderBlock as RustOrderBlock, Scope,
};
use ob_detector::OrderBlockDetector as RustDetector;
use ob_ingestion::{load_bars as rust_load_bars, Timeframe};

fn to_py_err(err: RustError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

// ============================================================================
// Python-exposed Types
// ============================================================================

/// One OHLCV bar. `timestamp` is milliseconds since the Unix epoch (UTC).
#[pyclass]
#[derive(Clone)]
pub struct Bar {
    #[pyo3(get, set)]
    pub timestamp: i64,
    #[pyo3(get, set)]
    pub open: f64,
    #[pyo3(get, set)]
    pub high: f64,
    #[pyo3(get, set)]
    pub low: f64,
    #[pyo3(get, set)]
    pub close: f64,
    #[pyo3(get, set)]
    pub volume: f64,
}

#[pymethods]
impl Bar {
    #[new]
    #[pyo3(signature = (timestamp, open, high, low, close, volume = 0.0))]
    fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Bar { timestamp, open, high, low, close, volume }
    }

    fn __repr__(&self) -> String {
        format!(
            "Bar(timestamp={}, open={}, high={}, low={}, close={}, volume={})",
            self.timestamp, self.open, self.high, self.low, self.close, self.volume
        )
    }
}

impl From<&Bar> for RustBar {
    fn from(b: &Bar) -> Self {
        RustBar::new(b.timestamp, b.open, b.high, b.low, b.close, b.volume)
    }
}

impl From<RustBar> for Bar {
    fn from(b: RustBar) -> Self {
        Bar {
            timestamp: b.timestamp,
            open: b.open,
            high: b.high,
            low: b.low,
            close: b.close,
            volume: b.volume,
        }
    }
}

/// A detected order block. `bias` is +1 for bullish and -1 for bearish.
#[pyclass]
#[derive(Clone)]
pub struct OrderBlock {
    #[pyo3(get)]
    pub high: f64,
    #[pyo3(get)]
    pub low: f64,
    #[pyo3(get)]
    pub start_time: i64,
    #[pyo3(get)]
    pub created_time: i64,
    #[pyo3(get)]
    pub pivot_time: i64,
    #[pyo3(get)]
    pub bias: i8,
    #[pyo3(get)]
    pub internal: bool,
    #[pyo3(get)]
    pub mitigated: bool,
    #[pyo3(get)]
    pub mitigated_time: Option<i64>,
    #[pyo3(get)]
    pub origin_index: usize,
    #[pyo3(get)]
    pub created_index: usize,
    #[pyo3(get)]
    pub pivot_index: usize,
    label: String,
}

#[pymethods]
impl OrderBlock {
    /// Display label such as "internal bull OB".
    #[getter]
    fn label(&self) -> String {
        self.label.clone()
    }

    fn __repr__(&self) -> String {
        format!(
            "OrderBlock('{}', high={}, low={}, start_time={}, created_time={}, mitigated={})",
            self.label,
            self.high,
            self.low,
            self.start_time,
            self.created_time,
            if self.mitigated { "True" } else { "False" }
        )
    }
}

impl From<&RustOrderBlock> for OrderBlock {
    fn from(ob: &RustOrderBlock) -> Self {
        OrderBlock {
            high: ob.high,
            low: ob.low,
            start_time: ob.start_time,
            created_time: ob.created_time,
            pivot_time: ob.pivot_time,
            bias: ob.bias.sign(),
            internal: ob.internal,
            mitigated: ob.mitigated,
            mitigated_time: ob.mitigated_time,
            origin_index: ob.origin_index,
            created_index: ob.created_index,
            pivot_index: ob.pivot_index,
            label: ob.label(),
        }
    }
}

// ============================================================================
// Engine Wrapper
// ============================================================================

/// Incremental order-block detector.
#[pyclass(name = "OrderBlockDetector")]
pub struct PyOrderBlockDetector {
    inner: RustDetector,
}

#[pymethods]
impl PyOrderBlockDetector {
    #[new]
    #[pyo3(signature = (
        swing_length = 50,
        internal_length = 5,
        atr_period = 200,
        max_active_order_blocks = 100
    ))]
    fn new(
        swing_length: usize,
        internal_length: usize,
        atr_period: usize,
        max_active_order_blocks: usize,
    ) -> PyResult<Self> {
        let config = DetectorConfig {
            swing_length,
            internal_length,
            atr_period,
            max_active_order_blocks,
        };
        let inner = RustDetector::new(config).map_err(to_py_err)?;
        Ok(PyOrderBlockDetector { inner })
    }

    /// Process one bar and return the blocks created on it.
    fn add_bar(&mut self, bar: &Bar) -> PyResult<Vec<OrderBlock>> {
        let update = self.inner.add_bar(&RustBar::from(bar)).map_err(to_py_err)?;
        let history = self.inner.order_blocks();
        Ok(update.created.iter().map(|&i| OrderBlock::from(&history[i])).collect())
    }

    /// Process bars in order and return every order block so far.
    fn process(&mut self, bars: Vec<Bar>) -> PyResult<Vec<OrderBlock>> {
        let rust_bars: Vec<RustBar> = bars.iter().map(RustBar::from).collect();
        let blocks = self.inner.process(&rust_bars).map_err(to_py_err)?;
        Ok(blocks.iter().map(OrderBlock::from).collect())
    }

    /// All order blocks in detection order.
    fn order_blocks(&self) -> Vec<OrderBlock> {
        self.inner.order_blocks().iter().map(OrderBlock::from).collect()
    }

    /// Active blocks, most recent first. `internal=None` returns both scopes.
    #[pyo3(signature = (internal = None))]
    fn active_order_blocks(&self, internal: Option<bool>) -> Vec<OrderBlock> {
        let blocks = match internal {
            Some(true) => self.inner.active_order_blocks(Scope::Internal),
            Some(false) => self.inner.active_order_blocks(Scope::Swing),
            None => self.inner.active_order_blocks_all(),
        };
        blocks.into_iter().map(OrderBlock::from).collect()
    }

    /// Current volatility estimate, if any bar has been seen.
    fn atr(&self) -> Option<f64> {
        self.inner.atr()
    }

    /// Get number of processed bars.
    fn bar_count(&self) -> usize {
        self.inner.bar_count()
    }

    /// Clear all state.
    fn reset(&mut self) {
        self.inner.reset();
    }

    fn __repr__(&self) -> String {
        let config = self.inner.config();
        format!(
            "OrderBlockDetector(swing_length={}, internal_length={}, atr_period={}, bars={})",
            config.swing_length,
            config.internal_length,
            config.atr_period,
            self.inner.bar_count()
        )
    }
}

/// Load bars from a JSON file, resampled to "1D", "1W" or "1M".
#[pyfunction]
#[pyo3(signature = (path, timeframe = "1D"))]
fn load_bars(path: &str, timeframe: &str) -> PyResult<Vec<Bar>> {
    let timeframe: Timeframe = timeframe.parse().map_err(to_py_err)?;
    let bars = rust_load_bars(path, timeframe).map_err(to_py_err)?;
    Ok(bars.into_iter().map(Bar::from).collect())
}

// ============================================================================
// Module Definition
// ============================================================================

/// Order-block detection in Rust.
#[pymodule]
fn ob_detector_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Types
    m.add_class::<Bar>()?;
    m.add_class::<OrderBlock>()?;

    // Engine
    m.add_class::<PyOrderBlockDetector>()?;
    m.add_function(wrap_pyfunction!(load_bars, m)?)?;

    Ok(())
}
