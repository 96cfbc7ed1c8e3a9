//! stepagg-python
//!
//! Python bindings for stepagg-core (PyO3).
//! Queries return JSON strings shaped for the presentation layer.

use std::path::PathBuf;
use std::sync::Mutex;

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use stepagg_core::api::{to_json, Aggregator, ResetSource};
use stepagg_core::config::AggregatorConfig;
use stepagg_core::reaper::ReaperCycle;
use stepagg_core::telemetry::init_tracing;

fn json_err(e: serde_json::Error) -> PyErr {
    PyValueError::new_err(e.to_string())
}

#[pyclass(name = "Aggregator")]
struct PyAggregator {
    inner: Aggregator,
    reaper: Mutex<Option<ReaperCycle>>,
}

#[pymethods]
impl PyAggregator {
    #[new]
    #[pyo3(signature = (store_path=None, max_age_secs=None, max_devices=None, sanity_ceiling=None, reap_interval_ms=None))]
    fn new(
        store_path: Option<PathBuf>,
        max_age_secs: Option<u64>,
        max_devices: Option<usize>,
        sanity_ceiling: Option<u64>,
        reap_interval_ms: Option<u64>,
    ) -> PyResult<Self> {
        let defaults = AggregatorConfig::default();
        let config = AggregatorConfig {
            max_age_secs: max_age_secs.unwrap_or(defaults.max_age_secs),
            reap_interval_ms: reap_interval_ms.unwrap_or(defaults.reap_interval_ms),
            sanity_ceiling: sanity_ceiling.unwrap_or(defaults.sanity_ceiling),
            max_devices: max_devices.unwrap_or(defaults.max_devices),
            store_path,
        };
        let inner = Aggregator::new(config).map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(Self { inner, reaper: Mutex::new(None) })
    }

    /// Feed one raw radio record. Returns True when it decoded and was applied.
    fn ingest(&self, py: Python<'_>, record: &[u8]) -> bool {
        let bytes = record.to_vec();
        py.allow_threads(|| self.inner.ingest_bytes(&bytes).is_some())
    }

    /// Run one reaper pass; returns the number of evicted devices.
    fn tick(&self, py: Python<'_>) -> usize {
        py.allow_threads(|| self.inner.tick().len())
    }

    fn total(&self) -> u64 {
        self.inner.total()
    }

    fn summary(&self) -> PyResult<String> {
        to_json(&self.inner.get_summary()).map_err(json_err)
    }

    #[pyo3(signature = (wifi_connected=false))]
    fn status(&self, wifi_connected: bool) -> PyResult<String> {
        to_json(&self.inner.status(wifi_connected)).map_err(json_err)
    }

    fn devices(&self) -> PyResult<String> {
        to_json(&self.inner.list_devices()).map_err(json_err)
    }

    fn counters(&self) -> PyResult<String> {
        to_json(&self.inner.counters()).map_err(json_err)
    }

    fn reset(&self, py: Python<'_>) -> &'static str {
        py.allow_threads(|| self.inner.reset())
    }

    /// Debounced hardware button edge.
    fn button_reset(&self, py: Python<'_>) -> &'static str {
        py.allow_threads(|| self.inner.reset_from(ResetSource::Button))
    }

    fn start_reaper(&self) -> PyResult<()> {
        let mut slot = self.reaper.lock().map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
        if slot.is_none() {
            let cycle = self.inner.spawn_reaper().map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
            *slot = Some(cycle);
        }
        Ok(())
    }

    fn stop_reaper(&self, py: Python<'_>) -> PyResult<()> {
        let cycle = self
            .reaper
            .lock()
            .map_err(|e| PyRuntimeError::new_err(e.to_string()))?
            .take();
        if let Some(cycle) = cycle {
            py.allow_threads(|| cycle.stop());
        }
        Ok(())
    }
}

/// Install a stderr log subscriber (`RUST_LOG` overrides `level`).
#[pyfunction]
#[pyo3(signature = (level="info"))]
fn init_logging(level: &str) -> bool {
    init_tracing(level)
}

/// Python module entry point
#[pymodule]
fn stepagg(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyAggregator>()?;
    m.add_function(wrap_pyfunction!(init_logging, m)?)?;
    Ok(())
}
