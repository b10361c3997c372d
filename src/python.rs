use chrono::{Local, NaiveDate};
use pyo3::prelude::*;
use std::path::Path;

use crate::config::PipelineConfig;
use crate::pipeline;
use crate::report::RunReport;

fn load_config(config_path: Option<&str>) -> PyResult<PipelineConfig> {
    PipelineConfig::load(config_path.map(Path::new))
        .map_err(|e| PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string()))
}

// Python callers get the run report as a JSON string
fn report_json(report: Result<RunReport, crate::WarehouseError>) -> PyResult<String> {
    let report = report.map_err(|e| PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(e.to_string()))?;
    serde_json::to_string(&report)
        .map_err(|e| PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(e.to_string()))
}

#[pyfunction]
#[pyo3(signature = (config_path=None, date=None))]
fn load_raw(config_path: Option<&str>, date: Option<&str>) -> PyResult<String> {
    let config = load_config(config_path)?;
    let today = match date {
        Some(date) => NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string()))?,
        None => Local::now().date_naive(),
    };
    report_json(pipeline::run_raw_load(&config, today))
}

#[pyfunction]
#[pyo3(signature = (config_path=None))]
fn build_dimensions(config_path: Option<&str>) -> PyResult<String> {
    let config = load_config(config_path)?;
    report_json(pipeline::run_dimensions(&config))
}

#[pyfunction]
#[pyo3(signature = (config_path=None))]
fn build_fact(config_path: Option<&str>) -> PyResult<String> {
    let config = load_config(config_path)?;
    report_json(pipeline::run_fact(&config))
}

#[pymodule]
#[pyo3(name = "distributor_dw")]
fn distributor_dw(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(load_raw, m)?)?;
    m.add_function(wrap_pyfunction!(build_dimensions, m)?)?;
    m.add_function(wrap_pyfunction!(build_fact, m)?)?;
    Ok(())
}
