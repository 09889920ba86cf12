//! PyO3 bindings for the inflectnet analysis engine.

use pyo3::prelude::*;
use pyo3::types::PyDict;

use inflectnet_core::config::{AnalysisConfig, DataType, PairSelection, ResolutionRange};
use inflectnet_core::pipeline;

/// Python-visible analysis configuration.
#[pyclass]
#[derive(Clone)]
struct PyAnalysisConfig {
    #[pyo3(get, set)]
    data_path: String,
    #[pyo3(get, set)]
    output_dir: String,
    #[pyo3(get, set)]
    languages: Option<Vec<String>>,
    #[pyo3(get, set)]
    data_types: Vec<String>,
    #[pyo3(get, set)]
    seed: u64,
    #[pyo3(get, set)]
    res_min: f64,
    #[pyo3(get, set)]
    res_max: f64,
    #[pyo3(get, set)]
    res_step: f64,
    #[pyo3(get, set)]
    threads: Option<usize>,
    #[pyo3(get, set)]
    cell_tagged: bool,
    #[pyo3(get, set)]
    adjacent_only: bool,
    #[pyo3(get, set)]
    write_intermediate: bool,
    #[pyo3(get, set)]
    verbose: bool,
    #[pyo3(get, set)]
    quiet: bool,
}

#[pymethods]
#[allow(clippy::too_many_arguments)]
impl PyAnalysisConfig {
    #[new]
    #[pyo3(signature = (
        data_path = String::new(),
        output_dir = String::from("results"),
        languages = None,
        data_types = vec![
            String::from("original"),
            String::from("typefreq_shuffled"),
            String::from("allshuffled"),
        ],
        seed = 42,
        res_min = 0.0,
        res_max = 2.0,
        res_step = 0.1,
        threads = None,
        cell_tagged = false,
        adjacent_only = false,
        write_intermediate = true,
        verbose = false,
        quiet = false,
    ))]
    fn new(
        data_path: String,
        output_dir: String,
        languages: Option<Vec<String>>,
        data_types: Vec<String>,
        seed: u64,
        res_min: f64,
        res_max: f64,
        res_step: f64,
        threads: Option<usize>,
        cell_tagged: bool,
        adjacent_only: bool,
        write_intermediate: bool,
        verbose: bool,
        quiet: bool,
    ) -> Self {
        Self {
            data_path,
            output_dir,
            languages,
            data_types,
            seed,
            res_min,
            res_max,
            res_step,
            threads,
            cell_tagged,
            adjacent_only,
            write_intermediate,
            verbose,
            quiet,
        }
    }
}

impl TryFrom<PyAnalysisConfig> for AnalysisConfig {
    type Error = PyErr;

    fn try_from(py_config: PyAnalysisConfig) -> PyResult<Self> {
        let data_types = py_config
            .data_types
            .iter()
            .map(|s| {
                DataType::from_str_value(s).ok_or_else(|| {
                    pyo3::exceptions::PyValueError::new_err(format!("unknown data type: {s}"))
                })
            })
            .collect::<PyResult<Vec<_>>>()?;

        Ok(AnalysisConfig {
            data_path: py_config.data_path,
            output_dir: py_config.output_dir,
            languages: py_config.languages,
            data_types,
            seed: py_config.seed,
            resolution: ResolutionRange {
                min: py_config.res_min,
                max: py_config.res_max,
                step: py_config.res_step,
            },
            threads: py_config.threads,
            cell_tagged: py_config.cell_tagged,
            hierarchy_pairs: if py_config.adjacent_only {
                PairSelection::Adjacent
            } else {
                PairSelection::All
            },
            write_intermediate: py_config.write_intermediate,
            verbose: py_config.verbose,
            quiet: py_config.quiet,
            ..Default::default()
        })
    }
}

/// Analyse formatives tables and return the run summary as a Python dict.
#[pyfunction]
#[pyo3(signature = (path, config = None, progress = None))]
fn analyze(
    py: Python<'_>,
    path: &str,
    config: Option<PyAnalysisConfig>,
    progress: Option<PyObject>,
) -> PyResult<Py<PyDict>> {
    let analysis_config = match config {
        Some(c) => {
            let mut cfg = AnalysisConfig::try_from(c)?;
            cfg.data_path = path.to_string();
            cfg
        }
        None => AnalysisConfig {
            data_path: path.to_string(),
            ..Default::default()
        },
    };

    // Wrap the Python callable as a Rust ProgressCallback
    let progress_callback = progress.map(|py_cb| -> pipeline::ProgressCallback {
        Box::new(move |stage: &str, label: &str| {
            Python::with_gil(|py| {
                let _ = py_cb.call1(py, (stage, label));
            });
        })
    });

    // Workers call back into Python, so the GIL must be free while they run.
    let result = py
        .allow_threads(|| pipeline::run_pipeline(&analysis_config, progress_callback))
        .map_err(|e| pyo3::exceptions::PyRuntimeError::new_err(e.to_string()))?;

    let json_str = serde_json::to_string(&result)
        .map_err(|e: serde_json::Error| pyo3::exceptions::PyRuntimeError::new_err(e.to_string()))?;

    let json_module = py.import("json")?;
    let py_dict = json_module
        .call_method1("loads", (json_str,))?
        .extract::<Py<PyDict>>()?;

    Ok(py_dict)
}

/// Return the inflectnet engine version.
#[pyfunction]
fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// inflectnet Rust analysis engine.
#[pymodule]
fn _inflectnet_rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(analyze, m)?)?;
    m.add_function(wrap_pyfunction!(version, m)?)?;
    m.add_class::<PyAnalysisConfig>()?;
    Ok(())
}
