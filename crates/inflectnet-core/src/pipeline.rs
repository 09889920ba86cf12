//! Batch orchestrator: every (language, data type) unit runs simulate → graph →
//! communities → hierarchy on a fixed-size worker pool, with per-stage timing.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;

use crate::config::{AnalysisConfig, AnalysisResult, DataType, UnitFailure, UnitOutput};
use crate::error::{AnalysisError, Result};
use crate::output::{
    build_result, communities_output, hierarchy_output, write_json, UnitPaths,
};
use crate::phases::communities::{detect_communities, DetectionOptions};
use crate::phases::graphs::{build_graph, GraphOptions};
use crate::phases::hierarchy::analyze_hierarchy;
use crate::phases::simulation::simulate;
use crate::table::{discover_languages, language_from_path, load_table, FormativesTable};

/// Stage labels for progress reporting.
const STAGE_LABELS: &[(&str, &str)] = &[
    ("load", "Loading formatives"),
    ("simulate", "Simulating null models"),
    ("graphs", "Building triphone networks"),
    ("communities", "Detecting communities"),
    ("hierarchy", "Computing hierarchy coefficients"),
    ("write", "Writing results"),
];

/// Progress callback type: (stage_name, label). Called from worker threads.
pub type ProgressCallback = Box<dyn Fn(&str, &str) + Send + Sync>;

/// A language's table, or the error that stopped it from loading.
pub struct LanguageInput {
    pub language: String,
    pub table: Result<FormativesTable>,
}

fn stage_label(name: &str) -> &str {
    STAGE_LABELS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, l)| *l)
        .unwrap_or(name)
}

/// Resolve `config.data_path` into per-language inputs.
///
/// A file is a single language; a directory is scanned for
/// `{language}_formatives.json`. Requested languages that are absent fail
/// as a whole run.
pub fn load_inputs(config: &AnalysisConfig) -> Result<Vec<LanguageInput>> {
    let path = Path::new(&config.data_path);
    let mut found: Vec<(String, PathBuf)> = if path.is_file() {
        vec![(language_from_path(path), path.to_path_buf())]
    } else {
        discover_languages(path)?
    };

    if let Some(ref wanted) = config.languages {
        if let Some(missing) = wanted.iter().find(|w| !found.iter().any(|(l, _)| l == *w)) {
            return Err(AnalysisError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no formatives table for language {missing:?} in {}", path.display()),
            )));
        }
        found.retain(|(l, _)| wanted.contains(l));
    }

    Ok(found
        .into_iter()
        .map(|(language, file)| LanguageInput {
            table: load_table(&file),
            language,
        })
        .collect())
}

/// Load inputs from `config.data_path` and run every unit.
pub fn run_pipeline(
    config: &AnalysisConfig,
    progress_callback: Option<ProgressCallback>,
) -> Result<AnalysisResult> {
    // Fail fast on configuration before touching data.
    config.resolution.validate()?;
    if let Some(ref cb) = progress_callback {
        cb("load", stage_label("load"));
    }
    let inputs = load_inputs(config)?;
    run_pipeline_on(config, inputs, progress_callback)
}

/// Run every (language, data type) unit over already loaded inputs.
pub fn run_pipeline_on(
    config: &AnalysisConfig,
    inputs: Vec<LanguageInput>,
    progress_callback: Option<ProgressCallback>,
) -> Result<AnalysisResult> {
    let total_start = Instant::now();
    let resolutions = config.resolution.values()?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads.unwrap_or(0))
        .build()
        .map_err(|e| AnalysisError::Io(std::io::Error::other(e.to_string())))?;

    let mut failures: Vec<UnitFailure> = Vec::new();
    let mut units: Vec<(&str, &FormativesTable, DataType)> = Vec::new();
    for input in &inputs {
        match &input.table {
            Ok(table) => {
                for &data_type in &config.data_types {
                    units.push((&input.language, table, data_type));
                }
            }
            Err(e) => {
                log::warn!("Skipping {}: {e}", input.language);
                for &data_type in &config.data_types {
                    failures.push(failure(&input.language, data_type, "load", e));
                }
            }
        }
    }

    log::info!(
        "Running {} units over {} resolutions on {} workers",
        units.len(),
        resolutions.len(),
        pool.current_num_threads()
    );

    let progress = progress_callback.as_deref();
    let outcomes: Vec<std::result::Result<UnitOutput, UnitFailure>> = pool.install(|| {
        units
            .par_iter()
            .map(|&(language, table, data_type)| {
                run_unit(config, language, table, data_type, &resolutions, progress)
            })
            .collect()
    });

    let mut outputs = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(unit) => outputs.push(unit),
            Err(f) => failures.push(f),
        }
    }

    let total_ms = total_start.elapsed().as_secs_f64() * 1000.0;
    Ok(build_result(config, &resolutions, outputs, failures, total_ms))
}

fn failure(language: &str, data_type: DataType, stage: &str, err: &AnalysisError) -> UnitFailure {
    UnitFailure {
        language: language.to_string(),
        data_type,
        stage: stage.to_string(),
        kind: err.kind().to_string(),
        message: err.to_string(),
    }
}

/// Run one unit through all stages. Any error stops this unit only.
pub fn run_unit(
    config: &AnalysisConfig,
    language: &str,
    table: &FormativesTable,
    data_type: DataType,
    resolutions: &[f64],
    progress: Option<&(dyn Fn(&str, &str) + Send + Sync)>,
) -> std::result::Result<UnitOutput, UnitFailure> {
    let mut timings: HashMap<String, f64> = HashMap::new();
    let report = |stage: &str| {
        if let Some(cb) = progress {
            cb(stage, &format!("{} ({language} {data_type})", stage_label(stage)));
        }
    };
    let fail = |stage: &str, e: AnalysisError| {
        log::warn!("{language} {data_type} failed at {stage}: {e}");
        failure(language, data_type, stage, &e)
    };
    let paths = UnitPaths::new(Path::new(&config.output_dir), language, data_type);

    log::info!("Processing {language} {data_type}");

    // ---- simulate ----
    report("simulate");
    let start = Instant::now();
    let (variant, seed): (Cow<'_, FormativesTable>, Option<u64>) = match data_type.shuffle_mode()
    {
        None => (Cow::Borrowed(table), None),
        Some(mode) => {
            let simulated = simulate(table, mode, config.seed);
            if config.write_intermediate {
                write_json(&simulated.to_file(), &paths.simulated)
                    .map_err(|e| fail("simulate", e))?;
            }
            (Cow::Owned(simulated.table), Some(config.seed))
        }
    };
    timings.insert("simulate".to_string(), start.elapsed().as_secs_f64());

    // ---- graphs ----
    report("graphs");
    let start = Instant::now();
    let graph_options = GraphOptions {
        cell_tagged: config.cell_tagged,
    };
    let graph = build_graph(&variant, &graph_options).map_err(|e| fail("graphs", e))?;
    if config.write_intermediate {
        write_json(&graph.to_output(), &paths.graph).map_err(|e| fail("graphs", e))?;
    }
    timings.insert("graphs".to_string(), start.elapsed().as_secs_f64());

    // ---- communities ----
    report("communities");
    let start = Instant::now();
    let detection = DetectionOptions {
        max_passes: config.max_passes,
        max_levels: config.max_levels,
    };
    let levels =
        detect_communities(&graph, resolutions, &detection).map_err(|e| fail("communities", e))?;
    let communities = communities_output(language, data_type, &levels);
    if config.write_intermediate {
        write_json(&communities, &paths.communities).map_err(|e| fail("communities", e))?;
    }
    timings.insert("communities".to_string(), start.elapsed().as_secs_f64());

    // ---- hierarchy ----
    report("hierarchy");
    let start = Instant::now();
    let analysis = analyze_hierarchy(&levels, config.hierarchy_pairs);
    let hierarchy = hierarchy_output(language, data_type, &analysis);
    if config.write_intermediate {
        write_json(&hierarchy, &paths.hierarchy).map_err(|e| fail("hierarchy", e))?;
    }
    timings.insert("hierarchy".to_string(), start.elapsed().as_secs_f64());

    log::info!(
        "Completed {language} {data_type}: {} resolutions, {} hierarchy pairs",
        levels.len(),
        hierarchy.records.len()
    );

    Ok(UnitOutput {
        language: language.to_string(),
        data_type,
        seed,
        lexemes: graph.lexeme_count(),
        triphones: graph.triphone_count(),
        edges: graph.edge_count(),
        stage_timings: timings,
        communities,
        hierarchy,
    })
}
