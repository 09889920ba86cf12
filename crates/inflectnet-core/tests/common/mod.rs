//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use inflectnet_core::config::{AnalysisConfig, ResolutionRange};
use inflectnet_core::graph::bipartite::BipartiteGraph;
use inflectnet_core::phases::communities::{detect_communities, DetectionOptions, ResolutionLevel};
use inflectnet_core::phases::graphs::{build_graph, GraphOptions};
use inflectnet_core::table::{load_table, FormativesTable};

// ---------------------------------------------------------------------------
// Fixture path resolution
// ---------------------------------------------------------------------------

/// Resolve `tests/fixtures/{name}` relative to the workspace root.
pub fn fixture_path(name: &str) -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    Path::new(manifest_dir)
        .join("../../tests/fixtures")
        .join(name)
        .canonicalize()
        .unwrap_or_else(|_| {
            Path::new(manifest_dir)
                .join("../../tests/fixtures")
                .join(name)
        })
}

/// Load `tests/fixtures/{name}` as a formatives table.
pub fn fixture_table(name: &str) -> FormativesTable {
    load_table(&fixture_path(name)).expect("Failed to load fixture table")
}

// ---------------------------------------------------------------------------
// Phase runners
// ---------------------------------------------------------------------------

/// Build the plain (untagged) graph of a fixture table.
pub fn fixture_graph(name: &str) -> BipartiteGraph {
    build_graph(&fixture_table(name), &GraphOptions::default()).expect("Failed to build graph")
}

/// Build a fixture's graph and detect communities at each resolution.
pub fn fixture_levels(name: &str, resolutions: &[f64]) -> Vec<ResolutionLevel> {
    detect_communities(
        &fixture_graph(name),
        resolutions,
        &DetectionOptions::default(),
    )
    .expect("Community detection failed")
}

/// Config over a fixture path writing into `output_dir`.
pub fn fixture_config(name: &str, output_dir: &Path, min: f64, max: f64, step: f64) -> AnalysisConfig {
    AnalysisConfig {
        data_path: fixture_path(name).to_string_lossy().to_string(),
        output_dir: output_dir.to_string_lossy().to_string(),
        resolution: ResolutionRange { min, max, step },
        threads: Some(2),
        ..Default::default()
    }
}
