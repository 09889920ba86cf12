//! JSON serialisation of simulated tables, graphs, partitions and hierarchy records.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;

use crate::config::{
    AnalysisConfig, AnalysisResult, CommunitiesOutput, CommunityLevelOutput, DataType,
    HierarchyOutput, HierarchyRecordOutput, SkippedPairOutput, UnitFailure, UnitOutput,
};
use crate::error::Result;
use crate::phases::communities::ResolutionLevel;
use crate::phases::hierarchy::HierarchyAnalysis;

/// Output file locations of one (language, data type) unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitPaths {
    pub simulated: PathBuf,
    pub graph: PathBuf,
    pub communities: PathBuf,
    pub hierarchy: PathBuf,
}

impl UnitPaths {
    pub fn new(output_dir: &Path, language: &str, data_type: DataType) -> Self {
        Self {
            simulated: output_dir
                .join("simulated")
                .join(format!("{language}_{data_type}.json")),
            graph: output_dir
                .join("graphs")
                .join(format!("{language}_{data_type}_bipartite.json")),
            communities: output_dir
                .join("communities")
                .join(format!("community_detection_{language}_{data_type}.json")),
            hierarchy: output_dir
                .join("hierarchy")
                .join(format!("hierarchy_{language}_{data_type}.json")),
        }
    }
}

/// Write any serialisable value as pretty JSON, creating parent directories.
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Per-resolution lexeme partitions of one unit.
pub fn communities_output(
    language: &str,
    data_type: DataType,
    levels: &[ResolutionLevel],
) -> CommunitiesOutput {
    CommunitiesOutput {
        language: language.to_string(),
        data_type,
        levels: levels
            .iter()
            .map(|level| CommunityLevelOutput {
                resolution: level.resolution,
                community_count: level.partition.community_count(),
                modularity: (level.modularity * 1e6).round() / 1e6,
                communities: level.partition.labels().clone(),
            })
            .collect(),
    }
}

/// Hierarchy records of one unit.
pub fn hierarchy_output(
    language: &str,
    data_type: DataType,
    analysis: &HierarchyAnalysis,
) -> HierarchyOutput {
    HierarchyOutput {
        language: language.to_string(),
        data_type,
        records: analysis
            .coefficients
            .iter()
            .map(|c| HierarchyRecordOutput {
                lower: c.lower,
                higher: c.higher,
                coefficient: c.coefficient,
                group_count: c.group_count,
                lower_communities: c.lower_communities,
                higher_communities: c.higher_communities,
            })
            .collect(),
        skipped: analysis
            .skipped
            .iter()
            .map(|&(lower, higher)| SkippedPairOutput {
                lower,
                higher,
                reason: "NoComparablePairs".to_string(),
            })
            .collect(),
    }
}

/// Assemble the run summary.
pub fn build_result(
    config: &AnalysisConfig,
    resolutions: &[f64],
    mut units: Vec<UnitOutput>,
    mut failures: Vec<UnitFailure>,
    total_ms: f64,
) -> AnalysisResult {
    units.sort_by(|a, b| (&a.language, a.data_type).cmp(&(&b.language, b.data_type)));
    failures.sort_by(|a, b| (&a.language, a.data_type).cmp(&(&b.language, b.data_type)));

    let mut languages: Vec<&str> = units
        .iter()
        .map(|u| u.language.as_str())
        .chain(failures.iter().map(|f| f.language.as_str()))
        .collect();
    languages.sort_unstable();
    languages.dedup();

    // Build metadata
    let mut metadata = HashMap::new();
    metadata.insert(
        "data_path".to_string(),
        serde_json::Value::String(config.data_path.clone()),
    );
    metadata.insert(
        "analysed_at".to_string(),
        serde_json::Value::String(Utc::now().to_rfc3339()),
    );
    metadata.insert(
        "inflectnet_version".to_string(),
        serde_json::Value::String(env!("CARGO_PKG_VERSION").to_string()),
    );
    metadata.insert("seed".to_string(), serde_json::json!(config.seed));
    metadata.insert(
        "resolutions".to_string(),
        serde_json::to_value(resolutions).unwrap_or_default(),
    );
    metadata.insert(
        "cell_tagged".to_string(),
        serde_json::Value::Bool(config.cell_tagged),
    );
    metadata.insert(
        "hierarchy_pairs".to_string(),
        serde_json::to_value(config.hierarchy_pairs).unwrap_or_default(),
    );
    metadata.insert(
        "analysis_duration_ms".to_string(),
        serde_json::json!(((total_ms * 10.0).round() / 10.0)),
    );

    // Build stats
    let mut stats = HashMap::new();
    stats.insert("languages".to_string(), serde_json::json!(languages.len()));
    stats.insert("units".to_string(), serde_json::json!(units.len()));
    stats.insert("failures".to_string(), serde_json::json!(failures.len()));
    stats.insert(
        "resolutions".to_string(),
        serde_json::json!(resolutions.len()),
    );
    stats.insert(
        "hierarchy_records".to_string(),
        serde_json::json!(units.iter().map(|u| u.hierarchy.records.len()).sum::<usize>()),
    );
    stats.insert(
        "skipped_pairs".to_string(),
        serde_json::json!(units.iter().map(|u| u.hierarchy.skipped.len()).sum::<usize>()),
    );

    AnalysisResult {
        version: "1.0".to_string(),
        metadata,
        stats,
        units,
        failures,
    }
}

/// Write the run summary to a JSON file.
pub fn write_output(result: &AnalysisResult, output_path: &str) -> std::io::Result<()> {
    if let Some(parent) = Path::new(output_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(result).map_err(std::io::Error::other)?;
    std::fs::write(output_path, json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phases::communities::LexemePartition;
    use crate::phases::hierarchy::HierarchyCoefficient;

    #[test]
    fn unit_paths_layout() {
        let p = UnitPaths::new(Path::new("out"), "bcms", DataType::Allshuffled);
        assert_eq!(p.simulated, Path::new("out/simulated/bcms_allshuffled.json"));
        assert_eq!(p.graph, Path::new("out/graphs/bcms_allshuffled_bipartite.json"));
        assert_eq!(
            p.communities,
            Path::new("out/communities/community_detection_bcms_allshuffled.json")
        );
        assert_eq!(p.hierarchy, Path::new("out/hierarchy/hierarchy_bcms_allshuffled.json"));
    }

    #[test]
    fn communities_output_counts() {
        let levels = vec![ResolutionLevel {
            resolution: 0.5,
            partition: LexemePartition::from_groups(&[vec!["A", "B"], vec!["C"]]),
            modularity: 0.123456789,
        }];
        let out = communities_output("toy", DataType::Original, &levels);
        assert_eq!(out.levels[0].community_count, 2);
        assert_eq!(out.levels[0].modularity, 0.123457);
        assert_eq!(out.levels[0].communities["C"], 1);
    }

    #[test]
    fn hierarchy_output_keeps_skipped() {
        let analysis = HierarchyAnalysis {
            coefficients: vec![HierarchyCoefficient {
                lower: 0.0,
                higher: 0.1,
                coefficient: 1.0,
                group_count: 1,
                lower_communities: 1,
                higher_communities: 2,
            }],
            skipped: vec![(0.1, 0.2)],
        };
        let out = hierarchy_output("toy", DataType::Original, &analysis);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.skipped[0].reason, "NoComparablePairs");
    }

    #[test]
    fn stats_keys_present() {
        let config = AnalysisConfig::default();
        let result = build_result(&config, &[0.0, 1.0], Vec::new(), Vec::new(), 10.0);
        for key in [
            "languages",
            "units",
            "failures",
            "resolutions",
            "hierarchy_records",
            "skipped_pairs",
        ] {
            assert!(result.stats.contains_key(key), "Missing stat key: {key}");
        }
        assert!(result.metadata.contains_key("analysed_at"));
        assert!(result.metadata.contains_key("inflectnet_version"));
    }

    #[test]
    fn write_json_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/c.json");
        write_json(&serde_json::json!({"x": 1}), &path).unwrap();
        let back: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back["x"], 1);
    }
}
