//! Core data types and configuration for inflectnet analysis.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::{AnalysisError, Result};

/// Which variant of a language's formatives table a unit of work runs on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Original,
    TypefreqShuffled,
    Allshuffled,
}

impl DataType {
    pub const ALL: [DataType; 3] = [
        DataType::Original,
        DataType::TypefreqShuffled,
        DataType::Allshuffled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::TypefreqShuffled => "typefreq_shuffled",
            Self::Allshuffled => "allshuffled",
        }
    }

    pub fn from_str_value(s: &str) -> Option<Self> {
        match s {
            "original" => Some(Self::Original),
            "typefreq_shuffled" => Some(Self::TypefreqShuffled),
            "allshuffled" => Some(Self::Allshuffled),
            _ => None,
        }
    }

    /// The shuffle regime that produces this variant, if any.
    pub fn shuffle_mode(&self) -> Option<ShuffleMode> {
        match self {
            Self::Original => None,
            Self::TypefreqShuffled => Some(ShuffleMode::TypefreqShuffled),
            Self::Allshuffled => Some(ShuffleMode::Allshuffled),
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Null-model shuffle regime.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ShuffleMode {
    /// Permute each column: keeps type frequencies, breaks implicative structure.
    TypefreqShuffled,
    /// Redraw each value from the column's distinct values: breaks both.
    Allshuffled,
}

impl ShuffleMode {
    pub fn as_str(&self) -> &'static str {
        DataType::from(*self).as_str()
    }

    pub fn from_str_value(s: &str) -> Option<Self> {
        DataType::from_str_value(s).and_then(|d| d.shuffle_mode())
    }
}

impl From<ShuffleMode> for DataType {
    fn from(mode: ShuffleMode) -> Self {
        match mode {
            ShuffleMode::TypefreqShuffled => DataType::TypefreqShuffled,
            ShuffleMode::Allshuffled => DataType::Allshuffled,
        }
    }
}

impl std::fmt::Display for ShuffleMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which resolution pairs the hierarchy analysis compares.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PairSelection {
    /// Every ordered pair with lower < higher.
    #[default]
    All,
    /// Only neighbouring resolutions in the sorted sweep.
    Adjacent,
}

/// Inclusive resolution sweep `min, min + step, ..., max`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ResolutionRange {
    #[serde(default = "default_res_min")]
    pub min: f64,
    #[serde(default = "default_res_max")]
    pub max: f64,
    #[serde(default = "default_res_step")]
    pub step: f64,
}

fn default_res_min() -> f64 {
    0.0
}
fn default_res_max() -> f64 {
    2.0
}
fn default_res_step() -> f64 {
    0.1
}

impl Default for ResolutionRange {
    fn default() -> Self {
        Self {
            min: default_res_min(),
            max: default_res_max(),
            step: default_res_step(),
        }
    }
}

impl ResolutionRange {
    pub fn new(min: f64, max: f64, step: f64) -> Result<Self> {
        let range = Self { min, max, step };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<()> {
        let finite = self.min.is_finite() && self.max.is_finite() && self.step.is_finite();
        if !finite || self.min < 0.0 || self.min >= self.max || self.step <= 0.0 {
            return Err(AnalysisError::InvalidResolutionRange {
                min: self.min,
                max: self.max,
                step: self.step,
            });
        }
        Ok(())
    }

    /// Expand the range into its resolution values, rounded to 10 decimals.
    pub fn values(&self) -> Result<Vec<f64>> {
        self.validate()?;
        let count = ((self.max - self.min) / self.step + 1e-9).floor() as usize;
        Ok((0..=count)
            .map(|i| round_resolution(self.min + i as f64 * self.step))
            .collect())
    }
}

/// Strip floating point noise so `0.1 * 3` reads as `0.3`.
pub fn round_resolution(value: f64) -> f64 {
    (value * 1e10).round() / 1e10
}

/// Configuration for an analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Directory of `{language}_formatives.json` files, or a single table file.
    #[serde(default)]
    pub data_path: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Languages to process; `None` processes every language found.
    pub languages: Option<Vec<String>>,
    #[serde(default = "default_data_types")]
    pub data_types: Vec<DataType>,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub resolution: ResolutionRange,
    /// Worker pool size; `None` uses one worker per core.
    pub threads: Option<usize>,
    #[serde(default = "default_max_passes")]
    pub max_passes: usize,
    #[serde(default = "default_max_levels")]
    pub max_levels: usize,
    #[serde(default)]
    pub cell_tagged: bool,
    #[serde(default)]
    pub hierarchy_pairs: PairSelection,
    #[serde(default = "default_write_intermediate")]
    pub write_intermediate: bool,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub quiet: bool,
}

fn default_output_dir() -> String {
    "results".to_string()
}
fn default_data_types() -> Vec<DataType> {
    DataType::ALL.to_vec()
}
fn default_seed() -> u64 {
    42
}
fn default_max_passes() -> usize {
    100
}
fn default_max_levels() -> usize {
    32
}
fn default_write_intermediate() -> bool {
    true
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_path: String::new(),
            output_dir: default_output_dir(),
            languages: None,
            data_types: default_data_types(),
            seed: default_seed(),
            resolution: ResolutionRange::default(),
            threads: None,
            max_passes: default_max_passes(),
            max_levels: default_max_levels(),
            cell_tagged: false,
            hierarchy_pairs: PairSelection::default(),
            write_intermediate: default_write_intermediate(),
            verbose: false,
            quiet: false,
        }
    }
}

/// Serialised bipartite graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphOutput {
    pub nodes: Vec<NodeOutput>,
    pub edges: Vec<EdgeOutput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeOutput {
    pub id: String,
    /// `lexeme` or `triphone`.
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EdgeOutput {
    pub lexeme: String,
    pub triphone: String,
    pub weight: f64,
}

/// Community partition of lexemes at one resolution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommunityLevelOutput {
    pub resolution: f64,
    pub community_count: usize,
    pub modularity: f64,
    pub communities: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommunitiesOutput {
    pub language: String,
    pub data_type: DataType,
    pub levels: Vec<CommunityLevelOutput>,
}

/// One hierarchy coefficient record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HierarchyRecordOutput {
    pub lower: f64,
    pub higher: f64,
    pub coefficient: f64,
    pub group_count: usize,
    pub lower_communities: usize,
    pub higher_communities: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkippedPairOutput {
    pub lower: f64,
    pub higher: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HierarchyOutput {
    pub language: String,
    pub data_type: DataType,
    pub records: Vec<HierarchyRecordOutput>,
    #[serde(default)]
    pub skipped: Vec<SkippedPairOutput>,
}

/// A unit of work that did not complete.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnitFailure {
    pub language: String,
    pub data_type: DataType,
    pub stage: String,
    pub kind: String,
    pub message: String,
}

/// Result of one completed (language, data type) unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitOutput {
    pub language: String,
    pub data_type: DataType,
    pub seed: Option<u64>,
    pub lexemes: usize,
    pub triphones: usize,
    pub edges: usize,
    #[serde(default)]
    pub stage_timings: HashMap<String, f64>,
    pub communities: CommunitiesOutput,
    pub hierarchy: HierarchyOutput,
}

/// Result of an analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub stats: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub units: Vec<UnitOutput>,
    #[serde(default)]
    pub failures: Vec<UnitFailure>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self {
            version: default_version(),
            metadata: HashMap::new(),
            stats: HashMap::new(),
            units: Vec::new(),
            failures: Vec::new(),
        }
    }
}
