//! Error kinds raised by the analysis engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Malformed exponent {exponent:?}: {reason}")]
    MalformedExponent { exponent: String, reason: String },

    #[error("Graph has no lexeme nodes to detect communities over")]
    EmptyGraph,

    #[error("No higher-resolution community with two or more lexemes for pair ({lower}, {higher})")]
    NoComparablePairs { lower: f64, higher: f64 },

    #[error("Invalid resolution range: min={min}, max={max}, step={step}")]
    InvalidResolutionRange { min: f64, max: f64, step: f64 },

    #[error("Inconsistent cell schema: {0}")]
    InconsistentCellSchema(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalysisError {
    /// Short stable name of the error kind, used in failure reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedExponent { .. } => "MalformedExponent",
            Self::EmptyGraph => "EmptyGraphError",
            Self::NoComparablePairs { .. } => "NoComparablePairs",
            Self::InvalidResolutionRange { .. } => "InvalidResolutionRange",
            Self::InconsistentCellSchema(_) => "InconsistentCellSchema",
            Self::Io(_) => "Io",
            Self::Json(_) => "Json",
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
