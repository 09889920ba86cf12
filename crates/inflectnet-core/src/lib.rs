//! inflectnet Core: Multi-resolution community structure in inflectional networks.
//!
//! This crate contains all analysis logic: null-model simulation, triphone
//! decomposition, lexeme–triphone graph construction, Louvain community
//! detection across a resolution sweep, and hierarchy coefficients.

pub mod config;
pub mod error;
pub mod graph;
pub mod output;
pub mod phases;
pub mod pipeline;
pub mod table;

pub use error::{AnalysisError, Result};
