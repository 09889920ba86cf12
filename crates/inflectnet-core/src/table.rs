//! Formatives tables: lexeme × cell matrices of exponent lists.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::config::DataType;
use crate::error::{AnalysisError, Result};

/// File-name suffix of a language's formatives table in a data directory.
pub const TABLE_SUFFIX: &str = "_formatives.json";

/// Ordered exponents realising one (lexeme, cell); may be empty.
pub type ExponentList = Vec<String>;

/// A full lexeme × cell matrix. Row and column order are the declared order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormativesTable {
    cells: Vec<String>,
    lexemes: Vec<String>,
    /// values[lexeme][cell]
    values: Vec<Vec<ExponentList>>,
}

impl FormativesTable {
    /// Create an empty table with the given cell schema.
    pub fn new(cells: Vec<String>) -> Result<Self> {
        let mut seen = HashSet::new();
        for cell in &cells {
            if !seen.insert(cell.as_str()) {
                return Err(AnalysisError::InconsistentCellSchema(format!(
                    "duplicate cell {cell:?}"
                )));
            }
        }
        Ok(Self {
            cells,
            lexemes: Vec::new(),
            values: Vec::new(),
        })
    }

    /// Append a lexeme row with one exponent list per declared cell, in cell order.
    pub fn push_row(&mut self, lexeme: &str, row: Vec<ExponentList>) -> Result<()> {
        if row.len() != self.cells.len() {
            return Err(AnalysisError::InconsistentCellSchema(format!(
                "lexeme {lexeme:?} has {} values for {} cells",
                row.len(),
                self.cells.len()
            )));
        }
        if self.lexemes.iter().any(|l| l == lexeme) {
            return Err(AnalysisError::InconsistentCellSchema(format!(
                "duplicate lexeme {lexeme:?}"
            )));
        }
        self.lexemes.push(lexeme.to_string());
        self.values.push(row);
        Ok(())
    }

    /// Append a lexeme row keyed by cell name. Every declared cell must be present.
    pub fn push_named_row(
        &mut self,
        lexeme: &str,
        mut row: IndexMap<String, ExponentList>,
    ) -> Result<()> {
        let mut ordered = Vec::with_capacity(self.cells.len());
        for cell in &self.cells {
            match row.shift_remove(cell) {
                Some(v) => ordered.push(v),
                None => {
                    return Err(AnalysisError::InconsistentCellSchema(format!(
                        "lexeme {lexeme:?} is missing cell {cell:?}"
                    )))
                }
            }
        }
        if let Some(extra) = row.keys().next() {
            return Err(AnalysisError::InconsistentCellSchema(format!(
                "lexeme {lexeme:?} has undeclared cell {extra:?}"
            )));
        }
        self.push_row(lexeme, ordered)
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    pub fn lexemes(&self) -> &[String] {
        &self.lexemes
    }

    pub fn lexeme_count(&self) -> usize {
        self.lexemes.len()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lexemes.is_empty()
    }

    pub fn get(&self, lexeme: &str, cell: &str) -> Option<&ExponentList> {
        let li = self.lexemes.iter().position(|l| l == lexeme)?;
        let ci = self.cells.iter().position(|c| c == cell)?;
        Some(&self.values[li][ci])
    }

    /// Iterate rows as (lexeme, values in cell order).
    pub fn rows(&self) -> impl Iterator<Item = (&str, &[ExponentList])> {
        self.lexemes
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Vec::as_slice))
    }

    /// Column values in lexeme order.
    pub fn column(&self, cell_idx: usize) -> Vec<ExponentList> {
        self.values.iter().map(|row| row[cell_idx].clone()).collect()
    }

    /// Overwrite a column; `column` must have one value per lexeme.
    pub(crate) fn set_column(&mut self, cell_idx: usize, column: Vec<ExponentList>) {
        debug_assert_eq!(column.len(), self.values.len());
        for (row, value) in self.values.iter_mut().zip(column) {
            row[cell_idx] = value;
        }
    }

    pub fn to_file(&self) -> TableFile {
        TableFile {
            cells: self.cells.clone(),
            rows: self
                .rows()
                .map(|(lexeme, values)| RowFile {
                    lexeme: lexeme.to_string(),
                    cells: self.cells.iter().cloned().zip(values.iter().cloned()).collect(),
                })
                .collect(),
        }
    }

    pub fn from_file(file: TableFile) -> Result<Self> {
        let mut table = Self::new(file.cells)?;
        for row in file.rows {
            table.push_named_row(&row.lexeme, row.cells)?;
        }
        Ok(table)
    }
}

/// On-disk JSON shape of a formatives table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableFile {
    pub cells: Vec<String>,
    pub rows: Vec<RowFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowFile {
    pub lexeme: String,
    /// Cells in declared order.
    pub cells: IndexMap<String, ExponentList>,
}

/// A null-model variant of a formatives table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedTable {
    pub table: FormativesTable,
    pub provenance: DataType,
    pub seed: u64,
}

/// On-disk JSON shape of a simulated table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedTableFile {
    pub provenance: DataType,
    pub seed: u64,
    #[serde(flatten)]
    pub table: TableFile,
}

impl SimulatedTable {
    pub fn to_file(&self) -> SimulatedTableFile {
        SimulatedTableFile {
            provenance: self.provenance,
            seed: self.seed,
            table: self.table.to_file(),
        }
    }
}

/// Load and validate a formatives table from a JSON file.
pub fn load_table(path: &Path) -> Result<FormativesTable> {
    let raw = std::fs::read_to_string(path)?;
    let file: TableFile = serde_json::from_str(&raw)?;
    let table = FormativesTable::from_file(file)?;
    log::info!(
        "Loaded {} lexemes with {} cells from {}",
        table.lexeme_count(),
        table.cell_count(),
        path.display()
    );
    Ok(table)
}

/// Find `{language}_formatives.json` files directly under `dir`, sorted by language.
pub fn discover_languages(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| std::io::Error::other(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if let Some(language) = name.strip_suffix(TABLE_SUFFIX) {
            if !language.is_empty() {
                found.push((language.to_string(), entry.path().to_path_buf()));
            }
        }
    }
    found.sort();
    Ok(found)
}

/// Language name for a single table file: the file stem without `_formatives`.
pub fn language_from_path(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    match name.strip_suffix(TABLE_SUFFIX) {
        Some(lang) if !lang.is_empty() => lang.to_string(),
        _ => path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "table".to_string()),
    }
}
