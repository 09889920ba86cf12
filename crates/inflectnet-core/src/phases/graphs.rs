//! Lexeme–triphone network construction from a formatives table.

use crate::error::{AnalysisError, Result};
use crate::graph::bipartite::BipartiteGraph;
use crate::graph::triphones::decompose;
use crate::table::FormativesTable;

/// Options for graph construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphOptions {
    /// Key triphone nodes by cell (`"#ab-gen.pl"`) instead of by string alone.
    pub cell_tagged: bool,
}

/// Build the weighted bipartite graph of a table.
///
/// A cell with `k` exponents adds `1/k` per triphone occurrence to the
/// (lexeme, triphone) edge; repeated triphones accumulate. Every lexeme gets a
/// node, including lexemes whose cells are all empty.
pub fn build_graph(table: &FormativesTable, options: &GraphOptions) -> Result<BipartiteGraph> {
    let mut graph = BipartiteGraph::new();

    // Lexemes first: keeps node order stable across table variants.
    for lexeme in table.lexemes() {
        graph.ensure_lexeme(lexeme);
    }

    let mut cells_used = 0usize;
    for (lexeme, values) in table.rows() {
        for (cell, exponents) in table.cells().iter().zip(values) {
            if exponents.is_empty() {
                continue;
            }
            cells_used += 1;
            let weight = 1.0 / exponents.len() as f64;

            for exponent in exponents {
                let triphones = decompose(exponent).map_err(|e| match e {
                    AnalysisError::MalformedExponent { exponent, reason } => {
                        AnalysisError::MalformedExponent {
                            exponent,
                            reason: format!("{reason} (lexeme {lexeme:?}, cell {cell:?})"),
                        }
                    }
                    other => other,
                })?;
                for triphone in &triphones {
                    if options.cell_tagged {
                        graph.add_weight(lexeme, &format!("{triphone}-{cell}"), weight);
                    } else {
                        graph.add_weight(lexeme, triphone, weight);
                    }
                }
            }
        }
    }

    log::info!(
        "Built graph: {} lexemes, {} triphones, {} edges from {cells_used} non-empty cells",
        graph.lexeme_count(),
        graph.triphone_count(),
        graph.edge_count()
    );

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn single_exponent_weight_is_one() {
        let mut t = FormativesTable::new(strings(&["sg"])).unwrap();
        t.push_row("L1", vec![strings(&["ab"])]).unwrap();
        let g = build_graph(&t, &GraphOptions::default()).unwrap();
        assert_eq!(g.triphone_count(), 2);
        assert!(close(g.edge_weight("L1", "#ab").unwrap(), 1.0));
        assert!(close(g.edge_weight("L1", "ab#").unwrap(), 1.0));
    }

    #[test]
    fn co_exponents_split_weight() {
        let mut t = FormativesTable::new(strings(&["pl"])).unwrap();
        t.push_row("L1", vec![strings(&["ab", "cd", "ef"])]).unwrap();
        let g = build_graph(&t, &GraphOptions::default()).unwrap();
        for tri in ["#ab", "ab#", "#cd", "cd#", "#ef", "ef#"] {
            assert!(close(g.edge_weight("L1", tri).unwrap(), 1.0 / 3.0), "{tri}");
        }
    }

    #[test]
    fn contributions_accumulate_across_cells() {
        let mut t = FormativesTable::new(strings(&["sg", "pl"])).unwrap();
        t.push_row("L1", vec![strings(&["a"]), strings(&["a", "b"])]).unwrap();
        let g = build_graph(&t, &GraphOptions::default()).unwrap();
        assert!(close(g.edge_weight("L1", "#a#").unwrap(), 1.5));
        assert!(close(g.edge_weight("L1", "#b#").unwrap(), 0.5));
    }

    #[test]
    fn repeated_triphone_in_one_exponent_accumulates() {
        let mut t = FormativesTable::new(strings(&["sg"])).unwrap();
        t.push_row("L1", vec![strings(&["aaaa"])]).unwrap();
        let g = build_graph(&t, &GraphOptions::default()).unwrap();
        assert!(close(g.edge_weight("L1", "aaa").unwrap(), 2.0));
    }

    #[test]
    fn empty_lexeme_is_isolated_node() {
        let mut t = FormativesTable::new(strings(&["sg"])).unwrap();
        t.push_row("L1", vec![strings(&["a"])]).unwrap();
        t.push_row("L2", vec![vec![]]).unwrap();
        let g = build_graph(&t, &GraphOptions::default()).unwrap();
        assert_eq!(g.lexeme_count(), 2);
        assert_eq!(g.lexeme_degree("L2"), 0.0);
    }

    #[test]
    fn cell_tagging_separates_cells() {
        let mut t = FormativesTable::new(strings(&["sg", "pl"])).unwrap();
        t.push_row("L1", vec![strings(&["a"]), strings(&["a"])]).unwrap();
        let g = build_graph(&t, &GraphOptions { cell_tagged: true }).unwrap();
        assert_eq!(g.triphone_count(), 2);
        assert!(g.has_triphone("#a#-sg"));
        assert!(close(g.edge_weight("L1", "#a#-pl").unwrap(), 1.0));
    }

    #[test]
    fn malformed_exponent_names_location() {
        let mut t = FormativesTable::new(strings(&["sg"])).unwrap();
        t.push_row("L1", vec![strings(&[""])]).unwrap();
        let err = build_graph(&t, &GraphOptions::default()).unwrap_err();
        match err {
            AnalysisError::MalformedExponent { reason, .. } => {
                assert!(reason.contains("L1"));
                assert!(reason.contains("sg"));
            }
            other => panic!("unexpected error {other}"),
        }
    }
}
