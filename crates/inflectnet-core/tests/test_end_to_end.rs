//! Toy three-lexeme network, from table to hierarchy coefficients.

mod common;

use common::*;
use pretty_assertions::assert_eq;

use inflectnet_core::config::PairSelection;
use inflectnet_core::graph::triphones::decompose;
use inflectnet_core::phases::graphs::{build_graph, GraphOptions};
use inflectnet_core::phases::hierarchy::analyze_hierarchy;

#[test]
fn toy_triphones() {
    assert_eq!(decompose("ab").unwrap(), vec!["#ab", "ab#"]);
    assert_eq!(decompose("cd").unwrap(), vec!["#cd", "cd#"]);
}

#[test]
fn toy_graph_shape() {
    let graph = fixture_graph("toy/toy_formatives.json");
    assert_eq!(graph.lexeme_count(), 3);
    assert_eq!(graph.triphone_count(), 4);
    assert_eq!(graph.edge_count(), 6);
    assert_eq!(graph.triphones(), vec!["#ab", "ab#", "#cd", "cd#"]);
    assert_eq!(graph.lexemes(), vec!["L1", "L2", "L3"]);

    for lexeme in ["L1", "L2"] {
        let mut neighbours = graph.lexeme_neighbours(lexeme);
        neighbours.sort_by(|a, b| a.0.cmp(b.0));
        assert_eq!(neighbours, vec![("#ab", 1.0), ("ab#", 1.0)]);
    }
    assert_eq!(graph.edge_weight("L3", "#ab"), None);
    assert_eq!(graph.edge_weight("L3", "cd#"), Some(1.0));
}

#[test]
fn toy_cell_tagged_graph() {
    let table = fixture_table("toy/toy_formatives.json");
    let graph = build_graph(&table, &GraphOptions { cell_tagged: true }).unwrap();
    assert!(graph.has_triphone("#ab-nom.sg"));
    assert!(!graph.has_triphone("#ab"));
    assert_eq!(graph.triphone_count(), 4);
}

#[test]
fn toy_shared_lexemes_grouped() {
    let levels = fixture_levels("toy/toy_formatives.json", &[0.0, 0.5, 1.0]);
    assert_eq!(levels.len(), 3);
    for level in &levels {
        assert!(
            level.partition.same_community("L1", "L2"),
            "L1 and L2 should share a community at r={}",
            level.resolution
        );
        assert!(!level.partition.same_community("L1", "L3"));
        assert_eq!(level.partition.community_count(), 2);
    }
}

#[test]
fn toy_disjoint_lexeme_always_separate() {
    let resolutions = [0.0, 0.5, 1.0, 1.5, 2.0];
    let levels = fixture_levels("toy/toy_formatives.json", &resolutions);
    for level in &levels {
        assert!(!level.partition.same_community("L1", "L3"));
        assert!(!level.partition.same_community("L2", "L3"));
        assert_eq!(level.partition.len(), 3, "Only lexemes are labelled");
    }
}

#[test]
fn toy_hierarchy_is_perfect() {
    let levels = fixture_levels("toy/toy_formatives.json", &[0.0, 0.5, 1.0]);
    let analysis = analyze_hierarchy(&levels, PairSelection::All);
    assert_eq!(analysis.coefficients.len(), 3);
    assert!(analysis.skipped.is_empty());
    for c in &analysis.coefficients {
        assert_eq!(c.coefficient, 1.0);
        assert!(c.lower < c.higher);
    }

    let adjacent = analyze_hierarchy(&levels, PairSelection::Adjacent);
    assert_eq!(adjacent.coefficients.len(), 2);
    assert!(adjacent.get(0.0, 0.5).is_some());
    assert!(adjacent.get(0.0, 1.0).is_none());
}
