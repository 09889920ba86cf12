//! Multi-resolution community detection via the Louvain algorithm.
//!
//! Pure Rust implementation: the network is flattened into an immutable
//! index arena (`AdjList`) and each resolution runs the local-move and
//! aggregation phases over an explicit working partition.

use std::borrow::Cow;
use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::error::{AnalysisError, Result};
use crate::graph::bipartite::BipartiteGraph;

/// Minimum modularity gain for a move to count as an improvement.
const GAIN_EPSILON: f64 = 1e-12;

/// Iteration bounds for the local search.
#[derive(Debug, Clone, Copy)]
pub struct DetectionOptions {
    /// Maximum sweeps over all nodes within one level.
    pub max_passes: usize,
    /// Maximum aggregation levels.
    pub max_levels: usize,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            max_passes: 100,
            max_levels: 32,
        }
    }
}

// ---------------------------------------------------------------------------
// Lexeme partitions
// ---------------------------------------------------------------------------

/// Community label per lexeme. Labels only express co-membership; the same
/// label at two resolutions says nothing about the two communities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LexemePartition {
    labels: BTreeMap<String, usize>,
}

impl LexemePartition {
    /// Build from explicit groups; group `i` gets label `i`.
    pub fn from_groups<S: AsRef<str>>(groups: &[Vec<S>]) -> Self {
        let labels = groups
            .iter()
            .enumerate()
            .flat_map(|(label, members)| {
                members.iter().map(move |m| (m.as_ref().to_string(), label))
            })
            .collect();
        Self { labels }
    }

    pub fn label(&self, lexeme: &str) -> Option<usize> {
        self.labels.get(lexeme).copied()
    }

    /// True when both lexemes are present and share a community.
    pub fn same_community(&self, a: &str, b: &str) -> bool {
        match (self.label(a), self.label(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &BTreeMap<String, usize> {
        &self.labels
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.labels.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Communities as sorted member lists, ordered by their first member.
    pub fn communities(&self) -> Vec<Vec<String>> {
        let mut groups: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        for (lexeme, &label) in &self.labels {
            groups.entry(label).or_default().push(lexeme.clone());
        }
        let mut out: Vec<Vec<String>> = groups.into_values().collect();
        out.sort();
        out
    }

    pub fn community_count(&self) -> usize {
        let mut labels: Vec<usize> = self.labels.values().copied().collect();
        labels.sort_unstable();
        labels.dedup();
        labels.len()
    }
}

/// Lexeme partition found at one resolution.
#[derive(Debug, Clone)]
pub struct ResolutionLevel {
    pub resolution: f64,
    pub partition: LexemePartition,
    /// Resolution-weighted modularity of the full (lexeme + triphone) partition.
    pub modularity: f64,
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Run Louvain once per resolution and keep only lexeme nodes.
///
/// Resolutions are independent and run in parallel; the result follows the
/// input order.
pub fn detect_communities(
    graph: &BipartiteGraph,
    resolutions: &[f64],
    options: &DetectionOptions,
) -> Result<Vec<ResolutionLevel>> {
    if graph.lexeme_count() == 0 {
        return Err(AnalysisError::EmptyGraph);
    }
    if let Some(&bad) = resolutions.iter().find(|r| !r.is_finite() || **r < 0.0) {
        return Err(AnalysisError::InvalidResolutionRange {
            min: bad,
            max: bad,
            step: 0.0,
        });
    }

    let adj = AdjList::from_graph(graph);
    log::info!(
        "Running community detection at {} resolution levels over {} nodes",
        resolutions.len(),
        adj.len()
    );

    Ok(resolutions
        .par_iter()
        .map(|&resolution| detect_at_resolution(graph, &adj, resolution, options))
        .collect())
}

/// Run Louvain at one resolution over a prepared arena of `graph`.
pub fn detect_at_resolution(
    graph: &BipartiteGraph,
    adj: &AdjList,
    resolution: f64,
    options: &DetectionOptions,
) -> ResolutionLevel {
    let communities = louvain(adj, resolution, options);
    let modularity = modularity(adj, &communities, resolution);
    let partition = project_to_lexemes(graph, &communities);
    log::debug!(
        "Resolution {resolution}: {} lexeme communities, Q = {modularity:.4}",
        partition.community_count()
    );
    ResolutionLevel {
        resolution,
        partition,
        modularity,
    }
}

/// Drop triphone nodes; relabel lexeme communities `0..n` in lexeme order.
fn project_to_lexemes(graph: &BipartiteGraph, communities: &[usize]) -> LexemePartition {
    let inner = graph.inner();
    let mut relabel: BTreeMap<usize, usize> = BTreeMap::new();
    let mut labels = BTreeMap::new();
    for (idx, node) in inner.node_weights().enumerate() {
        if !node.is_lexeme() {
            continue;
        }
        let next = relabel.len();
        let label = *relabel.entry(communities[idx]).or_insert(next);
        labels.insert(node.id().to_string(), label);
    }
    LexemePartition { labels }
}

// ---------------------------------------------------------------------------
// Adjacency arena for undirected weighted graph
// ---------------------------------------------------------------------------

/// Node-index arena of an undirected weighted graph. Each non-loop edge is
/// listed under both endpoints; self-loops live in `self_loops`.
#[derive(Debug, Clone, Default)]
pub struct AdjList {
    /// adjacency: index -> Vec<(neighbour_index, weight)>
    adj: Vec<Vec<(usize, f64)>>,
    /// index -> self-loop weight (internal weight of a contracted community)
    self_loops: Vec<f64>,
}

impl AdjList {
    pub fn with_nodes(n: usize) -> Self {
        Self {
            adj: vec![Vec::new(); n],
            self_loops: vec![0.0; n],
        }
    }

    /// Flatten a bipartite graph; arena index = petgraph node index.
    pub fn from_graph(graph: &BipartiteGraph) -> Self {
        let inner = graph.inner();
        let mut adj = Self::with_nodes(inner.node_count());
        // (lexeme, triphone) pairs are already unique and never loops.
        for edge in inner.raw_edges() {
            let (a, b) = (edge.source().index(), edge.target().index());
            adj.adj[a].push((b, edge.weight));
            adj.adj[b].push((a, edge.weight));
        }
        adj
    }

    pub fn len(&self) -> usize {
        self.adj.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adj.is_empty()
    }

    pub fn add_edge(&mut self, a: usize, b: usize, weight: f64) {
        if a == b {
            self.self_loops[a] += weight;
            return;
        }
        // Check if edge already exists; add weight
        if let Some(entry) = self.adj[a].iter_mut().find(|(n, _)| *n == b) {
            entry.1 += weight;
        } else {
            self.adj[a].push((b, weight));
        }
        if let Some(entry) = self.adj[b].iter_mut().find(|(n, _)| *n == a) {
            entry.1 += weight;
        } else {
            self.adj[b].push((a, weight));
        }
    }

    /// Weighted degree; a self-loop counts twice.
    pub fn degree(&self, i: usize) -> f64 {
        self.adj[i].iter().map(|&(_, w)| w).sum::<f64>() + 2.0 * self.self_loops[i]
    }

    pub fn total_weight(&self) -> f64 {
        let listed: f64 = self.adj.iter().flatten().map(|&(_, w)| w).sum();
        listed / 2.0 + self.self_loops.iter().sum::<f64>() // Each edge listed twice
    }
}

// ---------------------------------------------------------------------------
// Louvain algorithm
// ---------------------------------------------------------------------------

/// Run the Louvain community detection algorithm with multi-level aggregation.
///
/// Standard Louvain repeats two phases until convergence:
///   Phase 1: local node moves to maximise modularity gain
///   Phase 2: contract the graph (merge communities into super-nodes)
///
/// Returns one community label per node, numbered `0..k` in order of first
/// appearance. Nodes without edges stay singletons.
pub fn louvain(adj: &AdjList, resolution: f64, options: &DetectionOptions) -> Vec<usize> {
    let n = adj.len();
    if n == 0 {
        return Vec::new();
    }

    let m = adj.total_weight();
    if m == 0.0 {
        // No edges: each node is its own community
        return (0..n).collect();
    }
    let m2 = m * 2.0; // constant across all levels

    // membership[i] = super-node of original node i at the current level
    let mut membership: Vec<usize> = (0..n).collect();
    let mut current: Cow<'_, AdjList> = Cow::Borrowed(adj);

    for level in 0..options.max_levels {
        let (community, moved) = local_moves(&current, resolution, m2, options.max_passes);
        if !moved {
            break; // converged, no moves at this level
        }

        let (mapped, new_n) = compact_labels(&community);
        for c in membership.iter_mut() {
            *c = mapped[*c];
        }
        log::debug!(
            "Louvain level {level} at resolution {resolution}: {} -> {new_n} nodes",
            current.len()
        );

        if new_n == current.len() {
            break; // no contraction possible
        }
        let next = aggregate(&current, &mapped, new_n);
        current = Cow::Owned(next);
    }

    compact_labels(&membership).0
}

/// Phase 1: move nodes between neighbouring communities until no move improves
/// modularity or `max_passes` sweeps are done. Returns the per-node community
/// and whether any node moved.
fn local_moves(adj: &AdjList, resolution: f64, m2: f64, max_passes: usize) -> (Vec<usize>, bool) {
    let n = adj.len();
    let degree: Vec<f64> = (0..n).map(|i| adj.degree(i)).collect();

    let mut community: Vec<usize> = (0..n).collect();
    let mut sigma_tot: Vec<f64> = degree.clone();
    let mut any_moved = false;

    // Scratch space: edge weight from the current node to each community.
    let mut comm_weight = vec![0.0f64; n];
    let mut touched = vec![false; n];
    let mut neighbour_comms: Vec<usize> = Vec::new();

    for _ in 0..max_passes {
        let mut improved = false;

        for i in 0..n {
            let ki = degree[i];
            if ki == 0.0 {
                continue;
            }
            let ci = community[i];

            for &(j, w) in &adj.adj[i] {
                let cj = community[j];
                if !touched[cj] {
                    touched[cj] = true;
                    neighbour_comms.push(cj);
                }
                comm_weight[cj] += w;
            }

            // Temporarily remove i from its community
            sigma_tot[ci] -= ki;
            let stay = comm_weight[ci] - resolution * sigma_tot[ci] * ki / m2;

            // Ascending labels + strict improvement: ties go to the lowest label.
            neighbour_comms.sort_unstable();
            let mut best_comm = ci;
            let mut best_gain = 0.0;
            for &cj in &neighbour_comms {
                if cj == ci {
                    continue;
                }
                let gain = comm_weight[cj] - resolution * sigma_tot[cj] * ki / m2;
                let delta = gain - stay;
                if delta > best_gain + GAIN_EPSILON {
                    best_gain = delta;
                    best_comm = cj;
                }
            }

            community[i] = best_comm;
            sigma_tot[best_comm] += ki;
            if best_comm != ci {
                improved = true;
            }

            for &c in &neighbour_comms {
                comm_weight[c] = 0.0;
                touched[c] = false;
            }
            neighbour_comms.clear();
        }

        if !improved {
            break;
        }
        any_moved = true;
    }

    (community, any_moved)
}

/// Compact community labels to 0..k in order of first appearance.
fn compact_labels(community: &[usize]) -> (Vec<usize>, usize) {
    let mut label_map: BTreeMap<usize, usize> = BTreeMap::new();
    let mapped = community
        .iter()
        .map(|&c| {
            let next = label_map.len();
            *label_map.entry(c).or_insert(next)
        })
        .collect();
    (mapped, label_map.len())
}

/// Phase 2: contract each community into a super-node. Intra-community edges
/// become the super-node's self-loop so total weight is preserved.
fn aggregate(adj: &AdjList, community: &[usize], new_n: usize) -> AdjList {
    let mut next = AdjList::with_nodes(new_n);
    let mut acc: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); new_n];

    for i in 0..adj.len() {
        let ci = community[i];
        next.self_loops[ci] += adj.self_loops[i];
        for &(j, w) in &adj.adj[i] {
            let cj = community[j];
            if ci == cj {
                // listed once from each endpoint
                next.self_loops[ci] += w / 2.0;
            } else {
                *acc[ci].entry(cj).or_insert(0.0) += w;
            }
        }
    }

    next.adj = acc.into_iter().map(|m| m.into_iter().collect()).collect();
    next
}

/// Resolution-weighted modularity `Σ_c [L_c/m − r·(d_c/2m)²]` of a partition.
pub fn modularity(adj: &AdjList, communities: &[usize], resolution: f64) -> f64 {
    let m = adj.total_weight();
    if m == 0.0 {
        return 0.0;
    }
    let k = communities.iter().copied().max().map_or(0, |c| c + 1);
    let mut internal = vec![0.0f64; k];
    let mut degree = vec![0.0f64; k];

    for i in 0..adj.len() {
        let ci = communities[i];
        degree[ci] += adj.degree(i);
        internal[ci] += adj.self_loops[i];
        for &(j, w) in &adj.adj[i] {
            if communities[j] == ci {
                internal[ci] += w / 2.0;
            }
        }
    }

    internal
        .iter()
        .zip(&degree)
        .map(|(&l, &d)| l / m - resolution * (d / (2.0 * m)).powi(2))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Helper to build a simple arena for testing
    fn build_test_adj(n: usize, edges: &[(usize, usize, f64)]) -> AdjList {
        let mut adj = AdjList::with_nodes(n);
        for &(a, b, w) in edges {
            adj.add_edge(a, b, w);
        }
        adj
    }

    fn two_triangles(bridge: Option<f64>) -> AdjList {
        let mut edges = vec![
            (0, 1, 1.0),
            (1, 2, 1.0),
            (0, 2, 1.0),
            (3, 4, 1.0),
            (4, 5, 1.0),
            (3, 5, 1.0),
        ];
        if let Some(w) = bridge {
            edges.push((2, 3, w));
        }
        build_test_adj(6, &edges)
    }

    fn count(communities: &[usize]) -> usize {
        communities.iter().copied().max().map_or(0, |c| c + 1)
    }

    #[test]
    fn louvain_two_cliques() {
        let c = louvain(&two_triangles(None), 1.0, &DetectionOptions::default());
        assert_eq!(count(&c), 2);
        assert_eq!(c[0], c[1]);
        assert_eq!(c[1], c[2]);
        assert_eq!(c[3], c[5]);
        assert_ne!(c[0], c[3]);
    }

    #[test]
    fn louvain_bridged_cliques_split_at_default_resolution() {
        let c = louvain(&two_triangles(Some(0.1)), 1.0, &DetectionOptions::default());
        assert_eq!(count(&c), 2);
        assert_ne!(c[2], c[3]);
    }

    #[test]
    fn louvain_zero_resolution_merges_connected_component() {
        let c = louvain(&two_triangles(Some(0.1)), 0.0, &DetectionOptions::default());
        assert_eq!(count(&c), 1);
    }

    #[test]
    fn louvain_single_node() {
        let adj = AdjList::with_nodes(1);
        assert_eq!(louvain(&adj, 1.0, &DetectionOptions::default()), vec![0]);
    }

    #[test]
    fn louvain_empty() {
        let adj = AdjList::default();
        assert!(louvain(&adj, 1.0, &DetectionOptions::default()).is_empty());
    }

    #[test]
    fn louvain_fully_connected() {
        let adj = build_test_adj(3, &[(0, 1, 1.0), (1, 2, 1.0), (0, 2, 1.0)]);
        assert_eq!(louvain(&adj, 1.0, &DetectionOptions::default()), vec![0, 0, 0]);
    }

    #[test]
    fn isolated_nodes_stay_singletons() {
        let adj = build_test_adj(4, &[(0, 1, 1.0)]);
        let c = louvain(&adj, 1.0, &DetectionOptions::default());
        assert_eq!(c[0], c[1]);
        assert_ne!(c[2], c[3]);
        assert_ne!(c[2], c[0]);
    }

    #[test]
    fn louvain_is_deterministic() {
        let adj = two_triangles(Some(0.5));
        let opts = DetectionOptions::default();
        for r in [0.0, 0.5, 1.0, 1.5, 2.0] {
            assert_eq!(louvain(&adj, r, &opts), louvain(&adj, r, &opts));
        }
    }

    #[test]
    fn louvain_terminates_with_one_pass() {
        let opts = DetectionOptions {
            max_passes: 1,
            max_levels: 1,
        };
        let c = louvain(&two_triangles(Some(0.1)), 1.0, &opts);
        assert_eq!(c.len(), 6);
    }

    #[test]
    fn total_weight_correct() {
        let adj = build_test_adj(3, &[(0, 1, 2.0), (1, 2, 3.0)]);
        assert!((adj.total_weight() - 5.0).abs() < 0.001);
    }

    #[test]
    fn aggregation_preserves_total_weight() {
        let adj = two_triangles(Some(0.1));
        let next = aggregate(&adj, &[0, 0, 0, 1, 1, 1], 2);
        assert!((next.total_weight() - adj.total_weight()).abs() < 1e-12);
        assert!((next.self_loops[0] - 3.0).abs() < 1e-12);
        assert!((next.degree(0) - 6.1).abs() < 1e-12);
    }

    #[test]
    fn modularity_prefers_clique_split() {
        let adj = two_triangles(Some(0.1));
        let split = modularity(&adj, &[0, 0, 0, 1, 1, 1], 1.0);
        let merged = modularity(&adj, &[0; 6], 1.0);
        assert!(split > merged);
        assert!(merged.abs() < 1e-12, "single community has Q = 0 at r = 1");
    }

    #[test]
    fn louvain_reaches_split_modularity() {
        let adj = two_triangles(Some(0.1));
        let c = louvain(&adj, 1.0, &DetectionOptions::default());
        let best = modularity(&adj, &[0, 0, 0, 1, 1, 1], 1.0);
        assert!((modularity(&adj, &c, 1.0) - best).abs() < 1e-9);
    }

    #[test]
    fn higher_resolution_never_fewer_communities_on_chain() {
        // Path of 8 nodes
        let edges: Vec<_> = (0..7).map(|i| (i, i + 1, 1.0)).collect();
        let adj = build_test_adj(8, &edges);
        let opts = DetectionOptions::default();
        let low = count(&louvain(&adj, 0.2, &opts));
        let high = count(&louvain(&adj, 2.0, &opts));
        assert!(high >= low);
    }

    #[test]
    fn compact_labels_first_appearance() {
        let (mapped, n) = compact_labels(&[5, 5, 2, 9, 2]);
        assert_eq!(mapped, vec![0, 0, 1, 2, 1]);
        assert_eq!(n, 3);
    }

    #[test]
    fn partition_helpers() {
        let p = LexemePartition::from_groups(&[vec!["A", "B"], vec!["C"]]);
        assert!(p.same_community("A", "B"));
        assert!(!p.same_community("A", "C"));
        assert!(!p.same_community("A", "Z"));
        assert_eq!(p.community_count(), 2);
        assert_eq!(
            p.communities(),
            vec![vec!["A".to_string(), "B".to_string()], vec!["C".to_string()]]
        );
    }

    #[test]
    fn empty_graph_rejected() {
        let g = BipartiteGraph::new();
        let err = detect_communities(&g, &[1.0], &DetectionOptions::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyGraph));
    }

    #[test]
    fn negative_resolution_rejected() {
        let mut g = BipartiteGraph::new();
        g.add_weight("L1", "#a#", 1.0);
        let err = detect_communities(&g, &[-0.5], &DetectionOptions::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidResolutionRange { .. }));
    }

    #[test]
    fn triphones_are_dropped() {
        let mut g = BipartiteGraph::new();
        g.add_weight("L1", "#a#", 1.0);
        g.add_weight("L2", "#a#", 1.0);
        let levels = detect_communities(&g, &[1.0], &DetectionOptions::default()).unwrap();
        let p = &levels[0].partition;
        assert_eq!(p.len(), 2);
        assert!(p.label("#a#").is_none());
        assert!(p.same_community("L1", "L2"));
    }
}
