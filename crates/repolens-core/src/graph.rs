//! File-Level Dependency Graph & Analytics
//!
//! A directed graph over repository files assembled from resolved
//! imports, with the analytics downstream features consume: cycle
//! detection, dependency-chain traversal, transitive impact, in-degree
//! ranking, and aggregate statistics.
//!
//! Each analysis builds its own graph instance; there is no shared
//! mutable state across calls. All traversals are bounded by
//! visited-sets, so they terminate on cyclic input.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};

/// Cycle enumeration stops after this many cycles; consumers size
/// their display around this bound.
pub const CYCLE_LIMIT: usize = 10;

/// Impact reports preview at most this many affected files (the true
/// total is always reported alongside).
pub const IMPACT_PREVIEW_LIMIT: usize = 20;

// ============================================================================
// Edges
// ============================================================================

/// A single import relationship discovered in a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEdge {
    /// Importing file (repository-relative path).
    pub source: String,
    /// Resolved file path, or the raw specifier for external imports.
    pub target: String,
    /// Original specifier text as written in the source.
    pub specifier: String,
    /// True when the target lies outside the repository.
    pub is_external: bool,
}

impl ImportEdge {
    /// An edge whose target was resolved inside the repository.
    pub fn resolved(source: String, target: String, specifier: String) -> Self {
        Self {
            source,
            target,
            specifier,
            is_external: false,
        }
    }

    /// An edge pointing at an external dependency.
    pub fn external(source: String, specifier: String) -> Self {
        Self {
            source,
            target: specifier.clone(),
            specifier,
            is_external: true,
        }
    }
}

// ============================================================================
// Reports
// ============================================================================

/// Blast radius of a change to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactReport {
    /// The file under change.
    pub file: String,
    /// Files that import it directly.
    pub direct_dependents: Vec<String>,
    /// Size of the full transitive dependent set.
    pub total_affected: usize,
    /// Capped preview of the affected set (≤ [`IMPACT_PREVIEW_LIMIT`]).
    pub affected_preview: Vec<String>,
}

/// Aggregate statistics over the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_files: usize,
    pub total_dependencies: usize,
    pub is_dag: bool,
    /// Weakly-connected component count.
    pub connected_components: usize,
}

/// Serializable node/edge listing for the graph-display endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphExport {
    pub nodes: Vec<String>,
    pub edges: Vec<ImportEdge>,
}

// ============================================================================
// Dependency Graph
// ============================================================================

/// Directed file-level dependency graph.
///
/// Only resolved intra-repository edges participate in traversal;
/// external edges are retained in the edge list for display. An empty
/// graph answers every query with an empty result, so analytics called
/// before (or without) an `analyze()` run degrade gracefully.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Resolved-edge topology; node weight is the file path, edge
    /// weight the original specifier.
    graph: DiGraph<String, String>,
    /// Path to NodeIndex for O(1) lookup.
    index: HashMap<String, NodeIndex>,
    /// Every discovered import edge, external ones included.
    edges: Vec<ImportEdge>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file node; idempotent.
    pub fn add_file(&mut self, path: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(path) {
            return idx;
        }
        let idx = self.graph.add_node(path.to_string());
        self.index.insert(path.to_string(), idx);
        idx
    }

    /// Record an import edge. Resolved edges enter the topology
    /// (collapsing duplicate source→target pairs); external edges are
    /// kept in the edge list only.
    pub fn add_import(&mut self, edge: ImportEdge) {
        if !edge.is_external {
            let source = self.add_file(&edge.source);
            let target = self.add_file(&edge.target);
            self.graph.update_edge(source, target, edge.specifier.clone());
        }
        self.edges.push(edge);
    }

    /// Whether a file is present in the graph.
    pub fn contains(&self, file: &str) -> bool {
        self.index.contains_key(file)
    }

    /// Number of file nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of resolved dependency edges.
    pub fn resolved_edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All file paths in the graph.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(|w| w.as_str())
    }

    /// Every recorded import edge, external ones included.
    pub fn import_edges(&self) -> &[ImportEdge] {
        &self.edges
    }

    /// Node and edge listing for serialization.
    pub fn export(&self) -> GraphExport {
        let mut nodes: Vec<String> = self.files().map(|f| f.to_string()).collect();
        nodes.sort();
        GraphExport {
            nodes,
            edges: self.edges.clone(),
        }
    }

    // ------------------------------------------------------------------------
    // Analytics
    // ------------------------------------------------------------------------

    /// Files this file imports (direct successors). Empty if absent.
    pub fn dependencies(&self, file: &str) -> Vec<String> {
        self.neighbor_paths(file, Direction::Outgoing)
    }

    /// Files importing this file (direct predecessors). Empty if absent.
    pub fn dependents(&self, file: &str) -> Vec<String> {
        self.neighbor_paths(file, Direction::Incoming)
    }

    fn neighbor_paths(&self, file: &str, direction: Direction) -> Vec<String> {
        let Some(&idx) = self.index.get(file) else {
            return Vec::new();
        };
        self.graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].clone())
            .collect()
    }

    /// Breadth-first dependency levels from a file, keyed `level_k`.
    ///
    /// Stops at `max_depth` or as soon as a level adds no new file; the
    /// visited set guarantees termination on cycles.
    pub fn dependency_chain(&self, file: &str, max_depth: usize) -> BTreeMap<String, Vec<String>> {
        let mut chain = BTreeMap::new();
        let Some(&start) = self.index.get(file) else {
            return chain;
        };

        let mut visited: HashSet<NodeIndex> = HashSet::from([start]);
        let mut current_level = vec![start];

        for depth in 1..=max_depth {
            let mut next_level = Vec::new();
            for &node in &current_level {
                for successor in self.graph.neighbors_directed(node, Direction::Outgoing) {
                    if visited.insert(successor) {
                        next_level.push(successor);
                    }
                }
            }
            if next_level.is_empty() {
                break;
            }
            chain.insert(
                format!("level_{}", depth),
                next_level.iter().map(|&n| self.graph[n].clone()).collect(),
            );
            current_level = next_level;
        }

        chain
    }

    /// Transitive impact of changing a file: breadth-first over
    /// reverse edges, collecting every dependent.
    ///
    /// Returns `None` when the file is not in the graph — the explicit
    /// not-found marker; this never panics.
    pub fn impact(&self, file: &str) -> Option<ImpactReport> {
        let &start = self.index.get(file)?;

        let direct_dependents: Vec<String> = self
            .graph
            .neighbors_directed(start, Direction::Incoming)
            .map(|n| self.graph[n].clone())
            .collect();

        let mut affected: Vec<NodeIndex> = Vec::new();
        let mut seen: HashSet<NodeIndex> = HashSet::from([start]);
        let mut queue: VecDeque<NodeIndex> = VecDeque::from([start]);
        // The start node is seeded only for termination; when a cycle
        // leads back to it, it counts as affected by its own change.
        let mut start_affected = false;

        while let Some(current) = queue.pop_front() {
            for dependent in self.graph.neighbors_directed(current, Direction::Incoming) {
                if dependent == start && !start_affected {
                    start_affected = true;
                    affected.push(dependent);
                } else if seen.insert(dependent) {
                    affected.push(dependent);
                    queue.push_back(dependent);
                }
            }
        }

        Some(ImpactReport {
            file: file.to_string(),
            direct_dependents,
            total_affected: affected.len(),
            affected_preview: affected
                .iter()
                .take(IMPACT_PREVIEW_LIMIT)
                .map(|&n| self.graph[n].clone())
                .collect(),
        })
    }

    /// Enumerate simple cycles, capped at [`CYCLE_LIMIT`].
    ///
    /// Each cycle is reported once, rooted at its lowest-index node.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut cycles = Vec::new();
        for start in self.graph.node_indices() {
            if cycles.len() >= CYCLE_LIMIT {
                break;
            }
            let mut path = vec![start];
            let mut on_path = HashSet::from([start]);
            self.cycle_dfs(start, start, &mut path, &mut on_path, &mut cycles);
        }
        cycles
    }

    fn cycle_dfs(
        &self,
        start: NodeIndex,
        current: NodeIndex,
        path: &mut Vec<NodeIndex>,
        on_path: &mut HashSet<NodeIndex>,
        cycles: &mut Vec<Vec<String>>,
    ) {
        for next in self.graph.neighbors_directed(current, Direction::Outgoing) {
            if cycles.len() >= CYCLE_LIMIT {
                return;
            }
            if next == start {
                cycles.push(path.iter().map(|&n| self.graph[n].clone()).collect());
            } else if next.index() > start.index() && !on_path.contains(&next) {
                on_path.insert(next);
                path.push(next);
                self.cycle_dfs(start, next, path, on_path, cycles);
                path.pop();
                on_path.remove(&next);
            }
        }
    }

    /// Files ranked by in-degree, descending. Ties break by path for
    /// deterministic output.
    pub fn most_imported(&self, limit: usize) -> Vec<(String, usize)> {
        let mut ranked: Vec<(String, usize)> = self
            .graph
            .node_indices()
            .map(|idx| {
                let in_degree = self
                    .graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .count();
                (self.graph[idx].clone(), in_degree)
            })
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(limit);
        ranked
    }

    /// Aggregate graph statistics.
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            total_files: self.graph.node_count(),
            total_dependencies: self.graph.edge_count(),
            is_dag: !petgraph::algo::is_cyclic_directed(&self.graph),
            connected_components: petgraph::algo::connected_components(&self.graph),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn edge(source: &str, target: &str) -> ImportEdge {
        ImportEdge::resolved(source.to_string(), target.to_string(), target.to_string())
    }

    fn chain_graph() -> DependencyGraph {
        // a -> b -> c -> d
        let mut g = DependencyGraph::new();
        g.add_import(edge("a.py", "b.py"));
        g.add_import(edge("b.py", "c.py"));
        g.add_import(edge("c.py", "d.py"));
        g
    }

    #[test]
    fn test_direct_lookups() {
        let g = chain_graph();
        assert_eq!(g.dependencies("a.py"), vec!["b.py"]);
        assert_eq!(g.dependents("b.py"), vec!["a.py"]);
        assert!(g.dependencies("d.py").is_empty());
        assert!(g.dependents("a.py").is_empty());
        // Absent files give empty results, not errors
        assert!(g.dependencies("missing.py").is_empty());
        assert!(g.dependents("missing.py").is_empty());
    }

    #[test]
    fn test_dependency_chain_levels_and_depth_cap() {
        let g = chain_graph();
        let chain = g.dependency_chain("a.py", 2);

        assert_eq!(chain.len(), 2);
        assert_eq!(chain["level_1"], vec!["b.py"]);
        assert_eq!(chain["level_2"], vec!["c.py"]);
        assert!(!chain.contains_key("level_3"));
    }

    #[test]
    fn test_dependency_chain_terminates_on_cycle() {
        let mut g = DependencyGraph::new();
        g.add_import(edge("a.py", "b.py"));
        g.add_import(edge("b.py", "a.py"));

        let chain = g.dependency_chain("a.py", 10);
        assert_eq!(chain.len(), 1);
        assert_eq!(chain["level_1"], vec!["b.py"]);
    }

    #[test]
    fn test_impact_transitive() {
        let g = chain_graph();

        let report = g.impact("d.py").unwrap();
        assert_eq!(report.direct_dependents, vec!["c.py"]);
        assert_eq!(report.total_affected, 3);
        assert_eq!(report.affected_preview.len(), 3);

        let isolated = g.impact("a.py").unwrap();
        assert!(isolated.direct_dependents.is_empty());
        assert_eq!(isolated.total_affected, 0);
    }

    #[test]
    fn test_impact_not_found_marker() {
        let g = chain_graph();
        assert!(g.impact("nope.py").is_none());
    }

    #[test]
    fn test_impact_grows_with_new_edge() {
        let mut g = chain_graph();
        let before = g.impact("d.py").unwrap().total_affected;

        g.add_import(edge("x.py", "d.py"));
        let report = g.impact("d.py").unwrap();
        assert!(report.total_affected > before);
        assert!(report.affected_preview.contains(&"x.py".to_string()));
    }

    #[test]
    fn test_impact_counts_file_on_its_own_cycle() {
        let mut g = DependencyGraph::new();
        g.add_import(edge("a.py", "b.py"));
        g.add_import(edge("b.py", "a.py"));

        // a is reached back through the cycle, so it is affected by
        // its own change and counted exactly once.
        let report = g.impact("a.py").unwrap();
        assert_eq!(report.direct_dependents, vec!["b.py"]);
        assert_eq!(report.total_affected, 2);
        assert!(report.affected_preview.contains(&"a.py".to_string()));
        assert!(report.affected_preview.contains(&"b.py".to_string()));
    }

    #[test]
    fn test_impact_preview_capped() {
        let mut g = DependencyGraph::new();
        for i in 0..30 {
            g.add_import(edge(&format!("dep{}.py", i), "core.py"));
        }
        let report = g.impact("core.py").unwrap();
        assert_eq!(report.total_affected, 30);
        assert_eq!(report.affected_preview.len(), IMPACT_PREVIEW_LIMIT);
    }

    #[test]
    fn test_two_node_cycle() {
        let mut g = DependencyGraph::new();
        g.add_import(edge("a.py", "b.py"));
        g.add_import(edge("b.py", "a.py"));

        let cycles = g.cycles();
        assert_eq!(cycles.len(), 1);
        let cycle = &cycles[0];
        assert!(cycle.contains(&"a.py".to_string()));
        assert!(cycle.contains(&"b.py".to_string()));

        assert!(!g.stats().is_dag);
    }

    #[test]
    fn test_cycles_use_existing_edges() {
        let mut g = DependencyGraph::new();
        g.add_import(edge("a.py", "b.py"));
        g.add_import(edge("b.py", "c.py"));
        g.add_import(edge("c.py", "a.py"));
        g.add_import(edge("c.py", "d.py"));

        let existing: HashSet<(String, String)> = g
            .import_edges()
            .iter()
            .map(|e| (e.source.clone(), e.target.clone()))
            .collect();

        for cycle in g.cycles() {
            for i in 0..cycle.len() {
                let from = cycle[i].clone();
                let to = cycle[(i + 1) % cycle.len()].clone();
                assert!(existing.contains(&(from, to)));
            }
        }
    }

    #[test]
    fn test_cycle_limit() {
        // Node 0 pairs with each of 1..=25 in its own two-cycle
        let mut g = DependencyGraph::new();
        for i in 1..=25 {
            g.add_import(edge("hub.py", &format!("f{}.py", i)));
            g.add_import(edge(&format!("f{}.py", i), "hub.py"));
        }
        assert_eq!(g.cycles().len(), CYCLE_LIMIT);
    }

    #[test]
    fn test_most_imported() {
        let mut g = DependencyGraph::new();
        for i in 0..10 {
            g.add_import(edge(&format!("mod{}.py", i), "util.py"));
        }
        g.add_import(edge("mod0.py", "other.py"));

        let top = g.most_imported(1);
        assert_eq!(top, vec![("util.py".to_string(), 10)]);
    }

    #[test]
    fn test_stats() {
        let g = chain_graph();
        let stats = g.stats();
        assert_eq!(stats.total_files, 4);
        assert_eq!(stats.total_dependencies, 3);
        assert!(stats.is_dag);
        assert_eq!(stats.connected_components, 1);
    }

    #[test]
    fn test_empty_graph_answers_everything() {
        let g = DependencyGraph::default();
        assert!(g.dependencies("a.py").is_empty());
        assert!(g.dependency_chain("a.py", 5).is_empty());
        assert!(g.impact("a.py").is_none());
        assert!(g.cycles().is_empty());
        assert!(g.most_imported(10).is_empty());

        let stats = g.stats();
        assert_eq!(stats.total_files, 0);
        assert!(stats.is_dag);
    }

    #[test]
    fn test_duplicate_resolved_edges_collapse() {
        let mut g = DependencyGraph::new();
        g.add_import(edge("a.py", "b.py"));
        g.add_import(edge("a.py", "b.py"));

        assert_eq!(g.resolved_edge_count(), 1);
        // But the raw edge list keeps both
        assert_eq!(g.import_edges().len(), 2);
    }

    #[test]
    fn test_external_edges_stay_out_of_topology() {
        let mut g = DependencyGraph::new();
        g.add_file("a.py");
        g.add_import(ImportEdge::external("a.py".to_string(), "requests".to_string()));

        assert_eq!(g.node_count(), 1);
        assert_eq!(g.resolved_edge_count(), 0);
        assert_eq!(g.import_edges().len(), 1);
        assert!(g.import_edges()[0].is_external);
    }
}
