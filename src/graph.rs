use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::{
    config::AnalyzerConfig,
    dependency::{DependencyKind, DependencyRecord},
    errors::CycleErrorKind,
};

/// Outgoing edge of a service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub dependency: String,
    pub kind: DependencyKind,
    pub optional: bool,
}

/// Directed graph `dependent -> dependency` built from dependency records.
///
/// Only dependents are keys of the adjacency map,
/// services without outgoing edges appear as edge targets only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    adjacency: BTreeMap<String, Vec<Edge>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphStats {
    pub total: usize,
    pub unique_services: usize,
    pub unique_dependencies: usize,
    pub avg_per_service: f64,
    pub by_service: BTreeMap<String, usize>,
    pub by_dependency: BTreeMap<String, usize>,
}

/// Why a [`DependencyTree`] node wasn't expanded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truncation {
    /// The node is already on the path from the root
    Cycle,
    /// The depth bound was reached
    MaxDepth,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyTree {
    pub id: String,
    /// Kind of the edge leading to this node, `None` for the root
    pub kind: Option<DependencyKind>,
    pub optional: bool,
    pub depth: usize,
    pub truncated: Option<Truncation>,
    pub dependencies: Vec<DependencyTree>,
}

impl DependencyTree {
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.dependencies.iter().map(DependencyTree::node_count).sum::<usize>()
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.dependencies.iter().map(|child| child.height() + 1).max().unwrap_or(0)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.id == id || self.dependencies.iter().any(|child| child.contains(id))
    }
}

impl DependencyGraph {
    pub fn build<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a DependencyRecord>,
    {
        let mut adjacency: BTreeMap<String, Vec<Edge>> = BTreeMap::new();
        for record in records {
            adjacency.entry(record.dependent.clone()).or_default().push(Edge {
                dependency: record.dependency.clone(),
                kind: record.kind,
                optional: record.optional,
            });
        }
        Self { adjacency }
    }

    #[inline]
    #[must_use]
    pub fn adjacency(&self) -> &BTreeMap<String, Vec<Edge>> {
        &self.adjacency
    }

    #[inline]
    #[must_use]
    pub fn edges_of(&self, id: &str) -> &[Edge] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    #[must_use]
    pub fn dependency_targets(&self) -> BTreeSet<&str> {
        self.adjacency.values().flatten().map(|edge| edge.dependency.as_str()).collect()
    }

    /// Dependents and dependency targets
    #[must_use]
    pub fn nodes(&self) -> BTreeSet<&str> {
        let mut nodes = self.dependency_targets();
        nodes.extend(self.adjacency.keys().map(String::as_str));
        nodes
    }

    #[must_use]
    pub fn dependents_of(&self, id: &str) -> BTreeSet<&str> {
        self.adjacency
            .iter()
            .filter(|(_, edges)| edges.iter().any(|edge| edge.dependency == id))
            .map(|(dependent, _)| dependent.as_str())
            .collect()
    }
}

impl DependencyGraph {
    /// Finds cycles with a depth-first search over dependents in identifier order.
    ///
    /// Each cycle is reported as the path from its first visited node back to that node,
    /// so the first and the last entries are equal and consecutive entries are real edges.
    #[must_use]
    pub fn detect_cycles(&self) -> Vec<Vec<String>> {
        let mut search = CycleSearch {
            graph: self,
            visited: BTreeSet::new(),
            on_path: BTreeSet::new(),
            path: Vec::new(),
            cycles: Vec::new(),
        };
        for node in self.adjacency.keys() {
            if !search.visited.contains(node.as_str()) {
                search.visit(node);
            }
        }

        debug!(cycles = search.cycles.len(), "Cycle detection finished");
        search.cycles
    }

    /// # Errors
    /// - Returns [`CycleErrorKind::CyclicDependency`] with the first detected cycle
    pub fn ensure_acyclic(&self) -> Result<(), CycleErrorKind> {
        match self.detect_cycles().into_iter().next() {
            Some(path) => Err(CycleErrorKind::CyclicDependency {
                path: path.into_boxed_slice(),
            }),
            None => Ok(()),
        }
    }

    /// Orders services so that every dependency comes before its dependents,
    /// ties broken by identifier.
    ///
    /// # Errors
    /// - Returns [`CycleErrorKind::CyclicDependency`] if the graph has a cycle
    pub fn topological_order(&self) -> Result<Vec<String>, CycleErrorKind> {
        let mut pending: BTreeMap<&str, BTreeSet<&str>> = self.nodes().into_iter().map(|node| (node, BTreeSet::new())).collect();
        let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (dependent, edges) in &self.adjacency {
            for edge in edges {
                if let Some(dependencies) = pending.get_mut(dependent.as_str()) {
                    dependencies.insert(edge.dependency.as_str());
                }
                dependents.entry(edge.dependency.as_str()).or_default().push(dependent.as_str());
            }
        }

        let mut ready: BTreeSet<&str> = pending
            .iter()
            .filter(|(_, dependencies)| dependencies.is_empty())
            .map(|(node, _)| *node)
            .collect();
        let mut order = Vec::with_capacity(pending.len());

        while let Some(node) = ready.pop_first() {
            pending.remove(node);
            order.push(node.to_owned());

            for &dependent in dependents.get(node).into_iter().flatten() {
                if let Some(dependencies) = pending.get_mut(dependent) {
                    dependencies.remove(node);
                    if dependencies.is_empty() {
                        ready.insert(dependent);
                    }
                }
            }
        }

        if pending.is_empty() {
            return Ok(order);
        }

        let path = self
            .detect_cycles()
            .into_iter()
            .next()
            .unwrap_or_else(|| pending.keys().map(|node| (*node).to_owned()).collect());
        Err(CycleErrorKind::CyclicDependency {
            path: path.into_boxed_slice(),
        })
    }

    /// Services from `service_ids` that no edge points to
    #[must_use]
    pub fn orphaned_services<'a, I>(&self, service_ids: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        find_orphaned_services(service_ids, self.dependency_targets())
    }

    /// Services ranked by incoming edges, most depended first, ties by identifier
    #[must_use]
    pub fn most_depended(&self, limit: usize) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = self.incoming_counts().into_iter().collect();
        counts.sort_by(|(a_id, a_count), (b_id, b_count)| b_count.cmp(a_count).then_with(|| a_id.cmp(b_id)));
        counts.truncate(limit);
        counts
    }

    #[must_use]
    pub fn stats(&self) -> GraphStats {
        let by_service: BTreeMap<String, usize> = self.adjacency.iter().map(|(id, edges)| (id.clone(), edges.len())).collect();
        let by_dependency = self.incoming_counts();
        let total = self.edge_count();
        #[allow(clippy::cast_precision_loss)]
        let avg_per_service = if by_service.is_empty() {
            0.0
        } else {
            total as f64 / by_service.len() as f64
        };

        GraphStats {
            total,
            unique_services: by_service.len(),
            unique_dependencies: by_dependency.len(),
            avg_per_service,
            by_service,
            by_dependency,
        }
    }

    /// Expands dependencies of `root` recursively.
    ///
    /// A node already on the path from the root, or at `max_depth`, isn't expanded.
    /// Services shared by sibling branches are expanded in every branch.
    #[must_use]
    pub fn dependency_tree(&self, root: &str, max_depth: usize) -> DependencyTree {
        let mut path = BTreeSet::new();
        self.expand(root, None, false, 0, max_depth, &mut path)
    }

    /// [`Self::dependency_tree`] bounded by [`AnalyzerConfig::max_tree_depth`]
    #[inline]
    #[must_use]
    pub fn dependency_tree_with_config(&self, root: &str, config: &AnalyzerConfig) -> DependencyTree {
        self.dependency_tree(root, config.max_tree_depth)
    }

    fn expand<'a>(
        &'a self,
        id: &'a str,
        kind: Option<DependencyKind>,
        optional: bool,
        depth: usize,
        max_depth: usize,
        path: &mut BTreeSet<&'a str>,
    ) -> DependencyTree {
        let mut node = DependencyTree {
            id: id.to_owned(),
            kind,
            optional,
            depth,
            truncated: None,
            dependencies: Vec::new(),
        };

        let edges = self.edges_of(id);
        if path.contains(id) {
            node.truncated = Some(Truncation::Cycle);
            return node;
        }
        if edges.is_empty() {
            return node;
        }
        if depth >= max_depth {
            node.truncated = Some(Truncation::MaxDepth);
            return node;
        }

        path.insert(id);
        node.dependencies = edges
            .iter()
            .map(|edge| self.expand(&edge.dependency, Some(edge.kind), edge.optional, depth + 1, max_depth, path))
            .collect();
        path.remove(id);

        node
    }

    fn incoming_counts(&self) -> BTreeMap<String, usize> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for edge in self.adjacency.values().flatten() {
            *counts.entry(edge.dependency.clone()).or_default() += 1;
        }
        counts
    }
}

/// `service_ids` minus `dependency_targets`.
///
/// Intentional roots can't be told apart from unused services, so the result is a discovery aid only.
#[must_use]
pub fn find_orphaned_services<'a, 'b, I, T>(service_ids: I, dependency_targets: T) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a str>,
    T: IntoIterator<Item = &'b str>,
{
    let targets: BTreeSet<&str> = dependency_targets.into_iter().collect();
    service_ids
        .into_iter()
        .filter(|id| !targets.contains(id))
        .map(str::to_owned)
        .collect()
}

struct CycleSearch<'g> {
    graph: &'g DependencyGraph,
    visited: BTreeSet<&'g str>,
    on_path: BTreeSet<&'g str>,
    path: Vec<&'g str>,
    cycles: Vec<Vec<String>>,
}

impl<'g> CycleSearch<'g> {
    /// Walks from `root` with an explicit frame stack, so deep chains don't exhaust the thread stack.
    /// Each frame holds a node and the index of its next edge to follow.
    fn visit(&mut self, root: &'g str) {
        let graph = self.graph;
        let mut frames: Vec<(&'g str, usize)> = vec![(root, 0)];
        self.enter(root);

        while let Some((node, next_edge)) = frames.last_mut() {
            let node = *node;
            let Some(edge) = graph.edges_of(node).get(*next_edge) else {
                frames.pop();
                self.leave(node);
                continue;
            };
            *next_edge += 1;

            let next = edge.dependency.as_str();
            if self.on_path.contains(next) {
                self.record_cycle(next);
            } else if !self.visited.contains(next) {
                self.enter(next);
                frames.push((next, 0));
            }
        }
    }

    fn enter(&mut self, node: &'g str) {
        self.on_path.insert(node);
        self.path.push(node);
    }

    fn leave(&mut self, node: &'g str) {
        self.path.pop();
        self.on_path.remove(node);
        self.visited.insert(node);
    }

    /// `start` is on the path, the cycle runs from it to the current node and back
    fn record_cycle(&mut self, start: &str) {
        if let Some(position) = self.path.iter().rposition(|id| *id == start) {
            let mut cycle: Vec<String> = self.path[position..].iter().map(|id| (*id).to_owned()).collect();
            cycle.push(start.to_owned());
            self.cycles.push(cycle);
        }
    }
}
