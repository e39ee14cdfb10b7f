//! dag.rs
//! Dependency graph over a parameter set, with Kahn's ordering.
//!
//! Node `i` always corresponds to `parameters[i]`, so a `NodeId` indexes straight
//! back into the slice the graph was built from.

use crate::store::{Parameter, ParameterKind};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction::{Incoming, Outgoing};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;

/// A stable identifier for a parameter inside a `DependencyGraph`.
pub type NodeId = NodeIndex;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Parameter {parameter} depends on undefined parameter '{missing}'")]
    UndefinedDependency { parameter: String, missing: String },
    #[error("Parameter '{name}' is defined more than once")]
    DuplicateParameter { name: String },
    #[error("Cycle detected in parameter dependencies")]
    Cycle,
}

/// Edges point from a dependency to the parameter that reads it.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeId>,
}

impl DependencyGraph {
    /// Builds and validates the graph. Only CALCULATION parameters contribute edges.
    pub fn build(parameters: &[Parameter]) -> Result<Self, GraphError> {
        let mut graph = DiGraph::with_capacity(parameters.len(), parameters.len());
        let mut index = HashMap::with_capacity(parameters.len());

        for param in parameters {
            let id = graph.add_node(param.name().to_string());
            if index.insert(param.name().to_string(), id).is_some() {
                return Err(GraphError::DuplicateParameter { name: param.name().to_string() });
            }
        }

        for (i, param) in parameters.iter().enumerate() {
            if param.kind() != ParameterKind::Calculation {
                continue;
            }
            let node = NodeId::new(i);
            for dep in param.dependencies() {
                let parent = *index.get(dep).ok_or_else(|| GraphError::UndefinedDependency {
                    parameter: param.name().to_string(),
                    missing: dep.clone(),
                })?;
                graph.add_edge(parent, node, ());
            }
        }

        Ok(Self { graph, index })
    }

    pub fn node_count(&self) -> usize { self.graph.node_count() }
    pub fn node_id(&self, name: &str) -> Option<NodeId> { self.index.get(name).copied() }
    pub fn name(&self, id: NodeId) -> &str { &self.graph[id] }

    /// Returns a topological order using Kahn's Algorithm.
    ///
    /// Ties are broken by the original parameter order, so a fixed input list
    /// always yields the same order.
    pub fn topological_order(&self) -> Result<Vec<NodeId>, GraphError> {
        let count = self.graph.node_count();
        let mut in_degree = vec![0usize; count];
        let mut queue = VecDeque::with_capacity(count);
        let mut order = Vec::with_capacity(count);

        // 1. Initialize In-Degrees O(N + E)
        for node in self.graph.node_indices() {
            in_degree[node.index()] = self.graph.neighbors_directed(node, Incoming).count();
            if in_degree[node.index()] == 0 {
                queue.push_back(node);
            }
        }

        // 2. Process Queue
        while let Some(node) = queue.pop_front() {
            order.push(node);

            // petgraph yields neighbours newest-edge first; collect and sort for determinism.
            let mut ready: SmallVec<[NodeId; 8]> = SmallVec::new();
            for child in self.graph.neighbors_directed(node, Outgoing) {
                let degree = &mut in_degree[child.index()];
                *degree -= 1;
                if *degree == 0 {
                    ready.push(child);
                }
            }
            ready.sort_unstable();
            queue.extend(ready);
        }

        if order.len() != count {
            return Err(GraphError::Cycle);
        }

        Ok(order)
    }

    /// Every node the given start nodes transitively depend on, including themselves.
    pub fn upstream_from(&self, start_nodes: &[NodeId]) -> HashSet<NodeId> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from(start_nodes.to_vec());

        while let Some(node) = queue.pop_front() {
            if visited.insert(node) {
                queue.extend(self.graph.neighbors_directed(node, Incoming));
            }
        }
        visited
    }
}
