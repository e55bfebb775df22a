// src/dag/graph.rs

use std::collections::BTreeMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::actions::Action;
use crate::errors::GraphError;

/// A unit of work: an id, the store action it performs, and the ids of the
/// nodes that must succeed before it may start.
#[derive(Debug, Clone)]
pub struct TaskNode {
    pub id: String,
    pub action: Action,
    pub depends_on: Vec<String>,
}

impl TaskNode {
    pub fn new(id: impl Into<String>, action: Action) -> Self {
        Self {
            id: id.into(),
            action,
            depends_on: Vec::new(),
        }
    }

    /// Declare that this node runs only after `dep` has succeeded.
    pub fn after(mut self, dep: impl Into<String>) -> Self {
        self.depends_on.push(dep.into());
        self
    }
}

/// Immutable-once-built DAG of task nodes, keyed by id.
///
/// Insertion order is irrelevant; the map is ordered so that iteration (and
/// therefore layer contents) is deterministic for a fixed graph.
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    nodes: BTreeMap<String, TaskNode>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node; fails if the id is already present.
    pub fn add_node(&mut self, node: TaskNode) -> Result<(), GraphError> {
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::DuplicateId(node.id));
        }
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    pub fn node(&self, id: &str) -> Option<&TaskNode> {
        self.nodes.get(id)
    }

    /// Immediate dependencies of a node.
    pub fn dependencies_of(&self, id: &str) -> &[String] {
        self.nodes
            .get(id)
            .map(|n| n.depends_on.as_slice())
            .unwrap_or(&[])
    }

    /// Check structural invariants: every dependency id exists, no node
    /// depends on itself, and the dependency relation is acyclic.
    pub fn validate(&self) -> Result<(), GraphError> {
        for node in self.nodes.values() {
            for dep in &node.depends_on {
                if dep == &node.id {
                    return Err(GraphError::CycleDetected(node.id.clone()));
                }
                if !self.nodes.contains_key(dep) {
                    return Err(GraphError::UnknownDependency {
                        node: node.id.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }

        // Edge direction: dep -> node. A topological sort fails exactly when
        // there is a cycle, and names a node on it for diagnostics.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for id in self.nodes.keys() {
            graph.add_node(id.as_str());
        }
        for node in self.nodes.values() {
            for dep in &node.depends_on {
                graph.add_edge(dep.as_str(), node.id.as_str(), ());
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => Err(GraphError::CycleDetected(cycle.node_id().to_string())),
        }
    }

    /// Kahn-style layering: layer `k` is exactly the set of nodes whose
    /// dependencies all sit in layers `0..k`, i.e. the nodes that become
    /// ready once every earlier layer is complete.
    ///
    /// Recomputed on every call. For a fixed graph the *set* of nodes per
    /// layer is deterministic; intra-layer order carries no meaning because
    /// the executor runs a layer concurrently.
    pub fn topological_layers(&self) -> Result<Vec<Vec<String>>, GraphError> {
        self.validate()?;

        let mut indegree: BTreeMap<&str, usize> = self
            .nodes
            .values()
            .map(|n| (n.id.as_str(), n.depends_on.len()))
            .collect();

        let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for node in self.nodes.values() {
            for dep in &node.depends_on {
                dependents
                    .entry(dep.as_str())
                    .or_default()
                    .push(node.id.as_str());
            }
        }

        let mut layers = Vec::new();
        while !indegree.is_empty() {
            let ready: Vec<String> = indegree
                .iter()
                .filter(|(_, deg)| **deg == 0)
                .map(|(id, _)| id.to_string())
                .collect();

            if ready.is_empty() {
                // Unreachable after validate(), but the invariant is cheap to
                // keep locally sound.
                let id = indegree
                    .keys()
                    .next()
                    .map(|s| s.to_string())
                    .unwrap_or_default();
                return Err(GraphError::CycleDetected(id));
            }

            for id in &ready {
                indegree.remove(id.as_str());
                for dependent in dependents.get(id.as_str()).into_iter().flatten() {
                    if let Some(deg) = indegree.get_mut(dependent) {
                        *deg -= 1;
                    }
                }
            }
            layers.push(ready);
        }

        Ok(layers)
    }
}
