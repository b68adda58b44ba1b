//! Task Graph - petgraph view of a registry for validation and display

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use std::fmt::Write;

use crate::error::GraphError;
use crate::key::TaskKey;
use crate::registry::{Body, TaskRegistry};

/// Edges point from a task to what it runs (dependencies and children)
pub struct TaskGraph<'a> {
    graph: DiGraph<&'a TaskKey, ()>,
    index: HashMap<&'a TaskKey, NodeIndex>,
}

impl<'a> TaskGraph<'a> {
    /// Build the graph, failing on references to unregistered tasks
    pub fn new(registry: &'a TaskRegistry) -> Result<Self, GraphError> {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();

        for task in registry.iter() {
            index.insert(&task.key, graph.add_node(&task.key));
        }

        for task in registry.iter() {
            let from = index[&task.key];
            for edge in task.edges() {
                let Some(&to) = index.get(edge) else {
                    return Err(GraphError::MissingDependency {
                        task: task.key.to_string(),
                        missing: edge.to_string(),
                    });
                };
                graph.add_edge(from, to, ());
            }
        }

        Ok(Self { graph, index })
    }

    /// Fail if any task (transitively) runs itself
    pub fn check_acyclic(&self) -> Result<(), GraphError> {
        toposort(&self.graph, None)
            .map(|_| ())
            .map_err(|cycle| GraphError::Cycle(self.graph[cycle.node_id()].to_string()))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Every task reachable from `key`, including itself
    pub fn reachable(&self, key: &TaskKey) -> Vec<&'a TaskKey> {
        let Some(&start) = self.index.get(key) else {
            return vec![];
        };
        let mut dfs = petgraph::visit::Dfs::new(&self.graph, start);
        let mut out = Vec::new();
        while let Some(nx) = dfs.next(&self.graph) {
            out.push(self.graph[nx]);
        }
        out
    }
}

/// Validate that every referenced task exists and there are no cycles
pub fn validate(registry: &TaskRegistry) -> Result<(), GraphError> {
    let graph = TaskGraph::new(registry)?;
    graph.check_acyclic()
}

/// Indented tree of what invoking `key` runs.
///
/// `+` marks a series dependency, `|` a parallel child.
pub fn render_tree(registry: &TaskRegistry, key: &TaskKey) -> String {
    let mut out = String::new();
    render_node(registry, key, 0, ' ', &mut out);
    out
}

fn render_node(registry: &TaskRegistry, key: &TaskKey, depth: usize, mark: char, out: &mut String) {
    let indent = "  ".repeat(depth);
    let _ = writeln!(out, "{indent}{mark} {key}");

    let Some(task) = registry.get(key) else {
        return;
    };
    for dep in &task.depends_on {
        render_node(registry, dep, depth + 1, '+', out);
    }
    if let Body::Parallel(children) = &task.body {
        for child in children {
            render_node(registry, child, depth + 1, '|', out);
        }
    }
}
