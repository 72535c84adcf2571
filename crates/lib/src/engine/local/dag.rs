//! Part dependency graph.
//!
//! Parts declare the parts they build `after`. The graph rejects unknown
//! references and cycles, and yields a deterministic topological order:
//! parts are grouped into levels (every part comes after all of its
//! dependencies), and sorted by name within a level.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::engine::EngineError;
use crate::project::PartSpec;

pub struct PartGraph {
  graph: DiGraph<String, ()>,
  nodes: HashMap<String, NodeIndex>,
  order: Vec<String>,
}

impl PartGraph {
  /// Build the graph, with edges from each dependency to its dependent.
  pub fn from_parts(parts: &BTreeMap<String, PartSpec>) -> Result<Self, EngineError> {
    let mut graph = DiGraph::new();
    let mut nodes = HashMap::new();

    for name in parts.keys() {
      let idx = graph.add_node(name.clone());
      nodes.insert(name.clone(), idx);
    }

    for (name, spec) in parts {
      let dependent = nodes[name];
      for dep in &spec.after {
        let Some(&dep_idx) = nodes.get(dep) else {
          return Err(EngineError::InvalidParts(format!(
            "part '{}' is set to build after '{}', but '{}' is not defined",
            name, dep, dep
          )));
        };
        if dep_idx == dependent {
          return Err(EngineError::InvalidParts(format!("part '{}' cannot build after itself", name)));
        }
        graph.update_edge(dep_idx, dependent, ());
      }
    }

    toposort(&graph, None)
      .map_err(|_| EngineError::InvalidParts("circular dependency chain found in parts definition".to_string()))?;

    let order = Self::levelled_order(&graph);

    Ok(Self { graph, nodes, order })
  }

  /// Kahn's algorithm, one level at a time, names sorted within a level.
  fn levelled_order(graph: &DiGraph<String, ()>) -> Vec<String> {
    let mut in_degree: HashMap<NodeIndex, usize> = graph
      .node_indices()
      .map(|idx| (idx, graph.neighbors_directed(idx, Direction::Incoming).count()))
      .collect();

    let mut order = Vec::with_capacity(graph.node_count());
    let mut ready: BTreeSet<(String, NodeIndex)> = in_degree
      .iter()
      .filter(|(_, degree)| **degree == 0)
      .map(|(idx, _)| (graph[*idx].clone(), *idx))
      .collect();

    while !ready.is_empty() {
      let level = std::mem::take(&mut ready);
      for (name, idx) in level {
        order.push(name);
        for next in graph.neighbors_directed(idx, Direction::Outgoing) {
          if let Some(degree) = in_degree.get_mut(&next) {
            *degree -= 1;
            if *degree == 0 {
              ready.insert((graph[next].clone(), next));
            }
          }
        }
      }
    }

    order
  }

  /// All parts in dependency order.
  pub fn topological_order(&self) -> &[String] {
    &self.order
  }

  pub fn contains(&self, part: &str) -> bool {
    self.nodes.contains_key(part)
  }

  /// Direct dependencies of `part`, sorted by name.
  pub fn dependencies(&self, part: &str) -> Vec<String> {
    let Some(&idx) = self.nodes.get(part) else {
      return Vec::new();
    };
    let mut deps: Vec<String> = self
      .graph
      .neighbors_directed(idx, Direction::Incoming)
      .map(|dep| self.graph[dep].clone())
      .collect();
    deps.sort();
    deps
  }

}
