//! Neighborhood isolation.
//!
//! Isolating a node keeps its closed neighborhood emphasized and dims the rest
//! of the graph. Dimming is a render hint only; the graph is never modified.

use std::collections::HashSet;

use super::graph::{Graph, GraphEdge, NodeId};

/// The active isolation, if any.
#[derive(Clone, Debug, Default)]
pub struct FocusState {
	isolated: Option<NodeId>,
	members: HashSet<NodeId>,
}

/// Emphasized and dimmed elements under the current focus.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Partition {
	/// Nodes kept emphasized.
	pub highlighted_nodes: HashSet<NodeId>,
	/// Nodes drawn dimmed.
	pub dimmed_nodes: HashSet<NodeId>,
	/// Indices into [`Graph::edges`] kept emphasized.
	pub highlighted_edges: Vec<usize>,
	/// Indices into [`Graph::edges`] drawn dimmed.
	pub dimmed_edges: Vec<usize>,
}

impl FocusState {
	/// Isolates `id` and its direct neighbors, replacing any earlier isolation.
	///
	/// Returns `false`, leaving the state untouched, when `id` is not in the
	/// graph.
	pub fn isolate(&mut self, graph: &Graph, id: &str) -> bool {
		let Some(node) = graph.node(id) else {
			return false;
		};
		let mut members: HashSet<NodeId> = graph.neighbors(id).cloned().collect();
		members.insert(node.id.clone());
		self.isolated = Some(node.id.clone());
		self.members = members;
		true
	}

	/// Clears all dimming.
	pub fn reset(&mut self) {
		self.isolated = None;
		self.members.clear();
	}

	/// Node at the centre of the isolation.
	pub fn isolated(&self) -> Option<&NodeId> {
		self.isolated.as_ref()
	}

	/// The isolated node plus its direct neighbors; `None` without isolation.
	pub fn focus_set(&self) -> Option<&HashSet<NodeId>> {
		self.isolated.as_ref().map(|_| &self.members)
	}

	/// Whether the node should be drawn dimmed.
	pub fn is_node_dimmed(&self, id: &str) -> bool {
		self.isolated.is_some() && !self.members.contains(id)
	}

	/// Whether the edge should be drawn dimmed: every edge not incident to the
	/// isolated node is.
	pub fn is_edge_dimmed(&self, edge: &GraphEdge) -> bool {
		match &self.isolated {
			Some(center) => !edge.touches(center.as_str()),
			None => false,
		}
	}

	/// Splits the whole graph into emphasized and dimmed elements.
	pub fn partition(&self, graph: &Graph) -> Partition {
		let mut partition = Partition::default();
		for node in graph.nodes() {
			if self.is_node_dimmed(node.id.as_str()) {
				partition.dimmed_nodes.insert(node.id.clone());
			} else {
				partition.highlighted_nodes.insert(node.id.clone());
			}
		}
		for (i, edge) in graph.edges().iter().enumerate() {
			if self.is_edge_dimmed(edge) {
				partition.dimmed_edges.push(i);
			} else {
				partition.highlighted_edges.push(i);
			}
		}
		partition
	}
}
