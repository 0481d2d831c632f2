//! Keyword/document graph and its store.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

use log::debug;
use serde_json::{Map, Value};

use super::focus::FocusState;
use super::layout::{self, LayoutStrategy};
use crate::api::GraphPayload;

/// Node identifier, unique within one graph.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
	/// The id as sent by the service.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<&str> for NodeId {
	fn from(id: &str) -> Self {
		Self(id.to_owned())
	}
}

impl From<String> for NodeId {
	fn from(id: String) -> Self {
		Self(id)
	}
}

impl Borrow<str> for NodeId {
	fn borrow(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// What a node stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
	/// An indexed document.
	Document,
	/// A tag or extracted keyword.
	Keyword,
	/// Any other `type` value; drawn unstyled.
	Unknown,
}

impl NodeKind {
	/// Maps the wire `type` value, falling back to [`NodeKind::Unknown`].
	pub fn from_wire(kind: Option<&Value>) -> Self {
		match kind.and_then(Value::as_str) {
			Some("document") => Self::Document,
			Some("keyword") => Self::Keyword,
			_ => Self::Unknown,
		}
	}
}

/// A graph node.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	/// Unique id.
	pub id: NodeId,
	/// Display label.
	pub label: String,
	/// Document or keyword.
	pub kind: NodeKind,
	/// Opaque metadata, passed through untouched.
	pub meta: Map<String, Value>,
}

/// A weighted edge between two nodes present in the same graph.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
	/// Source node.
	pub source: NodeId,
	/// Target node.
	pub target: NodeId,
	/// Weight, at least 1.
	pub weight: f64,
}

impl GraphEdge {
	/// Whether `id` is either endpoint.
	pub fn touches(&self, id: &str) -> bool {
		self.source.as_str() == id || self.target.as_str() == id
	}
}

/// What ingestion threw away.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
	/// Nodes without an id.
	pub unnamed_nodes: usize,
	/// Later nodes reusing an id already seen.
	pub duplicate_nodes: usize,
	/// Edges whose source or target is not a node.
	pub dangling_edges: usize,
}

impl IngestReport {
	/// Whether anything was dropped.
	pub fn is_clean(&self) -> bool {
		*self == Self::default()
	}
}

/// Nodes unique by id, in arrival order, and edges between them.
#[derive(Clone, Debug, Default)]
pub struct Graph {
	nodes: Vec<GraphNode>,
	index: HashMap<NodeId, usize>,
	edges: Vec<GraphEdge>,
}

impl Graph {
	/// Builds a graph from a raw payload.
	///
	/// The first node with a given id wins; later duplicates are dropped. Edges
	/// referencing an absent node are dropped and never create one.
	pub fn ingest(payload: GraphPayload) -> (Self, IngestReport) {
		let mut graph = Self::default();
		let mut report = IngestReport::default();

		for node in payload.nodes {
			if node.id.is_empty() {
				report.unnamed_nodes += 1;
				continue;
			}
			let id = NodeId::from(node.id);
			if graph.index.contains_key(&id) {
				report.duplicate_nodes += 1;
				continue;
			}
			graph.index.insert(id.clone(), graph.nodes.len());
			graph.nodes.push(GraphNode {
				id,
				label: node.label,
				kind: NodeKind::from_wire(node.kind.as_ref()),
				meta: node.meta,
			});
		}

		for edge in payload.edges {
			let (Some(source), Some(target)) = (graph.resolve(&edge.source), graph.resolve(&edge.target)) else {
				report.dangling_edges += 1;
				continue;
			};
			graph.edges.push(GraphEdge {
				source,
				target,
				weight: edge.weight.filter(|w| w.is_finite()).unwrap_or(1.0).max(1.0),
			});
		}

		(graph, report)
	}

	fn resolve(&self, id: &str) -> Option<NodeId> {
		self.index.get(id).map(|&i| self.nodes[i].id.clone())
	}

	/// Nodes in arrival order.
	pub fn nodes(&self) -> &[GraphNode] {
		&self.nodes
	}

	/// Edges in arrival order.
	pub fn edges(&self) -> &[GraphEdge] {
		&self.edges
	}

	/// Node by id.
	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.index.get(id).map(|&i| &self.nodes[i])
	}

	/// Arrival position of a node.
	pub fn position_of(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	/// Whether a node with this id exists.
	pub fn contains(&self, id: &str) -> bool {
		self.index.contains_key(id)
	}

	/// Number of nodes.
	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	/// Number of edges.
	pub fn edge_count(&self) -> usize {
		self.edges.len()
	}

	/// Whether the graph has no nodes.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Nodes joined to `id` by an edge in either direction. May repeat.
	pub fn neighbors<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a NodeId> + 'a {
		self.edges.iter().filter_map(move |e| {
			if e.source.as_str() == id {
				Some(&e.target)
			} else if e.target.as_str() == id {
				Some(&e.source)
			} else {
				None
			}
		})
	}
}

/// Owns the graph of the last successful fetch, its layout and focus.
#[derive(Debug, Default)]
pub struct GraphStore {
	graph: Graph,
	query: Option<String>,
	layout: LayoutStrategy,
	/// Isolation state; cleared on every replacement.
	pub focus: FocusState,
	revision: u64,
}

impl GraphStore {
	/// Swaps in a new graph for `query`, dropping any isolation.
	pub fn replace(&mut self, query: &str, graph: Graph) {
		self.layout = layout::select(graph.node_count());
		debug!(
			"graph for {query:?}: {} nodes, {} edges, {:?} layout",
			graph.node_count(),
			graph.edge_count(),
			self.layout
		);
		self.graph = graph;
		self.query = Some(query.to_owned());
		self.focus.reset();
		self.revision += 1;
	}

	/// Current graph.
	pub fn graph(&self) -> &Graph {
		&self.graph
	}

	/// Query the current graph was fetched for.
	pub fn query(&self) -> Option<&str> {
		self.query.as_deref()
	}

	/// Layout chosen for the current graph.
	pub fn layout(&self) -> LayoutStrategy {
		self.layout
	}

	/// Bumped on every replacement.
	pub fn revision(&self) -> u64 {
		self.revision
	}

	/// Isolates the closed neighborhood of `id`. Unknown ids change nothing.
	pub fn isolate(&mut self, id: &str) -> bool {
		self.focus.isolate(&self.graph, id)
	}

	/// Clears any isolation.
	pub fn reset_focus(&mut self) {
		self.focus.reset();
	}
}
