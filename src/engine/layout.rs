//! Layout selection and seed positions.

use std::collections::{HashMap, VecDeque};
use std::f64::consts::PI;

use super::graph::{Graph, NodeId};
use super::viewport::Point;

/// Largest node count still drawn with the small-graph layout.
pub const SMALL_GRAPH_MAX_NODES: usize = 40;

/// Horizontal gap between neighbors in a layered rank.
pub const NODE_SEP: f64 = 60.0;
/// Vertical gap between layered ranks.
pub const RANK_SEP: f64 = 90.0;
/// Arc length per node on the force-directed seed ring.
const RING_SPACING: f64 = 24.0;
const MIN_RING_RADIUS: f64 = 100.0;

/// World-space position of every node.
pub type Positions = HashMap<NodeId, Point>;

/// How a graph is arranged on screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LayoutStrategy {
	/// Top-down ranks; fixed positions, readable for small graphs.
	#[default]
	Layered,
	/// Animated force simulation, scales to larger graphs.
	ForceDirected,
}

impl LayoutStrategy {
	/// Whether positions keep changing after the seed (simulation running).
	pub fn is_animated(self) -> bool {
		matches!(self, Self::ForceDirected)
	}
}

/// Picks the layout for a graph of `node_count` nodes.
pub fn select(node_count: usize) -> LayoutStrategy {
	if node_count <= SMALL_GRAPH_MAX_NODES {
		LayoutStrategy::Layered
	} else {
		LayoutStrategy::ForceDirected
	}
}

/// Seed positions for `graph`, centred on the origin.
pub fn arrange(graph: &Graph, strategy: LayoutStrategy) -> Positions {
	match strategy {
		LayoutStrategy::Layered => layered(graph),
		LayoutStrategy::ForceDirected => ring(graph),
	}
}

fn ring(graph: &Graph) -> Positions {
	let n = graph.node_count();
	let radius = (n as f64 * RING_SPACING / (2.0 * PI)).max(MIN_RING_RADIUS);
	graph
		.nodes()
		.iter()
		.enumerate()
		.map(|(i, node)| {
			let angle = i as f64 * 2.0 * PI / n as f64;
			(node.id.clone(), Point::new(radius * angle.cos(), radius * angle.sin()))
		})
		.collect()
}

/// Longest-path ranking from the sources, so every edge points down.
/// Cycles are broken at the earliest node still waiting.
fn ranks(graph: &Graph) -> Vec<usize> {
	let n = graph.node_count();
	let mut out: Vec<Vec<usize>> = vec![Vec::new(); n];
	let mut indegree = vec![0usize; n];
	for edge in graph.edges() {
		let (Some(s), Some(t)) = (graph.position_of(edge.source.as_str()), graph.position_of(edge.target.as_str())) else {
			continue;
		};
		if s == t || out[s].contains(&t) {
			continue;
		}
		out[s].push(t);
		indegree[t] += 1;
	}

	let mut rank = vec![0usize; n];
	let mut done = vec![false; n];
	let mut queue: VecDeque<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
	let mut processed = 0;
	while processed < n {
		let Some(u) = queue.pop_front().or_else(|| (0..n).find(|&i| !done[i])) else {
			break;
		};
		if done[u] {
			continue;
		}
		done[u] = true;
		processed += 1;
		for &v in &out[u] {
			if done[v] {
				continue;
			}
			rank[v] = rank[v].max(rank[u] + 1);
			indegree[v] -= 1;
			if indegree[v] == 0 {
				queue.push_back(v);
			}
		}
	}
	rank
}

fn layered(graph: &Graph) -> Positions {
	let rank = ranks(graph);
	let depth = rank.iter().copied().max().map_or(0, |r| r + 1);

	let mut preds: Vec<Vec<usize>> = vec![Vec::new(); graph.node_count()];
	for edge in graph.edges() {
		if let (Some(s), Some(t)) = (graph.position_of(edge.source.as_str()), graph.position_of(edge.target.as_str())) {
			preds[t].push(s);
		}
	}

	let mut order = vec![0.0f64; graph.node_count()];
	let mut positions = Positions::with_capacity(graph.node_count());
	let y_offset = (depth.saturating_sub(1)) as f64 * RANK_SEP / 2.0;

	for r in 0..depth {
		let mut members: Vec<(f64, usize)> = (0..graph.node_count())
			.filter(|&i| rank[i] == r)
			.map(|i| {
				let above: Vec<f64> = preds[i].iter().filter(|&&p| rank[p] < r).map(|&p| order[p]).collect();
				let barycenter = if above.is_empty() {
					f64::INFINITY
				} else {
					above.iter().sum::<f64>() / above.len() as f64
				};
				(barycenter, i)
			})
			.collect();
		members.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

		let half = (members.len().saturating_sub(1)) as f64 / 2.0;
		for (slot, &(_, i)) in members.iter().enumerate() {
			order[i] = slot as f64;
			positions.insert(
				graph.nodes()[i].id.clone(),
				Point::new((slot as f64 - half) * NODE_SEP, r as f64 * RANK_SEP - y_offset),
			);
		}
	}
	positions
}
