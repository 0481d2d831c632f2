use std::collections::{HashMap, HashSet};

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};

use crate::engine::layout::{self, Positions};
use crate::engine::{Graph, GraphStore, NodeId, NodeKind, Point};

pub const NODE_RADIUS: f64 = 6.0;
pub const HIT_RADIUS: f64 = 12.0;
/// Screen pixels a press may travel before it counts as a drag.
const DRAG_SLOP: f64 = 3.0;

#[derive(Clone, Debug)]
pub struct NodeInfo {
	pub id: NodeId,
	pub label: String,
	pub kind: NodeKind,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<DefaultNodeIdx>,
	pub moved: bool,
	pub start: Point,
	pub node_start_x: f32,
	pub node_start_y: f32,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub last: Point,
}

/// Seconds the pointer must rest on a node before the spotlight fades in.
const SPOTLIGHT_HOLD: f64 = 0.08;
const SPOTLIGHT_RISE: f64 = 1.8;
const SPOTLIGHT_FALL: f64 = 1.26;

/// Pointer highlight around one node and its direct neighbours.
///
/// The lit set outlives the pointer so it can fade out; pointing at another
/// node swaps it immediately.
#[derive(Clone, Debug, Default)]
pub struct Spotlight {
	lit: Option<(NodeId, HashSet<NodeId>)>,
	pointing: bool,
	held: f64,
	level: f64,
}

impl Spotlight {
	pub fn focus_on(&mut self, graph: &Graph, id: &NodeId) {
		if self.pointing && self.centre() == Some(id) {
			return;
		}
		if !self.pointing {
			self.held = 0.0;
		}
		let ring = graph.neighbors(id.as_str()).cloned().collect();
		self.lit = Some((id.clone(), ring));
		self.pointing = true;
	}

	pub fn leave(&mut self) {
		self.pointing = false;
	}

	pub fn centre(&self) -> Option<&NodeId> {
		self.lit.as_ref().map(|(centre, _)| centre)
	}

	pub fn is_centre(&self, id: &str) -> bool {
		self.centre().is_some_and(|c| c.as_str() == id)
	}

	/// Centre or one of its neighbours.
	pub fn covers(&self, id: &str) -> bool {
		self.lit
			.as_ref()
			.is_some_and(|(centre, ring)| centre.as_str() == id || ring.iter().any(|n| n.as_str() == id))
	}

	pub fn is_lit(&self) -> bool {
		self.lit.is_some()
	}

	/// Fade level in `0.0..=1.0`.
	pub fn level(&self) -> f64 {
		self.level
	}

	fn advance(&mut self, dt: f64) {
		if self.pointing {
			self.held = (self.held + dt).min(SPOTLIGHT_HOLD);
			if self.held >= SPOTLIGHT_HOLD {
				self.level = (self.level + (1.0 - self.level) * SPOTLIGHT_RISE * dt).min(1.0);
			}
		} else if self.lit.is_some() {
			self.level -= self.level * SPOTLIGHT_FALL * dt;
			if self.level < 0.01 {
				self.level = 0.0;
				self.lit = None;
			}
		}
	}
}

/// Simulation and pointer state for one graph revision.
pub struct GraphViewState {
	/// Edge payload is the index into the store's edge list.
	pub graph: ForceGraph<NodeInfo, usize>,
	pub drag: DragState,
	pub pan: PanState,
	pub spotlight: Spotlight,
	pub animation_running: bool,
	revision: u64,
}

impl GraphViewState {
	/// Seeds nodes from the store's layout. Layered graphs are anchored in
	/// place; force-directed ones start on a ring and keep simulating.
	pub fn new(store: &GraphStore) -> Self {
		let strategy = store.layout();
		let seeds = layout::arrange(store.graph(), strategy);
		let anchored = !strategy.is_animated();

		let mut graph = ForceGraph::new(SimulationParameters {
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		});
		let mut id_to_idx = HashMap::new();

		for node in store.graph().nodes() {
			let seed = seeds.get(&node.id).copied().unwrap_or_default();
			let idx = graph.add_node(NodeData {
				x: seed.x as f32,
				y: seed.y as f32,
				mass: 10.0,
				is_anchor: anchored,
				user_data: NodeInfo {
					id: node.id.clone(),
					label: node.label.clone(),
					kind: node.kind,
				},
			});
			id_to_idx.insert(node.id.clone(), idx);
		}

		for (i, edge) in store.graph().edges().iter().enumerate() {
			if let (Some(&src), Some(&tgt)) = (id_to_idx.get(&edge.source), id_to_idx.get(&edge.target)) {
				graph.add_edge(src, tgt, EdgeData { user_data: i });
			}
		}

		Self {
			graph,
			drag: DragState::default(),
			pan: PanState::default(),
			spotlight: Spotlight::default(),
			animation_running: strategy.is_animated(),
			revision: store.revision(),
		}
	}

	/// Whether this state was built from the store's current graph.
	pub fn is_current(&self, store: &GraphStore) -> bool {
		self.revision == store.revision()
	}

	/// Where every node is drawn right now.
	pub fn positions(&self) -> Positions {
		let mut positions = Positions::new();
		self.graph.visit_nodes(|node| {
			positions.insert(node.data.user_data.id.clone(), Point::new(node.x() as f64, node.y() as f64));
		});
		positions
	}

	pub fn node_at(&self, world: Point) -> Option<DefaultNodeIdx> {
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let (dx, dy) = (node.x() as f64 - world.x, node.y() as f64 - world.y);
			// HIT_RADIUS is in world-space, scales with zoom like nodes
			if (dx * dx + dy * dy).sqrt() < HIT_RADIUS {
				found = Some(node.index());
			}
		});
		found
	}

	pub fn info(&self, idx: DefaultNodeIdx) -> Option<NodeInfo> {
		let mut found = None;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				found = Some(node.data.user_data.clone());
			}
		});
		found
	}

	pub fn start_drag(&mut self, idx: DefaultNodeIdx, screen: Point) {
		self.drag = DragState {
			active: true,
			node_idx: Some(idx),
			moved: false,
			start: screen,
			..DragState::default()
		};
		let drag = &mut self.drag;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				drag.node_start_x = node.x();
				drag.node_start_y = node.y();
			}
		});
	}

	/// Moves the dragged node so it follows the pointer at zoom `k`.
	pub fn drag_to(&mut self, screen: Point, k: f64) {
		let Some(idx) = self.drag.node_idx else {
			return;
		};
		let (sx, sy) = (screen.x - self.drag.start.x, screen.y - self.drag.start.y);
		if !self.drag.moved && (sx * sx + sy * sy).sqrt() < DRAG_SLOP {
			return;
		}
		self.drag.moved = true;
		let (nx, ny) = (
			self.drag.node_start_x + (sx / k) as f32,
			self.drag.node_start_y + (sy / k) as f32,
		);
		self.graph.visit_nodes_mut(|node| {
			if node.index() == idx {
				node.data.x = nx;
				node.data.y = ny;
				node.data.is_anchor = true;
			}
		});
	}

	/// Ends any drag or pan. Returns whether a node was actually moved.
	pub fn release(&mut self) -> bool {
		let moved = self.drag.active && self.drag.moved;
		self.drag = DragState::default();
		self.pan.active = false;
		moved
	}

	pub fn tick(&mut self, dt: f32) {
		if self.animation_running {
			self.graph.update(dt);
		}

		self.spotlight.advance(dt as f64);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::api::{EdgePayload, GraphPayload, NodePayload};
	use crate::engine::{Graph, LayoutStrategy};

	fn store(n: usize, edges: &[(usize, usize)]) -> GraphStore {
		let (graph, _) = Graph::ingest(GraphPayload {
			nodes: (0..n)
				.map(|i| NodePayload {
					id: format!("n{i}"),
					label: format!("node {i}"),
					..NodePayload::default()
				})
				.collect(),
			edges: edges
				.iter()
				.map(|(s, t)| EdgePayload {
					source: format!("n{s}"),
					target: format!("n{t}"),
					weight: None,
				})
				.collect(),
		});
		let mut store = GraphStore::default();
		store.replace("q", graph);
		store
	}

	#[test]
	fn small_graph_stays_on_its_layered_seed() {
		let store = store(3, &[(0, 1), (0, 2)]);
		assert_eq!(store.layout(), LayoutStrategy::Layered);
		let mut view = GraphViewState::new(&store);
		let seeds = layout::arrange(store.graph(), LayoutStrategy::Layered);

		for _ in 0..30 {
			view.tick(0.016);
		}
		let positions = view.positions();
		for (id, seed) in &seeds {
			let now = positions[id];
			assert!((now.x - seed.x).abs() < 1e-3 && (now.y - seed.y).abs() < 1e-3, "{id} moved");
		}
		assert!(!view.animation_running);
	}

	#[test]
	fn large_graph_animates() {
		let store = store(45, &[]);
		let view = GraphViewState::new(&store);
		assert!(view.animation_running);
		assert_eq!(view.positions().len(), 45);
	}

	#[test]
	fn hit_test_finds_the_node_under_the_pointer() {
		let store = store(3, &[(0, 1)]);
		let view = GraphViewState::new(&store);
		let at = view.positions()[&NodeId::from("n0")];

		let idx = view.node_at(at).expect("hit");
		assert_eq!(view.info(idx).map(|i| i.id), Some(NodeId::from("n0")));
		assert!(view.node_at(Point::new(at.x + 500.0, at.y + 500.0)).is_none());
	}

	#[test]
	fn spotlight_covers_neighbours_and_fades_after_hold() {
		let store = store(3, &[(0, 1)]);
		let mut view = GraphViewState::new(&store);
		view.spotlight.focus_on(store.graph(), &NodeId::from("n1"));

		assert!(view.spotlight.is_centre("n1"));
		assert!(view.spotlight.covers("n0"));
		assert!(!view.spotlight.covers("n2"));

		view.tick(0.05);
		assert_eq!(view.spotlight.level(), 0.0);
		for _ in 0..30 {
			view.tick(0.016);
		}
		assert!(view.spotlight.level() > 0.3);
	}

	#[test]
	fn spotlight_goes_dark_after_leaving() {
		let store = store(3, &[(0, 1), (1, 2)]);
		let mut view = GraphViewState::new(&store);
		view.spotlight.focus_on(store.graph(), &NodeId::from("n0"));
		for _ in 0..60 {
			view.tick(0.016);
		}

		view.spotlight.leave();
		view.tick(0.016);
		assert!(view.spotlight.is_lit());
		assert!(view.spotlight.covers("n1"));
		for _ in 0..600 {
			view.tick(0.016);
		}
		assert!(!view.spotlight.is_lit());
		assert_eq!(view.spotlight.level(), 0.0);
	}

	#[test]
	fn pointing_elsewhere_swaps_the_lit_set() {
		let store = store(4, &[(0, 1), (2, 3)]);
		let mut spotlight = Spotlight::default();
		spotlight.focus_on(store.graph(), &NodeId::from("n0"));
		spotlight.focus_on(store.graph(), &NodeId::from("n2"));
		assert!(spotlight.covers("n3"));
		assert!(!spotlight.covers("n1"));
	}

	#[test]
	fn drag_moves_node_past_slop_only() {
		let store = store(2, &[(0, 1)]);
		let mut view = GraphViewState::new(&store);
		let id = NodeId::from("n1");
		let before = view.positions()[&id];
		let idx = view.node_at(before).expect("hit");

		view.start_drag(idx, Point::new(10.0, 10.0));
		view.drag_to(Point::new(11.0, 10.0), 1.0);
		assert!(!view.release());
		assert_eq!(view.positions()[&id], before);

		view.start_drag(idx, Point::new(10.0, 10.0));
		view.drag_to(Point::new(60.0, 10.0), 2.0);
		assert!(view.release());
		let after = view.positions()[&id];
		assert!((after.x - before.x - 25.0).abs() < 1e-3);
		assert!(view.is_current(&store));
	}
}
