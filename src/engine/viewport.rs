//! Viewport: zoom, pan, centring and label search over the drawn graph.

use std::collections::HashSet;

use log::debug;

use super::graph::{Graph, NodeId};
use super::layout::Positions;

/// Relative zoom step of the zoom buttons.
pub const ZOOM_STEP: f64 = 1.2;
/// Zoom level used to frame label-search matches.
pub const FOCUS_ZOOM: f64 = 1.6;
/// Lowest zoom level.
pub const MIN_ZOOM: f64 = 0.1;
/// Highest zoom level.
pub const MAX_ZOOM: f64 = 10.0;
/// Screen-space margin kept around the graph by [`Viewport::fit`] and exports.
pub const FIT_PADDING: f64 = 30.0;
/// Seconds a label-search match stays flashed.
pub const FLASH_SECS: f64 = 0.3;
/// Pixel ratio of exported images.
pub const EXPORT_SCALE: f64 = 2.0;

/// A point in world or screen space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate, growing downwards.
	pub y: f64,
}

impl Point {
	/// Point at `(x, y)`.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
	/// Top-left corner.
	pub min: Point,
	/// Bottom-right corner.
	pub max: Point,
}

impl Rect {
	/// Smallest box holding every point; `None` for no points.
	pub fn enclosing(points: impl IntoIterator<Item = Point>) -> Option<Self> {
		points.into_iter().fold(None, |acc, p| {
			Some(match acc {
				None => Rect { min: p, max: p },
				Some(r) => Rect {
					min: Point::new(r.min.x.min(p.x), r.min.y.min(p.y)),
					max: Point::new(r.max.x.max(p.x), r.max.y.max(p.y)),
				},
			})
		})
	}

	/// Width.
	pub fn width(&self) -> f64 {
		self.max.x - self.min.x
	}

	/// Height.
	pub fn height(&self) -> f64 {
		self.max.y - self.min.y
	}

	/// Centre point.
	pub fn center(&self) -> Point {
		Point::new((self.min.x + self.max.x) / 2.0, (self.min.y + self.max.y) / 2.0)
	}
}

/// Bounding box of every positioned node.
pub fn bounds(positions: &Positions) -> Option<Rect> {
	Rect::enclosing(positions.values().copied())
}

/// Canvas transform: `screen = world * k + (x, y)`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewTransform {
	/// Horizontal offset.
	pub x: f64,
	/// Vertical offset.
	pub y: f64,
	/// Scale.
	pub k: f64,
}

/// Nodes briefly highlighted after a label search.
#[derive(Clone, Debug)]
struct Flash {
	nodes: HashSet<NodeId>,
	remaining: f64,
}

/// Zoom level and centre of the visible window onto the graph.
#[derive(Clone, Debug)]
pub struct Viewport {
	zoom: f64,
	center: Point,
	width: f64,
	height: f64,
	flash: Option<Flash>,
}

impl Default for Viewport {
	fn default() -> Self {
		Self::new(800.0, 600.0)
	}
}

impl Viewport {
	/// Viewport of the given screen size looking at the origin at zoom 1.
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			zoom: 1.0,
			center: Point::default(),
			width,
			height,
			flash: None,
		}
	}

	/// Current zoom level.
	pub fn zoom(&self) -> f64 {
		self.zoom
	}

	/// World point at the middle of the screen.
	pub fn center(&self) -> Point {
		self.center
	}

	/// Screen size.
	pub fn size(&self) -> (f64, f64) {
		(self.width, self.height)
	}

	/// Follows a canvas resize; the centre stays put.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	/// Zooms in one step about the current centre.
	pub fn zoom_in(&mut self) {
		self.zoom = clamp_zoom(self.zoom * ZOOM_STEP);
	}

	/// Zooms out one step about the current centre.
	pub fn zoom_out(&mut self) {
		self.zoom = clamp_zoom(self.zoom / ZOOM_STEP);
	}

	/// Zooms by `factor` keeping the world point under `screen` fixed.
	pub fn zoom_at(&mut self, screen: Point, factor: f64) {
		let anchor = self.to_world(screen);
		self.zoom = clamp_zoom(self.zoom * factor);
		self.center = Point::new(
			anchor.x - (screen.x - self.width / 2.0) / self.zoom,
			anchor.y - (screen.y - self.height / 2.0) / self.zoom,
		);
	}

	/// Moves the view by a screen-space drag of `(dx, dy)`.
	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		self.center.x -= dx / self.zoom;
		self.center.y -= dy / self.zoom;
	}

	/// Centres on a world point without changing zoom.
	pub fn center_on(&mut self, point: Point) {
		self.center = point;
	}

	/// Frames `bounds` with [`FIT_PADDING`] on every side.
	pub fn fit(&mut self, bounds: Rect) {
		self.center = bounds.center();
		let avail_w = (self.width - 2.0 * FIT_PADDING).max(1.0);
		let avail_h = (self.height - 2.0 * FIT_PADDING).max(1.0);
		let fit = match (bounds.width() > 0.0, bounds.height() > 0.0) {
			(true, true) => (avail_w / bounds.width()).min(avail_h / bounds.height()),
			(true, false) => avail_w / bounds.width(),
			(false, true) => avail_h / bounds.height(),
			(false, false) => return,
		};
		self.zoom = clamp_zoom(fit);
	}

	/// Centres on every node whose label contains `text` (case-insensitive)
	/// at [`FOCUS_ZOOM`] and flashes them.
	///
	/// Without a match, or with blank text, nothing changes and `None` is
	/// returned.
	pub fn find_by_label(&mut self, graph: &Graph, positions: &Positions, text: &str) -> Option<Vec<NodeId>> {
		let term = text.trim().to_lowercase();
		if term.is_empty() {
			return None;
		}
		let matches: Vec<NodeId> = graph
			.nodes()
			.iter()
			.filter(|n| n.label.to_lowercase().contains(&term))
			.map(|n| n.id.clone())
			.collect();
		let frame = Rect::enclosing(matches.iter().filter_map(|id| positions.get(id).copied()))?;

		debug!("label search {term:?}: {} matches", matches.len());
		self.center = frame.center();
		self.zoom = FOCUS_ZOOM;
		self.flash = Some(Flash {
			nodes: matches.iter().cloned().collect(),
			remaining: FLASH_SECS,
		});
		Some(matches)
	}

	/// Advances the flash timer by `dt` seconds.
	pub fn tick(&mut self, dt: f64) {
		if let Some(flash) = &mut self.flash {
			flash.remaining -= dt;
			if flash.remaining <= 0.0 {
				self.flash = None;
			}
		}
	}

	/// Whether `id` is currently flashed.
	pub fn is_flashing(&self, id: &str) -> bool {
		self.flash.as_ref().is_some_and(|f| f.nodes.contains(id))
	}

	/// Canvas transform for the current zoom and centre.
	pub fn transform(&self) -> ViewTransform {
		ViewTransform {
			x: self.width / 2.0 - self.center.x * self.zoom,
			y: self.height / 2.0 - self.center.y * self.zoom,
			k: self.zoom,
		}
	}

	/// World to screen.
	pub fn to_screen(&self, world: Point) -> Point {
		let t = self.transform();
		Point::new(world.x * t.k + t.x, world.y * t.k + t.y)
	}

	/// Screen to world.
	pub fn to_world(&self, screen: Point) -> Point {
		let t = self.transform();
		Point::new((screen.x - t.x) / t.k, (screen.y - t.y) / t.k)
	}
}

fn clamp_zoom(zoom: f64) -> f64 {
	zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Size and transform of a full-graph image export.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExportFrame {
	/// Image width in pixels.
	pub width: u32,
	/// Image height in pixels.
	pub height: u32,
	/// Transform mapping world space into the image.
	pub transform: ViewTransform,
}

/// Frame covering the whole graph, padded, at `scale` pixels per world unit.
///
/// Independent of the viewport: exports always show the full graph.
pub fn export_frame(bounds: Option<Rect>, scale: f64) -> ExportFrame {
	let bounds = bounds.unwrap_or(Rect {
		min: Point::default(),
		max: Point::default(),
	});
	let width = ((bounds.width() + 2.0 * FIT_PADDING) * scale).ceil().max(1.0);
	let height = ((bounds.height() + 2.0 * FIT_PADDING) * scale).ceil().max(1.0);
	ExportFrame {
		width: width as u32,
		height: height as u32,
		transform: ViewTransform {
			x: (FIT_PADDING - bounds.min.x) * scale,
			y: (FIT_PADDING - bounds.min.y) * scale,
			k: scale,
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::api::{GraphPayload, NodePayload};

	fn labelled(labels: &[(&str, &str, f64, f64)]) -> (Graph, Positions) {
		let (graph, _) = Graph::ingest(GraphPayload {
			nodes: labels
				.iter()
				.map(|(id, label, _, _)| NodePayload {
					id: id.to_string(),
					label: label.to_string(),
					..NodePayload::default()
				})
				.collect(),
			edges: Vec::new(),
		});
		let positions = labels
			.iter()
			.map(|(id, _, x, y)| (NodeId::from(*id), Point::new(*x, *y)))
			.collect();
		(graph, positions)
	}

	fn close(a: f64, b: f64) -> bool {
		(a - b).abs() < 1e-9
	}

	#[test]
	fn zoom_steps_are_relative_about_centre() {
		let mut viewport = Viewport::new(800.0, 600.0);
		viewport.center_on(Point::new(40.0, -20.0));
		viewport.zoom_in();
		viewport.zoom_in();
		assert!(close(viewport.zoom(), 1.44));
		viewport.zoom_out();
		assert!(close(viewport.zoom(), 1.2));
		assert_eq!(viewport.center(), Point::new(40.0, -20.0));
	}

	#[test]
	fn zoom_is_clamped() {
		let mut viewport = Viewport::default();
		for _ in 0..100 {
			viewport.zoom_in();
		}
		assert_eq!(viewport.zoom(), MAX_ZOOM);
		for _ in 0..200 {
			viewport.zoom_out();
		}
		assert_eq!(viewport.zoom(), MIN_ZOOM);
	}

	#[test]
	fn zoom_at_keeps_point_under_cursor() {
		let mut viewport = Viewport::new(800.0, 600.0);
		let cursor = Point::new(650.0, 120.0);
		let before = viewport.to_world(cursor);
		viewport.zoom_at(cursor, 1.1);
		let after = viewport.to_world(cursor);
		assert!(close(before.x, after.x) && close(before.y, after.y));
	}

	#[test]
	fn pan_moves_world_with_pointer() {
		let mut viewport = Viewport::new(800.0, 600.0);
		viewport.zoom_in();
		let world = Point::new(10.0, 10.0);
		let before = viewport.to_screen(world);
		viewport.pan_by(25.0, -5.0);
		let after = viewport.to_screen(world);
		assert!(close(after.x - before.x, 25.0));
		assert!(close(after.y - before.y, -5.0));
	}

	#[test]
	fn label_search_frames_matches() {
		let (graph, positions) = labelled(&[
			("d1", "Neural Networks.pdf", -100.0, 0.0),
			("k1", "neural", 100.0, 50.0),
			("k2", "finance", 0.0, 300.0),
		]);
		let mut viewport = Viewport::default();
		let found = viewport.find_by_label(&graph, &positions, "NEURAL").expect("matches");

		assert_eq!(found, vec![NodeId::from("d1"), NodeId::from("k1")]);
		assert_eq!(viewport.zoom(), FOCUS_ZOOM);
		assert_eq!(viewport.center(), Point::new(0.0, 25.0));
		assert!(viewport.is_flashing("k1"));
		assert!(!viewport.is_flashing("k2"));

		viewport.tick(0.2);
		assert!(viewport.is_flashing("d1"));
		viewport.tick(0.2);
		assert!(!viewport.is_flashing("d1"));
	}

	#[test]
	fn label_search_without_match_is_a_no_op() {
		let (graph, positions) = labelled(&[("a", "alpha", 5.0, 5.0)]);
		let mut viewport = Viewport::default();
		viewport.zoom_in();
		viewport.center_on(Point::new(3.0, 4.0));

		assert_eq!(viewport.find_by_label(&graph, &positions, "zzz"), None);
		assert_eq!(viewport.find_by_label(&graph, &positions, "   "), None);
		assert!(close(viewport.zoom(), ZOOM_STEP));
		assert_eq!(viewport.center(), Point::new(3.0, 4.0));
		assert!(!viewport.is_flashing("a"));
	}

	#[test]
	fn fit_frames_bounds_with_padding() {
		let mut viewport = Viewport::new(460.0, 260.0);
		viewport.fit(Rect {
			min: Point::new(0.0, 0.0),
			max: Point::new(200.0, 100.0),
		});
		assert_eq!(viewport.center(), Point::new(100.0, 50.0));
		assert!(close(viewport.zoom(), 2.0));
	}

	#[test]
	fn export_frame_covers_whole_graph() {
		let frame = export_frame(
			Some(Rect {
				min: Point::new(-50.0, -10.0),
				max: Point::new(50.0, 10.0),
			}),
			EXPORT_SCALE,
		);
		assert_eq!((frame.width, frame.height), (320, 160));
		assert_eq!(frame.transform.k, 2.0);
		assert_eq!(frame.transform.x, 160.0);
		assert_eq!(frame.transform.y, 80.0);
	}
}
