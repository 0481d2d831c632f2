use std::f64::consts::PI;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlAnchorElement, HtmlCanvasElement};

use super::state::{GraphViewState, NODE_RADIUS};
use crate::engine::viewport::ExportFrame;
use crate::engine::{ExplorerState, NodeKind, ViewTransform};

const BACKGROUND: &str = "#ffffff";
const FLASH: &str = "#10b981";
const DIMMED_ALPHA: f64 = 0.12;
const EXPORT_NAME: &str = "graph.png";

fn kind_color(kind: NodeKind) -> &'static str {
	match kind {
		NodeKind::Document => "#2563eb",
		NodeKind::Keyword => "#f59e0b",
		NodeKind::Unknown => "#94a3b8",
	}
}

/// Weights 1..=10 map onto 1..=4 px; heavier edges are capped.
fn edge_width(weight: f64) -> f64 {
	1.0 + (weight.clamp(1.0, 10.0) - 1.0) / 3.0
}

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

pub fn render(view: &GraphViewState, explorer: &ExplorerState, ctx: &CanvasRenderingContext2d) {
	let (width, height) = explorer.viewport.size();
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, width, height);
	draw_scene(view, explorer, ctx, explorer.viewport.transform());
}

fn draw_scene(view: &GraphViewState, explorer: &ExplorerState, ctx: &CanvasRenderingContext2d, transform: ViewTransform) {
	ctx.save();
	let _ = ctx.translate(transform.x, transform.y);
	let _ = ctx.scale(transform.k, transform.k);
	draw_edges(view, explorer, ctx, transform.k);
	draw_nodes(view, explorer, ctx, transform.k);
	ctx.restore();
}

fn draw_edges(view: &GraphViewState, explorer: &ExplorerState, ctx: &CanvasRenderingContext2d, k: f64) {
	let t = ease_out_cubic(view.spotlight.level());
	let edges = explorer.graph.graph().edges();
	let focus = &explorer.graph.focus;

	view.graph.visit_edges(|n1, n2, edge| {
		let (x1, y1, x2, y2) = (n1.x() as f64, n1.y() as f64, n2.x() as f64, n2.y() as f64);
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			return;
		}
		let Some(stored) = edges.get(edge.user_data) else {
			return;
		};

		let lit = view.spotlight.covers(stored.source.as_str()) && view.spotlight.covers(stored.target.as_str());
		let alpha = if focus.is_edge_dimmed(stored) {
			DIMMED_ALPHA
		} else if lit {
			0.6 + 0.3 * t
		} else if view.spotlight.is_lit() {
			0.6 - 0.3 * t
		} else {
			0.6
		};

		ctx.set_stroke_style_str(&format!("rgba(100, 116, 139, {alpha})"));
		ctx.set_line_width(edge_width(stored.weight) / k);
		let (ux, uy) = (dx / dist, dy / dist);
		ctx.begin_path();
		ctx.move_to(x1 + ux * NODE_RADIUS, y1 + uy * NODE_RADIUS);
		ctx.line_to(x2 - ux * NODE_RADIUS, y2 - uy * NODE_RADIUS);
		ctx.stroke();
	});
}

fn draw_nodes(view: &GraphViewState, explorer: &ExplorerState, ctx: &CanvasRenderingContext2d, k: f64) {
	let t = ease_out_cubic(view.spotlight.level());
	let focus = &explorer.graph.focus;
	let font = format!("{}px sans-serif", 10.0 / k.max(0.5));

	view.graph.visit_nodes(|node| {
		let info = &node.data.user_data;
		let (x, y) = (node.x() as f64, node.y() as f64);
		let dimmed = focus.is_node_dimmed(info.id.as_str());
		let hovered = view.spotlight.is_centre(info.id.as_str());

		let radius = if hovered { NODE_RADIUS * (1.0 + 0.35 * t) } else { NODE_RADIUS };
		let alpha = if dimmed {
			DIMMED_ALPHA
		} else if view.spotlight.is_lit() && !view.spotlight.covers(info.id.as_str()) {
			1.0 - 0.6 * t
		} else {
			1.0
		};

		ctx.set_global_alpha(alpha);
		if hovered && t > 0.01 && !dimmed {
			draw_glow(ctx, x, y, radius, t);
		}
		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(kind_color(info.kind));
		ctx.fill();

		if explorer.viewport.is_flashing(info.id.as_str()) {
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius + 3.0 / k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(FLASH);
			ctx.set_line_width(3.0 / k);
			ctx.stroke();
		}

		ctx.set_fill_style_str("#0f172a");
		ctx.set_font(&font);
		let _ = ctx.fill_text(&info.label, x + radius + 3.0, y + 3.0);
		ctx.set_global_alpha(1.0);
	});
}

fn draw_glow(ctx: &CanvasRenderingContext2d, x: f64, y: f64, radius: f64, t: f64) {
	let glow_radius = NODE_RADIUS * (1.8 + 1.2 * t);
	let Ok(gradient) = ctx.create_radial_gradient(x, y, radius * 0.3, x, y, glow_radius) else {
		return;
	};
	let _ = gradient.add_color_stop(0.0, &format!("rgba(239, 68, 68, {})", 0.35 * t));
	let _ = gradient.add_color_stop(1.0, "rgba(239, 68, 68, 0)");
	ctx.begin_path();
	let _ = ctx.arc(x, y, glow_radius, 0.0, 2.0 * PI);
	#[allow(deprecated)]
	ctx.set_fill_style(&gradient);
	ctx.fill();
}

/// Draws the whole graph into an offscreen canvas and returns a PNG data URL.
pub fn export_png(view: &GraphViewState, explorer: &ExplorerState, frame: ExportFrame) -> Result<String, JsValue> {
	let document = web_sys::window()
		.and_then(|w| w.document())
		.ok_or_else(|| JsValue::from_str("no document"))?;
	let canvas: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
	canvas.set_width(frame.width);
	canvas.set_height(frame.height);
	let ctx: CanvasRenderingContext2d = canvas
		.get_context("2d")?
		.ok_or_else(|| JsValue::from_str("no 2d context"))?
		.dyn_into()?;

	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, frame.width as f64, frame.height as f64);
	draw_scene(view, explorer, &ctx, frame.transform);
	canvas.to_data_url_with_type("image/png")
}

/// Shows an exported image in a new window, or downloads it as `graph.png`
/// when popups are blocked.
pub fn deliver(data_url: &str) -> Result<(), JsValue> {
	let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
	let popup = window.open().ok().flatten().and_then(|w| w.document());
	if let Some(doc) = popup {
		if let Some(body) = doc.body() {
			let image = doc.create_element("img")?;
			image.set_attribute("src", data_url)?;
			image.set_attribute("alt", EXPORT_NAME)?;
			body.append_child(&image)?;
			return Ok(());
		}
	}

	let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;
	let link: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
	link.set_href(data_url);
	link.set_download(EXPORT_NAME);
	link.click();
	Ok(())
}
