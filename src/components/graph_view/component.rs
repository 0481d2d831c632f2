use std::cell::RefCell;
use std::rc::Rc;

use leptos::ev::{self, SubmitEvent};
use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent};

use super::render;
use super::state::{GraphViewState, PanState};
use crate::components::{AppExplorer, SharedExplorer, refresh};
use crate::engine::Point;
use crate::engine::viewport::{self, EXPORT_SCALE};

const FRAME_SECS: f32 = 0.016;
const FALLBACK_SIZE: (f64, f64) = (800.0, 600.0);

type Canvas = NodeRef<leptos::html::Canvas>;

/// Pointer position relative to the canvas.
fn local_point(canvas_ref: Canvas, ev: &MouseEvent) -> Option<Point> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?;
	let rect = canvas.get_bounding_client_rect();
	Some(Point::new(ev.client_x() as f64 - rect.left(), ev.client_y() as f64 - rect.top()))
}

/// Sizes the canvas to its container and tells the viewport.
fn fit_canvas(canvas: &HtmlCanvasElement, explorer: &AppExplorer) {
	let (w, h) = canvas
		.parent_element()
		.map(|p| (p.client_width() as f64, p.client_height() as f64))
		.filter(|&(w, h)| w > 0.0 && h > 0.0)
		.unwrap_or(FALLBACK_SIZE);
	canvas.set_width(w as u32);
	canvas.set_height(h as u32);
	explorer.update(|s| s.viewport.resize(w, h));
}

/// One animation frame: rebuild on a new graph, advance, draw.
fn draw_frame(explorer: &AppExplorer, slot: &mut Option<GraphViewState>, ctx: &CanvasRenderingContext2d) {
	let stale = explorer.read(|s| !slot.as_ref().is_some_and(|v| v.is_current(&s.graph)));
	if stale {
		let view = explorer.read(|s| GraphViewState::new(&s.graph));
		if let Some(bounds) = viewport::bounds(&view.positions()) {
			explorer.update(|s| s.viewport.fit(bounds));
		}
		*slot = Some(view);
	}

	explorer.update(|s| s.viewport.tick(FRAME_SECS as f64));
	if let Some(view) = slot.as_mut() {
		view.tick(FRAME_SECS);
		explorer.read(|s| render::render(view, s, ctx));
	}
}

/// Canvas view of the current graph with its toolbar.
#[component]
pub fn GraphView(explorer: SharedExplorer, revision: RwSignal<u64>) -> impl IntoView {
	let canvas_ref: Canvas = NodeRef::new();
	let state: Rc<RefCell<Option<GraphViewState>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (state_init, animate_init) = (state.clone(), animate.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if animate_init.borrow().is_some() {
			return;
		}
		let Some(ex) = explorer.try_get_value() else {
			return;
		};
		fit_canvas(&canvas, &ex);

		let ctx: CanvasRenderingContext2d = match canvas.get_context("2d") {
			Ok(Some(ctx)) => match ctx.dyn_into() {
				Ok(ctx) => ctx,
				Err(_) => return,
			},
			_ => {
				warn!("graph canvas has no 2d context");
				return;
			}
		};

		let (state_anim, animate_inner) = (state_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if explorer.try_with_value(|ex| draw_frame(ex, &mut state_anim.borrow_mut(), &ctx)).is_none() {
				debug!("graph view detached, stopping animation");
				return;
			}
			if let (Some(window), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
				let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let (Some(window), Some(cb)) = (web_sys::window(), animate_init.borrow().as_ref()) {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let resize = window_event_listener(ev::resize, move |_| {
		if let (Some(canvas), Some(ex)) = (canvas_ref.get_untracked(), explorer.try_get_value()) {
			fit_canvas(&canvas, &ex);
		}
	});
	on_cleanup(move || resize.remove());

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(screen) = local_point(canvas_ref, &ev) else {
			return;
		};
		let Some(world) = explorer.try_with_value(|ex| ex.read(|s| s.viewport.to_world(screen))) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			match s.node_at(world) {
				Some(idx) => s.start_drag(idx, screen),
				None => s.pan = PanState { active: true, last: screen },
			}
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let (Some(screen), Some(ex)) = (local_point(canvas_ref, &ev), explorer.try_get_value()) else {
			return;
		};
		let (world, k) = ex.read(|s| (s.viewport.to_world(screen), s.viewport.zoom()));

		if let Some(ref mut s) = *state_mm.borrow_mut() {
			if s.drag.active {
				s.drag_to(screen, k);
				return;
			}
			match s.node_at(world).and_then(|idx| s.info(idx)) {
				Some(info) => ex.read(|st| s.spotlight.focus_on(st.graph.graph(), &info.id)),
				None => s.spotlight.leave(),
			}
			if s.pan.active {
				let (dx, dy) = (screen.x - s.pan.last.x, screen.y - s.pan.last.y);
				s.pan.last = screen;
				ex.update(|st| st.viewport.pan_by(dx, dy));
			}
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			s.release();
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.release();
			s.spotlight.leave();
		}
	};

	let state_dc = state.clone();
	let on_dblclick = move |ev: MouseEvent| {
		let (Some(screen), Some(ex)) = (local_point(canvas_ref, &ev), explorer.try_get_value()) else {
			return;
		};
		let world = ex.read(|s| s.viewport.to_world(screen));
		let picked = state_dc
			.borrow()
			.as_ref()
			.and_then(|s| s.node_at(world).and_then(|idx| s.info(idx)));
		if let Some(info) = picked {
			ex.isolate(info.id.as_str());
			refresh(revision);
		}
	};

	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(screen) = local_point(canvas_ref, &ev) else {
			return;
		};
		let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
		explorer.try_with_value(|ex| ex.update(|s| s.viewport.zoom_at(screen, factor)));
	};

	let find_text = RwSignal::new(String::new());
	let state_find = state.clone();
	let on_find = move |ev: SubmitEvent| {
		ev.prevent_default();
		let positions = state_find.borrow().as_ref().map(GraphViewState::positions).unwrap_or_default();
		let text = find_text.get_untracked();
		match explorer.with_value(|ex| ex.find_by_label(&text, &positions)) {
			Some(matches) => debug!("found {} nodes for {text:?}", matches.len()),
			None => debug!("no node label matches {text:?}"),
		}
	};

	let state_fit = state.clone();
	let on_fit = move |_| {
		let bounds = state_fit.borrow().as_ref().and_then(|s| viewport::bounds(&s.positions()));
		if let Some(bounds) = bounds {
			explorer.with_value(|ex| ex.update(|s| s.viewport.fit(bounds)));
		}
	};

	let state_export = state.clone();
	let on_export = move |_| {
		let Some(ex) = explorer.try_get_value() else {
			return;
		};
		let slot = state_export.borrow();
		let Some(view) = slot.as_ref() else {
			return;
		};
		let frame = viewport::export_frame(viewport::bounds(&view.positions()), EXPORT_SCALE);
		let exported = ex
			.read(|s| render::export_png(view, s, frame))
			.and_then(|url| render::deliver(&url));
		if let Err(err) = exported {
			warn!("graph export failed: {err:?}");
		}
	};

	let zoom_in = move |_| explorer.with_value(|ex| ex.update(|s| s.viewport.zoom_in()));
	let zoom_out = move |_| explorer.with_value(|ex| ex.update(|s| s.viewport.zoom_out()));
	let reset_filter = move |_| {
		explorer.with_value(|ex| ex.reset_focus());
		refresh(revision);
	};

	let unfiltered = move || {
		revision.track();
		explorer.with_value(|ex| ex.read(|s| s.graph.focus.isolated().is_none()))
	};
	let loading = move || {
		revision.track();
		explorer.with_value(|ex| ex.read(|s| s.is_graph_loading()))
	};

	view! {
		<div class="graph-view">
			<div class="graph-toolbar">
				<form on:submit=on_find>
					<input
						type="text"
						placeholder="Find node..."
						prop:value=move || find_text.get()
						on:input=move |ev| find_text.set(event_target_value(&ev))
					/>
					<button type="submit">"Find"</button>
				</form>
				<button on:click=zoom_in title="Zoom in">"+"</button>
				<button on:click=zoom_out title="Zoom out">"-"</button>
				<button on:click=on_fit>"Fit"</button>
				<button on:click=reset_filter disabled=unfiltered>"Reset filter"</button>
				<button on:click=on_export>"Export PNG"</button>
			</div>
			<div class="graph-stage" style="position: relative; width: 100%; height: 480px;">
				<canvas
					node_ref=canvas_ref
					class="graph-canvas"
					on:mousedown=on_mousedown
					on:mousemove=on_mousemove
					on:mouseup=on_mouseup
					on:mouseleave=on_mouseleave
					on:dblclick=on_dblclick
					on:wheel=on_wheel
					style="display: block; cursor: grab;"
				/>
				<Show when=loading>
					<div class="graph-loading">"Loading graph..."</div>
				</Show>
			</div>
		</div>
	}
}
