use leptos::ev::{self, SubmitEvent};
use leptos::prelude::*;
use leptos::task::spawn_local;
use log::warn;
use wasm_bindgen::JsCast;
use web_sys::{Event, KeyboardEvent, MouseEvent, Node};

use crate::components::{SharedExplorer, refresh, run_query};
use crate::engine::{QUIET_PERIOD, SuggestionList, SuggestionSnapshot, Ticket};

const LIST_ID: &str = "search-suggestions";

fn option_id(index: usize) -> String {
	format!("sugg-{index}")
}

/// Query input with a debounced, keyboard-navigable suggestion list.
#[component]
pub fn SearchBar(explorer: SharedExplorer, revision: RwSignal<u64>) -> impl IntoView {
	let container = NodeRef::<leptos::html::Div>::new();
	let timer = StoredValue::new(None::<TimeoutHandle>);

	// Replaces the armed debounce timer; `None` only disarms.
	let arm = move |ticket: Option<Ticket>| {
		if let Some(handle) = timer.try_get_value().flatten() {
			handle.clear();
		}
		timer.try_set_value(None);
		let Some(ticket) = ticket else {
			return;
		};
		let armed = set_timeout_with_handle(
			move || {
				let Some(ex) = explorer.try_get_value() else {
					return;
				};
				spawn_local(async move {
					ex.settle(ticket).await;
					refresh(revision);
				});
			},
			QUIET_PERIOD,
		);
		match armed {
			Ok(handle) => {
				timer.try_set_value(Some(handle));
			}
			Err(err) => warn!("could not arm suggestion timer: {err:?}"),
		}
	};

	let with_list = move |f: &dyn Fn(&mut SuggestionList)| {
		explorer.with_value(|ex| ex.update(|s| f(&mut s.suggestions)));
		refresh(revision);
	};

	let submit = move |chosen: Option<String>| {
		arm(None);
		if let Some(query) = chosen {
			run_query(explorer, revision, query);
		}
		refresh(revision);
	};

	let on_input = move |ev: Event| {
		let text = event_target_value(&ev);
		let ticket = explorer.with_value(|ex| ex.on_input(&text));
		arm(ticket);
		refresh(revision);
	};

	let on_keydown = move |ev: KeyboardEvent| match ev.key().as_str() {
		"ArrowDown" => {
			ev.prevent_default();
			with_list(&|list| list.move_down());
		}
		"ArrowUp" => {
			ev.prevent_default();
			with_list(&|list| list.move_up());
		}
		"Enter" => {
			ev.prevent_default();
			submit(explorer.with_value(|ex| ex.confirm()));
		}
		"Escape" => with_list(&|list| list.dismiss()),
		_ => {}
	};

	let on_submit = move |ev: SubmitEvent| {
		ev.prevent_default();
		submit(explorer.with_value(|ex| ex.confirm()));
	};

	let on_focus = move |_| with_list(&|list| list.reopen());

	let dismiss = window_event_listener(ev::click, move |ev: MouseEvent| {
		let Some(root) = container.get_untracked() else {
			return;
		};
		let target = ev.target().and_then(|t| t.dyn_into::<Node>().ok());
		if !root.contains(target.as_ref()) {
			explorer.try_with_value(|ex| ex.update(|s| s.suggestions.dismiss()));
			refresh(revision);
		}
	});
	on_cleanup(move || {
		dismiss.remove();
		if let Some(handle) = timer.try_get_value().flatten() {
			handle.clear();
		}
	});

	let snapshot = Memo::new(move |_| {
		revision.track();
		explorer
			.try_with_value(|ex| ex.read(|s| s.suggestions.snapshot()))
			.unwrap_or_default()
	});
	let query = move || {
		revision.track();
		explorer.with_value(|ex| ex.read(|s| s.query().to_owned()))
	};
	let searching = move || {
		revision.track();
		explorer.with_value(|ex| ex.read(|s| s.is_searching()))
	};

	let entries = move || {
		let SuggestionSnapshot { items, active } = snapshot.get();
		(!items.is_empty()).then(|| {
			view! {
				<ul id=LIST_ID role="listbox" class="suggestions">
					{items
						.into_iter()
						.enumerate()
						.map(|(i, text)| {
							let is_active = active == Some(i);
							view! {
								<li
									id=option_id(i)
									role="option"
									aria-selected=is_active.to_string()
									class:active=is_active
									on:mouseenter=move |_| with_list(&|list| list.hover(i))
									on:mousemove=move |_| {
										let moved = explorer.with_value(|ex| {
											ex.update(|s| {
												let before = s.suggestions.state();
												s.suggestions.pointer_moved(i);
												s.suggestions.state() != before
											})
										});
										if moved {
											refresh(revision);
										}
									}
									on:mouseleave=move |_| with_list(&|list| list.unhover(i))
									// mousedown, so the pick lands before the input blurs
									on:mousedown=move |ev: MouseEvent| {
										ev.prevent_default();
										submit(explorer.with_value(|ex| ex.select(i)));
									}
								>
									{text}
								</li>
							}
						})
						.collect_view()}
				</ul>
			}
		})
	};

	view! {
		<div node_ref=container class="search-bar">
			<form on:submit=on_submit class="search-form">
				<input
					type="search"
					placeholder="Search across documents, e.g. 'neural network'"
					autocomplete="off"
					role="combobox"
					aria-autocomplete="list"
					aria-controls=LIST_ID
					aria-expanded=move || (!snapshot.get().items.is_empty()).to_string()
					aria-activedescendant=move || snapshot.get().active.map(option_id)
					prop:value=query
					on:input=on_input
					on:keydown=on_keydown
					on:focus=on_focus
				/>
				<button type="submit" disabled=searching>
					{move || if searching() { "Searching..." } else { "Search" }}
				</button>
			</form>
			{entries}
		</div>
	}
}
