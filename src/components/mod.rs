//! View components around the shared [`Explorer`].

mod graph_view;
mod results;
mod search_bar;
mod upload;

use leptos::prelude::*;
use leptos::task::spawn_local;

pub use graph_view::GraphView;
pub use results::{NoticeBanner, RelatedKeywords, ResultsList};
pub use search_bar::SearchBar;
pub use upload::UploadPanel;

use crate::api::HttpSearchApi;
use crate::engine::Explorer;

/// The engine as mounted in the browser.
pub type AppExplorer = Explorer<HttpSearchApi>;

/// Engine handle shared by every component of the page.
///
/// Components redraw when `revision` changes; any engine mutation that should
/// show up in the DOM is followed by [`refresh`].
pub type SharedExplorer = StoredValue<AppExplorer, LocalStorage>;

/// Marks engine state as changed. A no-op once the page is gone.
pub fn refresh(revision: RwSignal<u64>) {
	revision.try_update(|r| *r = r.wrapping_add(1));
}

/// Runs search and graph lookup for `query`.
pub fn run_query(explorer: SharedExplorer, revision: RwSignal<u64>, query: String) {
	let Some(ex) = explorer.try_get_value() else {
		return;
	};
	spawn_local(async move {
		// join polls in order: the lookups are issued before the loading
		// state is published
		futures::join!(ex.submit(&query), async { refresh(revision) });
		refresh(revision);
	});
}
