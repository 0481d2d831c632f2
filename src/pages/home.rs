use leptos::prelude::*;
use leptos::task::spawn_local;
use log::info;

use crate::api::HttpSearchApi;
use crate::components::{
	GraphView, NoticeBanner, RelatedKeywords, ResultsList, SearchBar, SharedExplorer, UploadPanel, refresh,
};
use crate::config::ClientConfig;
use crate::engine::Explorer;

/// Search page: query box and results on the left, upload and graph on the
/// right. Owns the engine for as long as it is mounted.
#[component]
pub fn Home() -> impl IntoView {
	let config = ClientConfig::from_env();
	info!("search service at {}", config.api_base);
	let explorer: SharedExplorer = StoredValue::new_local(Explorer::new(HttpSearchApi::new(config.clone()), config));
	let revision = RwSignal::new(0u64);

	// overview graph until the first query
	let overview = explorer.get_value();
	spawn_local(async move {
		overview.fetch_graph("").await;
		refresh(revision);
	});

	on_cleanup(move || {
		explorer.try_with_value(|ex| ex.teardown());
	});

	view! {
		<main class="explorer">
			<section class="search-panel">
				<h1>"Search Documents"</h1>
				<SearchBar explorer=explorer revision=revision />
				<NoticeBanner explorer=explorer revision=revision />
				<RelatedKeywords explorer=explorer revision=revision />
				<ResultsList explorer=explorer revision=revision />
			</section>
			<aside class="graph-panel">
				<UploadPanel explorer=explorer revision=revision />
				<GraphView explorer=explorer revision=revision />
			</aside>
		</main>
	}
}
