//! Notice banner, related keywords and the result list.

use leptos::prelude::*;

use crate::api::DocumentResult;
use crate::components::{SharedExplorer, refresh, run_query};
use crate::engine::ExplorerState;

/// Tags shown per result card.
const MAX_TAGS: usize = 10;

#[component]
pub fn NoticeBanner(explorer: SharedExplorer, revision: RwSignal<u64>) -> impl IntoView {
	let notice = move || {
		revision.track();
		explorer.with_value(|ex| ex.read(|s| s.notice().cloned()))
	};
	let close = move |_| {
		explorer.with_value(|ex| ex.update(ExplorerState::dismiss_notice));
		refresh(revision);
	};

	move || {
		notice().map(|notice| {
			let class = if notice.is_error() { "notice notice-error" } else { "notice" };
			view! {
				<div class=class role="status">
					<span>{notice.to_string()}</span>
					<button on:click=close aria-label="Dismiss">"×"</button>
				</div>
			}
		})
	}
}

#[component]
pub fn RelatedKeywords(explorer: SharedExplorer, revision: RwSignal<u64>) -> impl IntoView {
	let keywords = move || {
		revision.track();
		explorer.with_value(|ex| ex.read(|s| s.related_keywords().to_vec()))
	};

	move || {
		let keywords = keywords();
		(!keywords.is_empty()).then(|| {
			view! {
				<div class="related-keywords">
					<span class="label">"Related:"</span>
					{keywords
						.into_iter()
						.map(|kw| {
							let query = kw.keyword.clone();
							let score = kw.score.map(|s| format!(" ({s})")).unwrap_or_default();
							view! {
								<button
									class="chip"
									on:click=move |_| run_query(explorer, revision, query.clone())
								>
									{kw.keyword}
									{score}
								</button>
							}
						})
						.collect_view()}
				</div>
			}
		})
	}
}

#[component]
fn ResultCard(doc: DocumentResult, download: String) -> impl IntoView {
	let date = doc.uploaded_at.split('T').next().unwrap_or_default().to_owned();
	let tags = doc.tags.into_iter().take(MAX_TAGS).map(|t| view! { <span class="tag">{t}</span> }).collect_view();

	view! {
		<article class="result-card">
			<header>
				<span class="kind">"Document"</span>
				<h3>{doc.filename}</h3>
				<time>{date}</time>
			</header>
			<p class="snippet">{doc.snippet}</p>
			<div class="tags">{tags}</div>
			{(!download.is_empty())
				.then(|| view! { <a href=download target="_blank" rel="noreferrer">"Download"</a> })}
		</article>
	}
}

#[component]
pub fn ResultsList(explorer: SharedExplorer, revision: RwSignal<u64>) -> impl IntoView {
	let snapshot = move || {
		revision.track();
		explorer.with_value(|ex| {
			let docs = ex.read(|s| s.results().to_vec());
			let links: Vec<String> = docs.iter().map(|d| ex.config().link(&d.download_url)).collect();
			(docs, links, ex.read(|s| s.total_hits()))
		})
	};

	move || {
		let (docs, links, total) = snapshot();
		if docs.is_empty() {
			return view! { <p class="results-empty">"No results yet."</p> }.into_any();
		}
		let heading = match total {
			Some(total) => format!("{total} results"),
			None => format!("{} results", docs.len()),
		};
		view! {
			<section class="results">
				<h2>{heading}</h2>
				{docs
					.into_iter()
					.zip(links)
					.map(|(doc, download)| view! { <ResultCard doc=doc download=download /> })
					.collect_view()}
			</section>
		}
		.into_any()
	}
}
