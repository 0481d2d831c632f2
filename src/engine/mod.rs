//! Query and graph exploration engine.
//!
//! [`Explorer`] owns every piece of mutable view state for one mounted page:
//! the debounced query, the suggestion list, the graph store with its focus,
//! the viewport, the search results and one [`FetchGate`] per lookup class.
//! All work happens on a single thread; futures suspend only on network calls
//! and never hold a state borrow across an `.await`.

pub mod debounce;
pub mod fetch;
pub mod focus;
pub mod graph;
pub mod layout;
pub mod suggest;
pub mod viewport;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::{debug, error, info, warn};

pub use debounce::{Debouncer, QUIET_PERIOD, Ticket};
pub use fetch::{FetchGate, Generation, Resolution, SuggestionRequest};
pub use focus::{FocusState, Partition};
pub use graph::{Graph, GraphEdge, GraphNode, GraphStore, IngestReport, NodeId, NodeKind};
pub use layout::{LayoutStrategy, Positions};
pub use suggest::{ListState, SuggestionList, SuggestionSnapshot};
pub use viewport::{Point, Rect, ViewTransform, Viewport};

use crate::api::{DocumentResult, MAX_UPLOAD_BYTES, RelatedKeyword, SearchApi, UploadFile};
use crate::config::ClientConfig;

/// What became of one lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
	/// The response was applied to visible state.
	Applied,
	/// The current lookup failed; visible state kept.
	Failed,
	/// A newer lookup superseded this one; the response was dropped.
	Stale,
	/// Nothing was sent.
	Skipped,
}

/// The single user-visible notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
	/// A document was stored; carries its file name.
	Uploaded(String),
	/// The primary search failed.
	SearchFailed(String),
	/// An upload failed.
	UploadFailed(String),
}

impl Notice {
	/// Whether the notice reports a failure.
	pub fn is_error(&self) -> bool {
		!matches!(self, Self::Uploaded(_))
	}
}

impl fmt::Display for Notice {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Uploaded(name) => write!(f, "Uploaded: {name}"),
			Self::SearchFailed(msg) => write!(f, "Search failed: {msg}"),
			Self::UploadFailed(msg) => write!(f, "Upload failed: {msg}"),
		}
	}
}

/// Mutable view state behind an [`Explorer`].
#[derive(Debug, Default)]
pub struct ExplorerState {
	query: String,
	debounce: Debouncer,
	suggest_gate: FetchGate,
	graph_gate: FetchGate,
	search_gate: FetchGate,
	upload_gate: FetchGate,
	/// Suggestion dropdown.
	pub suggestions: SuggestionList,
	/// Graph of the last successful graph lookup, with its focus.
	pub graph: GraphStore,
	/// Visible window onto the graph.
	pub viewport: Viewport,
	results: Vec<DocumentResult>,
	related: Vec<RelatedKeyword>,
	total: Option<u64>,
	notice: Option<Notice>,
	torn_down: bool,
}

impl ExplorerState {
	/// Text in the search box.
	pub fn query(&self) -> &str {
		&self.query
	}

	/// Documents of the last successful search, uploads prepended.
	pub fn results(&self) -> &[DocumentResult] {
		&self.results
	}

	/// Related keywords of the last successful search.
	pub fn related_keywords(&self) -> &[RelatedKeyword] {
		&self.related
	}

	/// Total hits reported by the last successful search.
	pub fn total_hits(&self) -> Option<u64> {
		self.total
	}

	/// Pending notification, if any.
	pub fn notice(&self) -> Option<&Notice> {
		self.notice.as_ref()
	}

	/// Clears the notification.
	pub fn dismiss_notice(&mut self) {
		self.notice = None;
	}

	/// Whether a suggestion lookup is outstanding.
	pub fn is_suggesting(&self) -> bool {
		self.suggest_gate.is_loading()
	}

	/// Whether a graph lookup is outstanding.
	pub fn is_graph_loading(&self) -> bool {
		self.graph_gate.is_loading()
	}

	/// Whether a primary search is outstanding.
	pub fn is_searching(&self) -> bool {
		self.search_gate.is_loading()
	}

	/// Whether an upload is outstanding.
	pub fn is_uploading(&self) -> bool {
		self.upload_gate.is_loading()
	}

	/// Fixes the query to `text` and stops every suggestion activity, so a
	/// late suggestion response cannot reopen the list after a submit.
	fn commit_query(&mut self, text: &str) {
		self.query = text.to_owned();
		self.debounce.cancel();
		self.suggest_gate.invalidate();
		self.suggestions.clear();
	}
}

/// The exploration engine of one mounted view.
///
/// Cheap to clone; clones share state.
pub struct Explorer<A> {
	api: Rc<A>,
	config: ClientConfig,
	state: Rc<RefCell<ExplorerState>>,
}

impl<A> Clone for Explorer<A> {
	fn clone(&self) -> Self {
		Self {
			api: Rc::clone(&self.api),
			config: self.config.clone(),
			state: Rc::clone(&self.state),
		}
	}
}

impl<A: SearchApi> Explorer<A> {
	/// Engine talking to `api`.
	pub fn new(api: A, config: ClientConfig) -> Self {
		Self {
			api: Rc::new(api),
			config,
			state: Rc::new(RefCell::new(ExplorerState::default())),
		}
	}

	/// Configuration in use.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Reads the state.
	pub fn read<R>(&self, f: impl FnOnce(&ExplorerState) -> R) -> R {
		f(&self.state.borrow())
	}

	/// Mutates the state.
	pub fn update<R>(&self, f: impl FnOnce(&mut ExplorerState) -> R) -> R {
		f(&mut self.state.borrow_mut())
	}

	/// Records a keystroke.
	///
	/// Returns the ticket the host must hand to [`Explorer::settle`] after
	/// [`QUIET_PERIOD`]. Blank text cancels pending work, closes the list and
	/// returns `None`.
	pub fn on_input(&self, text: &str) -> Option<Ticket> {
		let mut state = self.state.borrow_mut();
		if state.torn_down {
			return None;
		}
		state.query = text.to_owned();
		let ticket = state.debounce.on_input(text);
		if ticket.is_none() {
			state.suggest_gate.invalidate();
			state.suggestions.clear();
		}
		ticket
	}

	/// Fires a debounce timer; fetches suggestions if `ticket` is still the
	/// newest one.
	pub async fn settle(&self, ticket: Ticket) -> FetchOutcome {
		let text = self.state.borrow_mut().debounce.fire(ticket);
		match text {
			Some(text) => self.fetch_suggestions(text).await,
			None => FetchOutcome::Skipped,
		}
	}

	/// Looks up suggestions for `text`, superseding any outstanding lookup.
	pub async fn fetch_suggestions(&self, text: impl Into<String>) -> FetchOutcome {
		let text = text.into();
		let request = {
			let mut state = self.state.borrow_mut();
			if state.torn_down || text.trim().is_empty() {
				return FetchOutcome::Skipped;
			}
			state.suggest_gate.issue_request(text)
		};

		let outcome = self.api.suggest(&request.text, self.config.suggest_limit).await;

		let mut state = self.state.borrow_mut();
		match state.suggest_gate.resolve(request.generation, outcome) {
			Resolution::Apply(items) => {
				state.suggestions.replace(items);
				FetchOutcome::Applied
			}
			Resolution::Failed(err) if err.is_timeout() => {
				warn!("suggestions for {:?} timed out", request.text);
				FetchOutcome::Failed
			}
			Resolution::Failed(err) => {
				warn!("suggestions for {:?} failed: {err}", request.text);
				FetchOutcome::Failed
			}
			Resolution::Stale => {
				debug!("dropping stale suggestions {} for {:?}", request.generation, request.text);
				FetchOutcome::Stale
			}
		}
	}

	/// Keyboard confirm: the active suggestion, else the typed text.
	pub fn confirm(&self) -> Option<String> {
		let mut guard = self.state.borrow_mut();
		let state = &mut *guard;
		let chosen = state.suggestions.confirm(&state.query)?;
		state.commit_query(&chosen);
		Some(chosen)
	}

	/// Pointer pick of suggestion `index`.
	pub fn select(&self, index: usize) -> Option<String> {
		let mut state = self.state.borrow_mut();
		let chosen = state.suggestions.select(index)?;
		state.commit_query(&chosen);
		Some(chosen)
	}

	/// Runs the primary search and the graph lookup for `query` together.
	pub async fn submit(&self, query: &str) -> (FetchOutcome, FetchOutcome) {
		let query = query.trim();
		if query.is_empty() {
			return (FetchOutcome::Skipped, FetchOutcome::Skipped);
		}
		self.state.borrow_mut().commit_query(query);
		futures::join!(self.search(query), self.fetch_graph(query))
	}

	/// Primary search. Failures surface as a [`Notice`].
	pub async fn search(&self, query: &str) -> FetchOutcome {
		let query = query.trim();
		let generation = {
			let mut state = self.state.borrow_mut();
			if state.torn_down || query.is_empty() {
				return FetchOutcome::Skipped;
			}
			state.search_gate.issue()
		};

		let outcome = self.api.search(query, self.config.search_size).await;

		let mut state = self.state.borrow_mut();
		match state.search_gate.resolve(generation, outcome) {
			Resolution::Apply(payload) => {
				info!("search {query:?}: {} results", payload.results.len());
				state.results = payload.results;
				state.related = payload.related_keywords;
				state.total = payload.total;
				FetchOutcome::Applied
			}
			Resolution::Failed(err) => {
				error!("search {query:?} failed: {err}");
				state.notice = Some(Notice::SearchFailed(err.user_message()));
				FetchOutcome::Failed
			}
			Resolution::Stale => {
				debug!("dropping stale search {generation} for {query:?}");
				FetchOutcome::Stale
			}
		}
	}

	/// Fetches the graph for `query` and replaces the store on success.
	///
	/// An empty query asks the service for its overview graph.
	pub async fn fetch_graph(&self, query: &str) -> FetchOutcome {
		let query = query.trim();
		let generation = {
			let mut state = self.state.borrow_mut();
			if state.torn_down {
				return FetchOutcome::Skipped;
			}
			state.graph_gate.issue()
		};

		let outcome = self.api.graph(query, self.config.graph_size).await;

		let mut state = self.state.borrow_mut();
		match state.graph_gate.resolve(generation, outcome) {
			Resolution::Apply(payload) => {
				let (graph, report) = Graph::ingest(payload);
				if !report.is_clean() {
					debug!("graph for {query:?} ingested with drops: {report:?}");
				}
				state.graph.replace(query, graph);
				FetchOutcome::Applied
			}
			Resolution::Failed(err) if err.is_timeout() => {
				warn!("graph for {query:?} timed out after {:?}", self.config.request_timeout);
				FetchOutcome::Failed
			}
			Resolution::Failed(err) => {
				warn!("graph for {query:?} failed: {err}");
				FetchOutcome::Failed
			}
			Resolution::Stale => {
				debug!("dropping stale graph {generation} for {query:?}");
				FetchOutcome::Stale
			}
		}
	}

	/// Uploads a document and prepends it to the results.
	pub async fn upload(&self, file: UploadFile) -> FetchOutcome {
		let generation = {
			let mut state = self.state.borrow_mut();
			if state.torn_down {
				return FetchOutcome::Skipped;
			}
			if file.bytes.len() > MAX_UPLOAD_BYTES {
				warn!("refusing {:?}: {} bytes", file.name, file.bytes.len());
				state.notice = Some(Notice::UploadFailed("File too large".to_owned()));
				return FetchOutcome::Failed;
			}
			state.upload_gate.issue()
		};

		let name = file.name.clone();
		let outcome = self.api.upload(file).await;

		let mut state = self.state.borrow_mut();
		match state.upload_gate.resolve(generation, outcome) {
			Resolution::Apply(doc) => {
				let shown = if doc.filename.is_empty() { name } else { doc.filename.clone() };
				info!("uploaded {shown:?}");
				state.notice = Some(Notice::Uploaded(shown));
				state.results.insert(0, doc);
				FetchOutcome::Applied
			}
			Resolution::Failed(err) => {
				error!("upload of {name:?} failed: {err}");
				state.notice = Some(Notice::UploadFailed(err.user_message()));
				FetchOutcome::Failed
			}
			Resolution::Stale => {
				debug!("dropping stale upload {generation} for {name:?}");
				FetchOutcome::Stale
			}
		}
	}

	/// Isolates the closed neighborhood of `id`.
	pub fn isolate(&self, id: &str) -> bool {
		self.state.borrow_mut().graph.isolate(id)
	}

	/// Clears any isolation.
	pub fn reset_focus(&self) {
		self.state.borrow_mut().graph.reset_focus();
	}

	/// Frames and flashes the nodes whose label contains `text`.
	pub fn find_by_label(&self, text: &str, positions: &Positions) -> Option<Vec<NodeId>> {
		let mut guard = self.state.borrow_mut();
		let state = &mut *guard;
		state.viewport.find_by_label(state.graph.graph(), positions, text)
	}

	/// Detaches the engine from its view: pending triggers are cancelled and
	/// every outstanding lookup becomes stale.
	pub fn teardown(&self) {
		let mut state = self.state.borrow_mut();
		state.torn_down = true;
		state.debounce.cancel();
		state.suggest_gate.invalidate();
		state.graph_gate.invalidate();
		state.search_gate.invalidate();
		state.upload_gate.invalidate();
		debug!("explorer torn down");
	}
}
