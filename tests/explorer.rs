//! Engine flows against a scripted service whose replies the test releases in
//! any order.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::rc::Rc;

use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures::future::RemoteHandle;
use futures::task::LocalSpawnExt;
use rstest::rstest;

use doc_search_explorer::api::{
	ApiError, DocumentResult, EdgePayload, GraphPayload, MAX_UPLOAD_BYTES, NodePayload, SearchApi, SearchPayload,
	UploadFile,
};
use doc_search_explorer::config::ClientConfig;
use doc_search_explorer::engine::{Explorer, FetchOutcome, ListState, Notice};

type Reply<T> = oneshot::Sender<Result<T, ApiError>>;
type Pending<T> = VecDeque<(String, Reply<T>)>;

#[derive(Default)]
struct Calls {
	suggest: Pending<Vec<String>>,
	graph: Pending<GraphPayload>,
	search: Pending<SearchPayload>,
	upload: Pending<DocumentResult>,
}

/// Records every call and parks it until the test replies.
#[derive(Clone, Default)]
struct ScriptedApi {
	calls: Rc<RefCell<Calls>>,
}

async fn parked<T>(rx: oneshot::Receiver<Result<T, ApiError>>) -> Result<T, ApiError> {
	rx.await.unwrap_or_else(|_| Err(ApiError::Rejected("reply dropped".to_owned())))
}

impl SearchApi for ScriptedApi {
	async fn suggest(&self, text: &str, _limit: usize) -> Result<Vec<String>, ApiError> {
		let (tx, rx) = oneshot::channel();
		self.calls.borrow_mut().suggest.push_back((text.to_owned(), tx));
		parked(rx).await
	}

	async fn graph(&self, text: &str, _size: usize) -> Result<GraphPayload, ApiError> {
		let (tx, rx) = oneshot::channel();
		self.calls.borrow_mut().graph.push_back((text.to_owned(), tx));
		parked(rx).await
	}

	async fn search(&self, text: &str, _size: usize) -> Result<SearchPayload, ApiError> {
		let (tx, rx) = oneshot::channel();
		self.calls.borrow_mut().search.push_back((text.to_owned(), tx));
		parked(rx).await
	}

	async fn upload(&self, file: UploadFile) -> Result<DocumentResult, ApiError> {
		let (tx, rx) = oneshot::channel();
		self.calls.borrow_mut().upload.push_back((file.name, tx));
		parked(rx).await
	}
}

fn take<T>(pending: &mut Pending<T>, text: &str) -> Reply<T> {
	let at = pending
		.iter()
		.position(|(t, _)| t == text)
		.unwrap_or_else(|| panic!("no pending call for {text:?}"));
	pending.remove(at).expect("pending call").1
}

struct Harness {
	pool: LocalPool,
	api: ScriptedApi,
	explorer: Explorer<ScriptedApi>,
}

impl Harness {
	fn new() -> Self {
		let api = ScriptedApi::default();
		let explorer = Explorer::new(api.clone(), ClientConfig::default());
		Self {
			pool: LocalPool::new(),
			api,
			explorer,
		}
	}

	/// Starts `flow` and runs it up to its first network wait.
	fn start<T: 'static, F: Future<Output = T> + 'static>(
		&mut self,
		flow: impl FnOnce(Explorer<ScriptedApi>) -> F,
	) -> RemoteHandle<T> {
		let handle = self
			.pool
			.spawner()
			.spawn_local_with_handle(flow(self.explorer.clone()))
			.expect("spawn");
		self.pool.run_until_stalled();
		handle
	}

	fn finish<T: 'static>(&mut self, handle: RemoteHandle<T>) -> T {
		self.pool.run_until(handle)
	}

	fn reply_suggest(&mut self, text: &str, result: Result<&[&str], ApiError>) {
		let tx = take(&mut self.api.calls.borrow_mut().suggest, text);
		let _ = tx.send(result.map(|items| items.iter().map(|s| s.to_string()).collect()));
		self.pool.run_until_stalled();
	}

	fn reply_graph(&mut self, text: &str, result: Result<GraphPayload, ApiError>) {
		let tx = take(&mut self.api.calls.borrow_mut().graph, text);
		let _ = tx.send(result);
		self.pool.run_until_stalled();
	}

	fn reply_search(&mut self, text: &str, result: Result<SearchPayload, ApiError>) {
		let tx = take(&mut self.api.calls.borrow_mut().search, text);
		let _ = tx.send(result);
		self.pool.run_until_stalled();
	}

	fn reply_upload(&mut self, name: &str, result: Result<DocumentResult, ApiError>) {
		let tx = take(&mut self.api.calls.borrow_mut().upload, name);
		let _ = tx.send(result);
		self.pool.run_until_stalled();
	}

	fn suggestions(&self) -> Vec<String> {
		self.explorer.read(|s| s.suggestions.snapshot().items)
	}

	fn pending_suggest(&self) -> Vec<String> {
		self.api.calls.borrow().suggest.iter().map(|(t, _)| t.clone()).collect()
	}
}

fn graph(ids: &[&str], edges: &[(&str, &str)]) -> GraphPayload {
	GraphPayload {
		nodes: ids
			.iter()
			.map(|id| NodePayload {
				id: id.to_string(),
				label: id.to_string(),
				..NodePayload::default()
			})
			.collect(),
		edges: edges
			.iter()
			.map(|(s, t)| EdgePayload {
				source: s.to_string(),
				target: t.to_string(),
				weight: Some(1.0),
			})
			.collect(),
	}
}

fn doc(filename: &str) -> DocumentResult {
	DocumentResult {
		id: filename.to_owned(),
		filename: filename.to_owned(),
		..DocumentResult::default()
	}
}

fn server_error(message: &str) -> ApiError {
	ApiError::Status {
		status: 500,
		message: message.to_owned(),
	}
}

#[rstest]
#[case::older_first(true)]
#[case::older_last(false)]
fn newest_suggestions_win(#[case] older_first: bool) {
	let mut h = Harness::new();
	let older = h.start(|ex| async move { ex.fetch_suggestions("ne").await });
	let newer = h.start(|ex| async move { ex.fetch_suggestions("neural").await });
	assert_eq!(h.pending_suggest(), vec!["ne", "neural"]);

	if older_first {
		h.reply_suggest("ne", Ok(&["network", "new"]));
		h.reply_suggest("neural", Ok(&["neural network"]));
	} else {
		h.reply_suggest("neural", Ok(&["neural network"]));
		h.reply_suggest("ne", Ok(&["network", "new"]));
	}

	assert_eq!(h.finish(older), FetchOutcome::Stale);
	assert_eq!(h.finish(newer), FetchOutcome::Applied);
	assert_eq!(h.suggestions(), vec!["neural network"]);
	assert!(!h.explorer.read(|s| s.is_suggesting()));
}

#[rstest]
#[case::older_first(true)]
#[case::older_last(false)]
fn newest_graph_wins(#[case] older_first: bool) {
	let mut h = Harness::new();
	let older = h.start(|ex| async move { ex.fetch_graph("a").await });
	let newer = h.start(|ex| async move { ex.fetch_graph("b").await });
	assert!(h.explorer.read(|s| s.is_graph_loading()));

	let replies = [("a", graph(&["A1", "A2"], &[("A1", "A2")])), ("b", graph(&["B1"], &[]))];
	let order: Vec<_> = if older_first {
		replies.into_iter().collect()
	} else {
		replies.into_iter().rev().collect()
	};
	for (query, payload) in order {
		h.reply_graph(query, Ok(payload));
	}

	assert_eq!(h.finish(older), FetchOutcome::Stale);
	assert_eq!(h.finish(newer), FetchOutcome::Applied);
	h.explorer.read(|s| {
		assert_eq!(s.graph.query(), Some("b"));
		assert!(s.graph.graph().contains("B1"));
		assert!(!s.graph.graph().contains("A1"));
		assert!(!s.is_graph_loading());
	});
}

#[test]
fn blank_input_sends_nothing_and_closes_the_list() {
	let mut h = Harness::new();
	let shown = h.start(|ex| async move { ex.fetch_suggestions("ml").await });
	h.reply_suggest("ml", Ok(&["ml ops"]));
	assert_eq!(h.finish(shown), FetchOutcome::Applied);
	assert!(h.explorer.read(|s| s.suggestions.is_open()));

	assert_eq!(h.explorer.on_input("   "), None);
	assert_eq!(h.explorer.read(|s| s.suggestions.state()), ListState::Closed);

	let blank = h.start(|ex| async move { ex.fetch_suggestions(" ").await });
	assert_eq!(h.finish(blank), FetchOutcome::Skipped);
	assert!(h.pending_suggest().is_empty());
}

#[test]
fn only_the_newest_ticket_fetches() {
	let mut h = Harness::new();
	let first = h.explorer.on_input("ne").expect("ticket");
	let second = h.explorer.on_input("neu").expect("ticket");

	let early = h.start(move |ex| async move { ex.settle(first).await });
	assert_eq!(h.finish(early), FetchOutcome::Skipped);
	assert!(h.pending_suggest().is_empty());

	let due = h.start(move |ex| async move { ex.settle(second).await });
	assert_eq!(h.pending_suggest(), vec!["neu"]);
	h.reply_suggest("neu", Ok(&["neural"]));
	assert_eq!(h.finish(due), FetchOutcome::Applied);

	let again = h.start(move |ex| async move { ex.settle(second).await });
	assert_eq!(h.finish(again), FetchOutcome::Skipped);
}

#[test]
fn failed_suggestions_keep_the_previous_list() {
	let mut h = Harness::new();
	let ok = h.start(|ex| async move { ex.fetch_suggestions("ml").await });
	h.reply_suggest("ml", Ok(&["ml ops", "ml basics"]));
	h.finish(ok);

	let failing = h.start(|ex| async move { ex.fetch_suggestions("mlo").await });
	h.reply_suggest("mlo", Err(server_error("boom")));
	assert_eq!(h.finish(failing), FetchOutcome::Failed);
	assert_eq!(h.suggestions(), vec!["ml ops", "ml basics"]);
	assert!(!h.explorer.read(|s| s.is_suggesting()));
	assert_eq!(h.explorer.read(|s| s.notice().cloned()), None);
}

#[test]
fn confirm_takes_the_active_suggestion() {
	let mut h = Harness::new();
	h.explorer.on_input("ne");
	let shown = h.start(|ex| async move { ex.fetch_suggestions("ne").await });
	h.reply_suggest("ne", Ok(&["neural", "network"]));
	h.finish(shown);

	h.explorer.update(|s| {
		s.suggestions.move_down();
		s.suggestions.move_down();
	});
	assert_eq!(h.explorer.confirm().as_deref(), Some("network"));
	h.explorer.read(|s| {
		assert_eq!(s.query(), "network");
		assert!(!s.suggestions.is_open());
	});
}

#[test]
fn submit_stops_a_late_suggestion_from_reopening_the_list() {
	let mut h = Harness::new();
	h.explorer.on_input("neu");
	let late = h.start(|ex| async move { ex.fetch_suggestions("neu").await });

	let submitted = h.start(|ex| async move { ex.submit("neural").await });
	h.reply_suggest("neu", Ok(&["neural", "neutral"]));
	assert_eq!(h.finish(late), FetchOutcome::Stale);
	assert!(!h.explorer.read(|s| s.suggestions.is_open()));

	h.reply_search(
		"neural",
		Ok(SearchPayload {
			results: vec![doc("nn.pdf")],
			total: Some(1),
			..SearchPayload::default()
		}),
	);
	h.reply_graph("neural", Ok(graph(&["nn.pdf"], &[])));
	assert_eq!(h.finish(submitted), (FetchOutcome::Applied, FetchOutcome::Applied));
	h.explorer.read(|s| {
		assert_eq!(s.query(), "neural");
		assert_eq!(s.results().len(), 1);
		assert_eq!(s.total_hits(), Some(1));
	});
}

#[test]
fn search_failure_surfaces_the_server_message() {
	let mut h = Harness::new();
	let submitted = h.start(|ex| async move { ex.submit("ml").await });
	assert!(h.explorer.read(|s| s.is_searching()));

	h.reply_search("ml", Err(server_error("index offline")));
	h.reply_graph("ml", Ok(graph(&["A"], &[])));
	assert_eq!(h.finish(submitted), (FetchOutcome::Failed, FetchOutcome::Applied));

	let notice = h.explorer.read(|s| s.notice().cloned()).expect("notice");
	assert_eq!(notice, Notice::SearchFailed("index offline".to_owned()));
	assert_eq!(notice.to_string(), "Search failed: index offline");
	assert!(notice.is_error());
	assert!(!h.explorer.read(|s| s.is_searching()));
}

#[test]
fn upload_prepends_the_document() {
	let mut h = Harness::new();
	let searched = h.start(|ex| async move { ex.search("ml").await });
	h.reply_search(
		"ml",
		Ok(SearchPayload {
			results: vec![doc("old.pdf")],
			..SearchPayload::default()
		}),
	);
	h.finish(searched);

	let file = UploadFile {
		name: "new.pdf".to_owned(),
		mime: Some("application/pdf".to_owned()),
		bytes: b"%PDF-1.7".to_vec(),
	};
	let uploaded = h.start(move |ex| async move { ex.upload(file).await });
	assert!(h.explorer.read(|s| s.is_uploading()));
	h.reply_upload("new.pdf", Ok(doc("new.pdf")));
	assert_eq!(h.finish(uploaded), FetchOutcome::Applied);

	h.explorer.read(|s| {
		let names: Vec<&str> = s.results().iter().map(|d| d.filename.as_str()).collect();
		assert_eq!(names, vec!["new.pdf", "old.pdf"]);
		assert_eq!(s.notice(), Some(&Notice::Uploaded("new.pdf".to_owned())));
	});
	h.explorer.update(|s| s.dismiss_notice());
	assert_eq!(h.explorer.read(|s| s.notice().cloned()), None);
}

#[test]
fn failed_graph_keeps_the_previous_graph() {
	let mut h = Harness::new();
	let first = h.start(|ex| async move { ex.fetch_graph("a").await });
	h.reply_graph("a", Ok(graph(&["A", "B"], &[("A", "B")])));
	assert_eq!(h.finish(first), FetchOutcome::Applied);
	let revision = h.explorer.read(|s| s.graph.revision());

	let failing = h.start(|ex| async move { ex.fetch_graph("b").await });
	assert!(h.explorer.read(|s| s.is_graph_loading()));
	h.reply_graph("b", Err(server_error("boom")));
	assert_eq!(h.finish(failing), FetchOutcome::Failed);

	h.explorer.read(|s| {
		assert!(s.graph.graph().contains("A"));
		assert_eq!(s.graph.query(), Some("a"));
		assert_eq!(s.graph.revision(), revision);
		assert!(!s.is_graph_loading());
		assert_eq!(s.notice(), None);
	});
}

#[test]
fn rejected_upload_surfaces_the_server_message() {
	let mut h = Harness::new();
	let file = UploadFile {
		name: "scan.tiff".to_owned(),
		mime: Some("image/tiff".to_owned()),
		bytes: vec![1, 2, 3],
	};
	let uploaded = h.start(move |ex| async move { ex.upload(file).await });
	h.reply_upload("scan.tiff", Err(server_error("Unsupported file type")));
	assert_eq!(h.finish(uploaded), FetchOutcome::Failed);

	h.explorer.read(|s| {
		assert_eq!(
			s.notice(),
			Some(&Notice::UploadFailed("Unsupported file type".to_owned()))
		);
		assert!(s.notice().is_some_and(Notice::is_error));
		assert!(s.results().is_empty());
		assert!(!s.is_uploading());
	});
}

#[test]
fn oversized_upload_is_refused_locally() {
	let mut h = Harness::new();
	let file = UploadFile {
		name: "huge.bin".to_owned(),
		mime: None,
		bytes: vec![0; MAX_UPLOAD_BYTES + 1],
	};
	let refused = h.start(move |ex| async move { ex.upload(file).await });
	assert_eq!(h.finish(refused), FetchOutcome::Failed);
	assert!(h.api.calls.borrow().upload.is_empty());
	assert_eq!(
		h.explorer.read(|s| s.notice().map(ToString::to_string)),
		Some("Upload failed: File too large".to_owned())
	);
}

#[test]
fn teardown_discards_late_responses() {
	let mut h = Harness::new();
	h.explorer.on_input("ml");
	let suggest = h.start(|ex| async move { ex.fetch_suggestions("ml").await });
	let graph_fetch = h.start(|ex| async move { ex.fetch_graph("ml").await });

	h.explorer.teardown();
	h.reply_suggest("ml", Ok(&["ml ops"]));
	h.reply_graph("ml", Ok(graph(&["A"], &[])));

	assert_eq!(h.finish(suggest), FetchOutcome::Stale);
	assert_eq!(h.finish(graph_fetch), FetchOutcome::Stale);
	assert!(h.suggestions().is_empty());
	assert!(h.explorer.read(|s| s.graph.graph().is_empty()));

	assert_eq!(h.explorer.on_input("more"), None);
	let after = h.start(|ex| async move { ex.fetch_graph("x").await });
	assert_eq!(h.finish(after), FetchOutcome::Skipped);
}

#[test]
fn new_graph_clears_isolation() {
	let mut h = Harness::new();
	let first = h.start(|ex| async move { ex.fetch_graph("").await });
	h.reply_graph("", Ok(graph(&["A", "B", "C"], &[("A", "B")])));
	h.finish(first);

	assert!(h.explorer.isolate("A"));
	assert!(h.explorer.read(|s| s.graph.focus.is_node_dimmed("C")));
	assert!(!h.explorer.isolate("missing"));
	assert!(h.explorer.read(|s| s.graph.focus.isolated().is_some()));

	let second = h.start(|ex| async move { ex.fetch_graph("ml").await });
	h.reply_graph("ml", Ok(graph(&["A", "B"], &[("A", "B")])));
	h.finish(second);
	h.explorer.read(|s| {
		assert!(s.graph.focus.isolated().is_none());
		assert!(!s.graph.focus.is_node_dimmed("B"));
	});
}
