//! Client configuration.

use std::time::Duration;

/// Variable naming the API base URL, read at runtime and at compile time.
pub const API_BASE_VAR: &str = "DOC_SEARCH_API_BASE";

const DEFAULT_API_BASE: &str = "http://localhost:5001";

/// Endpoint location and request sizing for the search service.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
	/// Base URL without a trailing slash.
	pub api_base: String,
	/// `limit` sent with suggestion lookups.
	pub suggest_limit: usize,
	/// `size` sent with graph lookups.
	pub graph_size: usize,
	/// `size` sent with the primary search.
	pub search_size: usize,
	/// Timeout applied to every lookup.
	pub request_timeout: Duration,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			api_base: DEFAULT_API_BASE.to_owned(),
			suggest_limit: 8,
			graph_size: 40,
			search_size: 20,
			request_timeout: Duration::from_secs(3),
		}
	}
}

impl ClientConfig {
	/// Defaults with the base URL taken from [`API_BASE_VAR`].
	///
	/// Browser bundles have no process environment, so the value captured at
	/// build time is the usual source there.
	pub fn from_env() -> Self {
		let runtime = std::env::var(API_BASE_VAR).ok();
		Self::default().with_api_base(resolve_base(runtime.as_deref(), option_env!("DOC_SEARCH_API_BASE")))
	}

	/// Replaces the base URL, trimming trailing slashes.
	pub fn with_api_base(mut self, base: impl AsRef<str>) -> Self {
		self.api_base = base.as_ref().trim().trim_end_matches('/').to_owned();
		self
	}

	/// Absolute URL for an API path such as `/api/search`.
	pub fn endpoint(&self, path: &str) -> String {
		format!("{}/{}", self.api_base, path.trim_start_matches('/'))
	}

	/// Makes a service-relative link such as a download URL absolute; absolute
	/// links pass through.
	pub fn link(&self, url: &str) -> String {
		if url.starts_with('/') {
			self.endpoint(url)
		} else {
			url.to_owned()
		}
	}
}

fn resolve_base<'a>(runtime: Option<&'a str>, compiled: Option<&'a str>) -> &'a str {
	[runtime, compiled]
		.into_iter()
		.flatten()
		.find(|v| !v.trim().is_empty())
		.unwrap_or(DEFAULT_API_BASE)
}
