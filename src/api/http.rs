use log::warn;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use super::{ApiError, DocumentResult, GraphPayload, SearchApi, SearchPayload, SuggestPayload, UploadFile};
use crate::config::ClientConfig;

/// [`SearchApi`] over HTTP. Uses the browser's `fetch` on wasm.
#[derive(Clone, Debug)]
pub struct HttpSearchApi {
	client: Client,
	config: ClientConfig,
}

impl HttpSearchApi {
	/// Client for the service described by `config`.
	pub fn new(config: ClientConfig) -> Self {
		Self {
			client: Client::new(),
			config,
		}
	}

	async fn get<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ApiError>
	where
		T: DeserializeOwned + Default,
	{
		let request = self
			.client
			.get(self.config.endpoint(path))
			.query(query)
			.timeout(self.config.request_timeout);
		send(request, path).await
	}
}

impl SearchApi for HttpSearchApi {
	async fn suggest(&self, text: &str, limit: usize) -> Result<Vec<String>, ApiError> {
		let payload: SuggestPayload = self
			.get("/api/search/suggest", &[("q", text.to_owned()), ("limit", limit.to_string())])
			.await?;
		Ok(payload.suggestions)
	}

	async fn graph(&self, text: &str, size: usize) -> Result<GraphPayload, ApiError> {
		self.get("/api/search/graph", &[("q", text.to_owned()), ("size", size.to_string())])
			.await
	}

	async fn search(&self, text: &str, size: usize) -> Result<SearchPayload, ApiError> {
		self.get("/api/search", &[("q", text.to_owned()), ("size", size.to_string())])
			.await
	}

	async fn upload(&self, file: UploadFile) -> Result<DocumentResult, ApiError> {
		let mut part = Part::bytes(file.bytes).file_name(file.name);
		if let Some(mime) = file.mime.filter(|m| !m.is_empty()) {
			part = part.mime_str(&mime)?;
		}
		// No timeout: large documents legitimately take longer than a lookup.
		let request = self
			.client
			.post(self.config.endpoint("/api/files/upload"))
			.multipart(Form::new().part("file", part));
		send(request, "/api/files/upload").await
	}
}

async fn send<T>(request: RequestBuilder, path: &str) -> Result<T, ApiError>
where
	T: DeserializeOwned + Default,
{
	let response = request.send().await?;
	let status = response.status();
	let body = response.bytes().await?;
	if !status.is_success() {
		return Err(ApiError::from_status(status.as_u16(), &body));
	}
	Ok(decode_lenient(path, &body))
}

/// Decodes `body`, treating anything malformed as the empty result.
pub fn decode_lenient<T>(path: &str, body: &[u8]) -> T
where
	T: DeserializeOwned + Default,
{
	serde_json::from_slice(body).unwrap_or_else(|err| {
		warn!("malformed response from {path}: {err}");
		T::default()
	})
}
