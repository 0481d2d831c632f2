//! Access to the document-search service.

mod error;
mod http;
mod types;

pub use error::ApiError;
pub use http::{HttpSearchApi, decode_lenient};
pub use types::{
	DocumentResult, EdgePayload, GraphPayload, NodePayload, RelatedKeyword, SearchPayload,
	SuggestPayload, UploadFile,
};

/// Server-side limit on uploaded file size, mirrored client-side.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// The four calls the explorer makes.
///
/// Futures are not `Send`: everything runs on the browser's single thread.
#[allow(async_fn_in_trait)]
pub trait SearchApi {
	/// Suggestions for a partial query.
	async fn suggest(&self, text: &str, limit: usize) -> Result<Vec<String>, ApiError>;

	/// Keyword/document graph for a query.
	async fn graph(&self, text: &str, size: usize) -> Result<GraphPayload, ApiError>;

	/// Ranked documents for a submitted query.
	async fn search(&self, text: &str, size: usize) -> Result<SearchPayload, ApiError>;

	/// Stores and indexes a document.
	async fn upload(&self, file: UploadFile) -> Result<DocumentResult, ApiError>;
}
