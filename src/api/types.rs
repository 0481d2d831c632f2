//! Wire payloads of the search service.
//!
//! Every field defaults, so a response missing expected fields decodes as the
//! empty result instead of failing.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// `GET /api/search/suggest`
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SuggestPayload {
	/// Server-ranked suggestion strings.
	pub suggestions: Vec<String>,
}

/// `GET /api/search/graph`, and the `graph` member of a search response.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct GraphPayload {
	/// Raw nodes, possibly with duplicate or empty ids.
	pub nodes: Vec<NodePayload>,
	/// Raw edges, possibly dangling.
	pub edges: Vec<EdgePayload>,
}

/// One raw node.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct NodePayload {
	/// Node id; numbers are accepted and stringified.
	#[serde(deserialize_with = "lenient_string")]
	pub id: String,
	/// Display label.
	#[serde(deserialize_with = "lenient_string")]
	pub label: String,
	/// `"document"`, `"keyword"` or anything else.
	#[serde(rename = "type")]
	pub kind: Option<Value>,
	/// Opaque metadata passed through to the caller.
	#[serde(deserialize_with = "null_as_default")]
	pub meta: Map<String, Value>,
}

/// One raw edge.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct EdgePayload {
	/// Source node id.
	#[serde(deserialize_with = "lenient_string")]
	pub source: String,
	/// Target node id.
	#[serde(deserialize_with = "lenient_string")]
	pub target: String,
	/// Edge weight; missing or non-numeric values are `None`.
	#[serde(deserialize_with = "lenient_number")]
	pub weight: Option<f64>,
}

/// `GET /api/search`
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchPayload {
	/// Ranked documents.
	pub results: Vec<DocumentResult>,
	/// Graph built from the results, when the service sends one.
	pub graph: Option<GraphPayload>,
	/// Total hit count.
	pub total: Option<u64>,
	/// Most frequent tags among the results.
	pub related_keywords: Vec<RelatedKeyword>,
}

/// A document hit, also returned by the upload endpoint.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct DocumentResult {
	/// Document id.
	#[serde(deserialize_with = "lenient_string")]
	pub id: String,
	/// Original file name.
	#[serde(deserialize_with = "lenient_string")]
	pub filename: String,
	/// Tags extracted at index time.
	#[serde(deserialize_with = "null_as_default")]
	pub tags: Vec<String>,
	/// Upload timestamp, as sent.
	#[serde(deserialize_with = "lenient_string")]
	pub uploaded_at: String,
	/// Leading content excerpt.
	#[serde(deserialize_with = "lenient_string")]
	pub snippet: String,
	/// Download link for the stored file.
	#[serde(deserialize_with = "lenient_string")]
	pub download_url: String,
	/// Fields this client does not interpret.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// Tag frequency among the result set.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RelatedKeyword {
	/// The tag.
	#[serde(deserialize_with = "lenient_string")]
	pub keyword: String,
	/// Number of results carrying it.
	#[serde(deserialize_with = "lenient_number")]
	pub score: Option<f64>,
}

/// A file picked for upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadFile {
	/// File name sent with the multipart part.
	pub name: String,
	/// MIME type reported by the browser, if any.
	pub mime: Option<String>,
	/// File content.
	pub bytes: Vec<u8>,
}

fn lenient_string<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
	Ok(match Value::deserialize(de)? {
		Value::String(s) => s,
		Value::Number(n) => n.to_string(),
		Value::Bool(b) => b.to_string(),
		_ => String::new(),
	})
}

fn lenient_number<'de, D: Deserializer<'de>>(de: D) -> Result<Option<f64>, D::Error> {
	Ok(match Value::deserialize(de)? {
		Value::Number(n) => n.as_f64(),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	})
}

fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + Deserialize<'de>,
{
	Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}
