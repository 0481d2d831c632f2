use thiserror::Error;

/// Failure of one call against the search service.
#[derive(Debug, Error)]
pub enum ApiError {
	/// The request never produced a response (network, timeout, TLS).
	#[error("{0}")]
	Transport(#[from] reqwest::Error),
	/// The service answered with a non-success status.
	#[error("HTTP {status}: {message}")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Message extracted from the response body, possibly empty.
		message: String,
	},
	/// Refused before any request was sent.
	#[error("{0}")]
	Rejected(String),
	/// The local file could not be read.
	#[error("could not read file: {0}")]
	Read(String),
}

impl ApiError {
	/// Builds a status error from a response body.
	///
	/// The service answers either with plain text or with `{"error": "..."}`.
	pub fn from_status(status: u16, body: &[u8]) -> Self {
		let message = serde_json::from_slice::<serde_json::Value>(body)
			.ok()
			.and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
			.unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_owned());
		Self::Status { status, message }
	}

	/// Text for a user-facing notice: the server's message when it sent one,
	/// the raw error otherwise.
	pub fn user_message(&self) -> String {
		match self {
			Self::Status { status, message } if message.is_empty() => format!("HTTP {status}"),
			Self::Status { message, .. } => message.clone(),
			other => other.to_string(),
		}
	}

	/// Whether the call timed out.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Transport(err) if err.is_timeout())
	}
}
