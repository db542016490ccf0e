pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures talking to the upstream provider or the identity backend. Every variant is
/// recoverable for the pipeline, which falls back to canned content.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Upstream request failed: {0}")]
	Http(#[from] reqwest::Error),
	#[error("Upstream payload is not valid JSON: {0}")]
	Decode(#[from] serde_json::Error),
	#[error("Invalid header name: {0}")]
	HeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error("Invalid header value: {0}")]
	HeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("Upstream is unavailable: {message}")]
	Unavailable { message: String },
	#[error("Upstream returned status {status}.")]
	Status { status: u16 },
}
