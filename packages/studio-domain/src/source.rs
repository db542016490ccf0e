use serde::{Deserialize, Serialize};

/// One citation backing a research summary. Order within a job is display and citation order.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Source {
	pub url: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub snippet: Option<String>,
	/// RFC 3339 capture time.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub timestamp: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub confidence: Option<f32>,
}
impl Source {
	pub fn new(url: impl Into<String>) -> Self {
		Self { url: url.into(), title: None, snippet: None, timestamp: None, confidence: None }
	}
}
