use std::{sync::Arc, time::Duration};

use reqwest::{Client, header::HeaderMap};
use serde::Deserialize;
use serde_json::Value;

use crate::{
	BoxFuture, Error, Result,
	retry::{self, RetryPolicy, Sleeper, TokioSleeper},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
	Research,
	Generate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
	pub status: u16,
	pub body: String,
}
impl UpstreamResponse {
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	pub fn is_server_error(&self) -> bool {
		self.status >= 500
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResearchPayload {
	#[serde(default)]
	pub summary: Option<String>,
	#[serde(default)]
	pub sources: Vec<UpstreamSource>,
	#[serde(default)]
	pub confidence: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamSource {
	pub url: String,
	#[serde(default)]
	pub title: Option<String>,
	#[serde(default)]
	pub snippet: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationPayload {
	#[serde(default)]
	pub content: Option<String>,
	#[serde(default)]
	pub confidence: Option<f32>,
}

/// One HTTP exchange with the provider. Retries are layered on top by [`UpstreamClient`].
pub trait UpstreamTransport
where
	Self: Send + Sync,
{
	fn post<'a>(
		&'a self,
		url: &'a str,
		headers: &'a HeaderMap,
		body: &'a Value,
	) -> BoxFuture<'a, Result<UpstreamResponse>>;
}

pub struct HttpTransport {
	client: Client,
}
impl HttpTransport {
	pub fn new(timeout: Duration) -> Result<Self> {
		Ok(Self { client: Client::builder().timeout(timeout).build()? })
	}
}
impl UpstreamTransport for HttpTransport {
	fn post<'a>(
		&'a self,
		url: &'a str,
		headers: &'a HeaderMap,
		body: &'a Value,
	) -> BoxFuture<'a, Result<UpstreamResponse>> {
		Box::pin(async move {
			let res = self
				.client
				.post(url)
				.headers(headers.clone())
				.json(body)
				.send()
				.await
				.map_err(|err| Error::Unavailable { message: err.to_string() })?;
			let status = res.status().as_u16();
			let body = res.text().await?;

			Ok(UpstreamResponse { status, body })
		})
	}
}

/// Client for the research/generation provider.
///
/// Without a configured `api_base` the client is disabled: the typed calls return `Ok(None)` and
/// never touch the network.
pub struct UpstreamClient {
	api_base: Option<String>,
	research_path: String,
	generate_path: String,
	headers: HeaderMap,
	policy: RetryPolicy,
	transport: Arc<dyn UpstreamTransport>,
	sleeper: Arc<dyn Sleeper>,
}
impl UpstreamClient {
	pub fn from_config(cfg: &studio_config::Upstream) -> Result<Self> {
		let transport = HttpTransport::new(Duration::from_millis(cfg.timeout_ms))?;

		Self::with_transport(cfg, Arc::new(transport), Arc::new(TokioSleeper))
	}

	pub fn with_transport(
		cfg: &studio_config::Upstream,
		transport: Arc<dyn UpstreamTransport>,
		sleeper: Arc<dyn Sleeper>,
	) -> Result<Self> {
		let headers = crate::auth_headers(cfg.api_key.as_deref(), &cfg.default_headers)?;

		Ok(Self {
			api_base: cfg.api_base.clone(),
			research_path: cfg.research_path.clone(),
			generate_path: cfg.generate_path.clone(),
			headers,
			policy: RetryPolicy::from_config(&cfg.retry),
			transport,
			sleeper,
		})
	}

	pub fn is_enabled(&self) -> bool {
		self.api_base.is_some()
	}

	/// Posts `payload` with retries and returns the final response, successful or not.
	pub async fn call(&self, endpoint: Endpoint, payload: &Value) -> Result<UpstreamResponse> {
		let Some(api_base) = self.api_base.as_deref() else {
			return Err(Error::InvalidConfig {
				message: "Upstream api_base is not configured.".to_string(),
			});
		};
		let path = match endpoint {
			Endpoint::Research => self.research_path.as_str(),
			Endpoint::Generate => self.generate_path.as_str(),
		};
		let url = format!("{api_base}{path}");
		let url = url.as_str();

		retry::run_with_retry(&self.policy, self.sleeper.as_ref(), move |_| {
			self.transport.post(url, &self.headers, payload)
		})
		.await
	}

	pub async fn research(&self, query: &str) -> Result<Option<ResearchPayload>> {
		if !self.is_enabled() {
			return Ok(None);
		}

		let payload = serde_json::json!({ "query": query });
		let response = self.call(Endpoint::Research, &payload).await?;

		parse_research(&response).map(Some)
	}

	pub async fn generate(
		&self,
		prompt: &str,
		output_type: &str,
	) -> Result<Option<GenerationPayload>> {
		if !self.is_enabled() {
			return Ok(None);
		}

		let payload = serde_json::json!({ "prompt": prompt, "output_type": output_type });
		let response = self.call(Endpoint::Generate, &payload).await?;

		parse_generation(&response).map(Some)
	}
}

pub fn parse_research(response: &UpstreamResponse) -> Result<ResearchPayload> {
	ensure_success(response)?;

	Ok(serde_json::from_str(&response.body)?)
}

pub fn parse_generation(response: &UpstreamResponse) -> Result<GenerationPayload> {
	ensure_success(response)?;

	Ok(serde_json::from_str(&response.body)?)
}

fn ensure_success(response: &UpstreamResponse) -> Result<()> {
	if response.is_success() {
		Ok(())
	} else {
		Err(Error::Status { status: response.status })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn response(status: u16, body: &str) -> UpstreamResponse {
		UpstreamResponse { status, body: body.to_string() }
	}

	#[test]
	fn research_payload_tolerates_missing_fields() {
		let parsed = parse_research(&response(200, "{}")).expect("empty object parses");

		assert!(parsed.summary.is_none());
		assert!(parsed.sources.is_empty());
		assert!(parsed.confidence.is_none());
	}

	#[test]
	fn research_sources_keep_order() {
		let body = r#"{
			"summary": "According to both reports.",
			"sources": [
				{ "url": "https://a.example/1", "title": "A" },
				{ "url": "https://b.example/2", "snippet": "B" }
			],
			"confidence": 0.72
		}"#;
		let parsed = parse_research(&response(200, body)).expect("valid payload");

		assert_eq!(parsed.sources[0].url, "https://a.example/1");
		assert_eq!(parsed.sources[1].snippet.as_deref(), Some("B"));
		assert_eq!(parsed.confidence, Some(0.72));
	}

	#[test]
	fn non_success_status_is_an_error() {
		let err = parse_generation(&response(404, "{}")).expect_err("404 is not a payload");

		assert!(matches!(err, Error::Status { status: 404 }));
	}

	#[test]
	fn garbage_body_is_an_error() {
		assert!(parse_generation(&response(200, "<html>")).is_err());
	}

	#[tokio::test]
	async fn refused_connections_are_unavailable() {
		let transport = HttpTransport::new(Duration::from_secs(2)).expect("client builds");
		let err = transport
			.post("http://127.0.0.1:9/research", &HeaderMap::new(), &serde_json::json!({}))
			.await
			.expect_err("nothing listens on the discard port");

		assert!(matches!(err, Error::Unavailable { .. }), "Unexpected error: {err}.");
	}
}
