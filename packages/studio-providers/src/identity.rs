use std::time::Duration;

use reqwest::{
	Client,
	header::{AUTHORIZATION, HeaderMap, HeaderName},
};
use serde_json::Value;

use crate::Result;

const API_KEY_HEADER: &str = "apikey";

/// Resolves bearer tokens against the managed backend's user endpoint.
pub struct RemoteIdentity {
	client: Client,
	url: String,
	api_key: Option<String>,
}
impl RemoteIdentity {
	pub fn from_config(cfg: &studio_config::RemoteAuth) -> Result<Self> {
		let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;

		Ok(Self {
			client,
			url: format!("{}{}", cfg.api_base, cfg.path),
			api_key: cfg.api_key.clone(),
		})
	}

	/// `Ok(None)` means the backend rejected the token. Transport failures are errors.
	pub async fn resolve(&self, token: &str) -> Result<Option<String>> {
		let mut headers = HeaderMap::new();

		headers.insert(AUTHORIZATION, format!("Bearer {token}").parse()?);

		if let Some(api_key) = self.api_key.as_deref() {
			headers.insert(HeaderName::from_static(API_KEY_HEADER), api_key.parse()?);
		}

		let res = self.client.get(&self.url).headers(headers).send().await?;

		if !res.status().is_success() {
			tracing::debug!(status = res.status().as_u16(), "Identity lookup rejected token.");

			return Ok(None);
		}

		let json: Value = match res.json().await {
			Ok(json) => json,
			Err(err) => {
				tracing::warn!(error = %err, "Identity response was not JSON.");

				return Ok(None);
			},
		};

		Ok(parse_user_id(&json))
	}
}

pub fn parse_user_id(json: &Value) -> Option<String> {
	json.get("id")
		.and_then(Value::as_str)
		.map(str::trim)
		.filter(|id| !id.is_empty())
		.map(ToString::to_string)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_id_must_be_a_non_blank_string() {
		assert_eq!(parse_user_id(&serde_json::json!({ "id": "u-1" })), Some("u-1".to_string()));
		assert_eq!(parse_user_id(&serde_json::json!({ "id": 42 })), None);
		assert_eq!(parse_user_id(&serde_json::json!({ "id": "  " })), None);
		assert_eq!(parse_user_id(&serde_json::json!({ "user": { "id": "u-1" } })), None);
	}
}
