pub mod identity;
pub mod retry;
pub mod upstream;

mod error;

pub use error::{Error, Result};
pub use studio_domain::BoxFuture;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName};
use serde_json::{Map, Value};

pub fn auth_headers(
	api_key: Option<&str>,
	default_headers: &Map<String, Value>,
) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	if let Some(api_key) = api_key {
		headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);
	}

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bearer_is_omitted_without_key() {
		let mut extra = Map::new();

		extra.insert("x-team".to_string(), Value::String("studio".to_string()));

		let headers = auth_headers(None, &extra).expect("headers");

		assert!(headers.get(AUTHORIZATION).is_none());
		assert_eq!(headers.get("x-team").and_then(|v| v.to_str().ok()), Some("studio"));
	}

	#[test]
	fn non_string_header_values_are_rejected() {
		let mut extra = Map::new();

		extra.insert("x-retries".to_string(), Value::from(3));

		assert!(matches!(
			auth_headers(Some("key"), &extra),
			Err(Error::InvalidConfig { .. })
		));
	}
}
