use serde::{Deserialize, Deserializer};
use serde_json::Value;
use uuid::Uuid;

use crate::{Error, Result};

/// Accepts a number or a numeric string. Anything else reads as absent, so `limit=abc` behaves
/// like no limit at all.
pub(crate) fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = Option::<Value>::deserialize(deserializer)?;
	let parsed = match raw {
		Some(Value::Number(number)) =>
			number.as_i64().or_else(|| number.as_f64().filter(|v| v.is_finite()).map(|v| v as i64)),
		Some(Value::String(text)) => {
			let text = text.trim();

			text.parse::<i64>().ok().or_else(|| {
				text.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v as i64)
			})
		},
		_ => None,
	};

	Ok(parsed)
}

/// Resolves a page request. A missing or zero limit takes the default; others are clamped to
/// `[1, max]`. Negative offsets read as zero.
pub(crate) fn page(limit: Option<i64>, offset: Option<i64>, default: u32, max: u32) -> (i64, i64) {
	let max = i64::from(max.max(1));
	let limit = match limit {
		None | Some(0) => i64::from(default),
		Some(value) => value,
	}
	.clamp(1, max);

	(limit, offset.unwrap_or(0).max(0))
}

pub(crate) fn non_blank(raw: Option<String>) -> Option<String> {
	raw.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

/// A missing id is a bad request. A malformed one can never match a row, so it is not found.
pub(crate) fn require_uuid(raw: Option<String>, field: &str, missing: &str) -> Result<Uuid> {
	let Some(raw) = non_blank(raw) else {
		return Err(Error::invalid(format!("{field} is required")));
	};

	Uuid::parse_str(&raw).map_err(|_| Error::not_found(missing))
}
