//! RFC 3339 timestamps, both for `#[serde(with = "crate::timestamp")]` fields and for source
//! capture stamps.

use serde::{Deserialize, Deserializer, Serializer};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub fn now_rfc3339() -> String {
	format(OffsetDateTime::now_utc())
}

/// Falls back to unix seconds for the rare instant RFC 3339 cannot express (years past 9999).
pub fn format(value: OffsetDateTime) -> String {
	value.format(&Rfc3339).unwrap_or_else(|_| value.unix_timestamp().to_string())
}

pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	serializer.serialize_str(&format(*value))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = String::deserialize(deserializer)?;

	OffsetDateTime::parse(&raw, &Rfc3339).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn stamps_parse_back() {
		let stamp = now_rfc3339();

		assert!(OffsetDateTime::parse(&stamp, &Rfc3339).is_ok());
	}

	#[test]
	fn fixed_instant_formats_in_utc() {
		let instant = time::macros::datetime!(2025-01-02 03:04:05 UTC);

		assert_eq!(format(instant), "2025-01-02T03:04:05Z");
	}
}
