use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// A value that did not match any member of a closed string set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
	pub field: &'static str,
	pub allowed: &'static [&'static str],
}
impl fmt::Display for UnknownVariant {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} must be one of: {}", self.field, self.allowed.join(", "))
	}
}

impl std::error::Error for UnknownVariant {}

/// Billable operation classes. Each kind has its own daily cap.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
	Research,
	Generate,
}
impl OperationKind {
	pub const ALL: [&'static str; 2] = ["research", "generate"];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Research => "research",
			Self::Generate => "generate",
		}
	}

	/// Noun used in quota messages.
	pub fn label(self) -> &'static str {
		match self {
			Self::Research => "research",
			Self::Generate => "generation",
		}
	}
}
impl FromStr for OperationKind {
	type Err = UnknownVariant;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw {
			"research" => Ok(Self::Research),
			"generate" => Ok(Self::Generate),
			_ => Err(UnknownVariant { field: "operation", allowed: &Self::ALL }),
		}
	}
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchOutputType {
	#[default]
	Summary,
	Thread,
	Script,
	Caption,
}
impl ResearchOutputType {
	pub const ALL: [&'static str; 4] = ["summary", "thread", "script", "caption"];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Summary => "summary",
			Self::Thread => "thread",
			Self::Script => "script",
			Self::Caption => "caption",
		}
	}
}
impl FromStr for ResearchOutputType {
	type Err = UnknownVariant;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw {
			"summary" => Ok(Self::Summary),
			"thread" => Ok(Self::Thread),
			"script" => Ok(Self::Script),
			"caption" => Ok(Self::Caption),
			_ => Err(UnknownVariant { field: "output_type", allowed: &Self::ALL }),
		}
	}
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationOutputType {
	Thread,
	Script,
	Caption,
	#[default]
	Article,
}
impl GenerationOutputType {
	pub const ALL: [&'static str; 4] = ["thread", "script", "caption", "article"];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Thread => "thread",
			Self::Script => "script",
			Self::Caption => "caption",
			Self::Article => "article",
		}
	}
}
impl FromStr for GenerationOutputType {
	type Err = UnknownVariant;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw {
			"thread" => Ok(Self::Thread),
			"script" => Ok(Self::Script),
			"caption" => Ok(Self::Caption),
			"article" => Ok(Self::Article),
			_ => Err(UnknownVariant { field: "output_type", allowed: &Self::ALL }),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unknown_generation_type_names_allowed_set() {
		let err = "tweet".parse::<GenerationOutputType>().expect_err("tweet is not allowed");

		assert_eq!(err.to_string(), "output_type must be one of: thread, script, caption, article");
	}

	#[test]
	fn string_forms_round_trip() {
		for raw in ResearchOutputType::ALL {
			let parsed: ResearchOutputType = raw.parse().expect("known research type");

			assert_eq!(parsed.as_str(), raw);
		}
		for raw in OperationKind::ALL {
			let parsed: OperationKind = raw.parse().expect("known operation");

			assert_eq!(parsed.as_str(), raw);
		}
	}
}
