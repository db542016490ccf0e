//! Confidence and hallucination-risk scoring for upstream output.
//!
//! Scores never drop below the configured floor. The floor keeps the UI from flagging every
//! thinly sourced answer; it is not a claim about accuracy.

use regex::Regex;

use crate::Source;

pub const DEFAULT_CONFIDENCE_FLOOR: f32 = 0.5;

const RISK_NO_SOURCES: f32 = 0.6;
const RISK_WELL_CITED: f32 = 0.1;
const RISK_SUPPORTED: f32 = 0.2;
const RISK_THIN: f32 = 0.35;
const WELL_SOURCED_COUNT: usize = 3;

const CITATION_PATTERNS: [&str; 2] =
	[r"https?://\S+", r"(?i)\b(source|according to|cited|reference)"];

/// Risk in [0, 1] that a summary is unsupported by its sources. Higher is worse.
pub fn hallucination_risk(sources: &[Source], summary: &str) -> f32 {
	let count = sources.len();

	if count == 0 {
		return RISK_NO_SOURCES;
	}

	let cited = has_citations(summary);

	if count >= WELL_SOURCED_COUNT && cited {
		RISK_WELL_CITED
	} else if count >= WELL_SOURCED_COUNT || cited {
		RISK_SUPPORTED
	} else {
		RISK_THIN
	}
}

/// Combines the heuristic with the upstream's own estimate, keeping the more cautious of the two,
/// and clamps the result to `[floor, 1.0]`.
pub fn estimate_confidence(
	sources: &[Source],
	summary: &str,
	upstream_confidence: Option<f32>,
	floor: f32,
) -> f32 {
	let heuristic = 1.0 - hallucination_risk(sources, summary);
	let combined = match upstream_confidence.filter(|value| value.is_finite()) {
		Some(reported) => heuristic.min(reported),
		None => heuristic,
	};

	clamp_confidence(combined, floor)
}

pub fn clamp_confidence(value: f32, floor: f32) -> f32 {
	if !value.is_finite() {
		return floor;
	}

	value.clamp(floor, 1.0)
}

fn has_citations(summary: &str) -> bool {
	CITATION_PATTERNS
		.iter()
		.any(|pattern| Regex::new(pattern).map(|re| re.is_match(summary)).unwrap_or(false))
}
