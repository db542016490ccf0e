//! Deterministic payloads used when the upstream provider is disabled or unreachable.

use crate::{GenerationOutputType, Source};

pub const FALLBACK_SOURCE_URLS: [&str; 2] =
	["https://example.com/source1", "https://example.com/source2"];

pub fn research_sources(query: &str, captured_at: &str, confidence: f32) -> Vec<Source> {
	vec![
		Source {
			url: FALLBACK_SOURCE_URLS[0].to_string(),
			title: Some("Source 1".to_string()),
			snippet: Some(format!("Relevant information about \"{query}\"")),
			timestamp: Some(captured_at.to_string()),
			confidence: Some(confidence),
		},
		Source {
			url: FALLBACK_SOURCE_URLS[1].to_string(),
			title: Some("Source 2".to_string()),
			snippet: Some("Additional context and findings".to_string()),
			timestamp: Some(captured_at.to_string()),
			confidence: Some(confidence),
		},
	]
}

pub fn research_summary(query: &str) -> String {
	format!("Research summary for {query}: Key findings and insights based on web sources.")
}

pub fn generated_content(output_type: GenerationOutputType, prompt: &str) -> String {
	format!(
		"[Generated {}]\n\nBased on: \"{prompt}\"\n\nThis is a placeholder generated content. Connect your upstream API to see real outputs.",
		output_type.as_str()
	)
}
