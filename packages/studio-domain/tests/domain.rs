use studio_domain::{
	GenerationOutputType, confidence,
	fallback::{self, FALLBACK_SOURCE_URLS},
	text::{self, MAX_INPUT_CHARS},
};

#[test]
fn offline_research_payload_for_query() {
	let query = "AI trends 2025";
	let sources = fallback::research_sources(query, "2025-01-01T00:00:00Z", 0.85);
	let summary = fallback::research_summary(query);

	assert_eq!(sources.len(), 2);
	assert_eq!(sources[0].url, FALLBACK_SOURCE_URLS[0]);
	assert_eq!(sources[1].url, FALLBACK_SOURCE_URLS[1]);
	assert_eq!(sources[0].snippet.as_deref(), Some("Relevant information about \"AI trends 2025\""));
	assert_eq!(sources[1].title.as_deref(), Some("Source 2"));
	assert!(summary.starts_with("Research summary for AI trends 2025:"));
}

#[test]
fn placeholder_content_embeds_type_and_prompt() {
	let content = fallback::generated_content(GenerationOutputType::Thread, "launch plan");

	assert!(content.starts_with("[Generated thread]\n\nBased on: \"launch plan\""));
	assert!(content.contains("placeholder"));
}

#[test]
fn long_input_is_cut_to_exactly_the_cap() {
	let raw = format!("  {}  ", "q".repeat(MAX_INPUT_CHARS + 250));
	let sanitized = text::sanitize_input(&raw, MAX_INPUT_CHARS).expect("non-blank input");

	assert_eq!(sanitized.chars().count(), MAX_INPUT_CHARS);
}

#[test]
fn confidence_stays_in_bounds_for_any_tier() {
	let summaries = ["", "plain words", "according to https://example.com"];

	for count in 0..6 {
		let sources = (0..count)
			.map(|i| studio_domain::Source::new(format!("https://example.com/{i}")))
			.collect::<Vec<_>>();

		for summary in summaries {
			for upstream in [None, Some(0.0), Some(0.3), Some(0.95), Some(4.0)] {
				let score = confidence::estimate_confidence(
					&sources,
					summary,
					upstream,
					confidence::DEFAULT_CONFIDENCE_FLOOR,
				);

				assert!((0.5..=1.0).contains(&score), "score {score} out of bounds");
			}
		}
	}
}

#[test]
fn source_omits_absent_fields_when_serialized() {
	let json = serde_json::to_value(studio_domain::Source::new("https://example.com/a"))
		.expect("serialize source");

	assert_eq!(json, serde_json::json!({ "url": "https://example.com/a" }));
}
