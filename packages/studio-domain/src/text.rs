/// Upper bound, in characters, for research queries and generation prompts.
pub const MAX_INPUT_CHARS: usize = 2_000;

/// Trims surrounding whitespace and keeps at most `max_chars` characters.
///
/// Returns `None` when nothing is left after trimming.
pub fn sanitize_input(raw: &str, max_chars: usize) -> Option<String> {
	let trimmed = raw.trim();

	if trimmed.is_empty() {
		return None;
	}

	Some(truncate_chars(trimmed, max_chars))
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
	match text.char_indices().nth(max_chars) {
		Some((byte_idx, _)) => text[..byte_idx].to_string(),
		None => text.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn blank_input_is_rejected() {
		assert_eq!(sanitize_input("   \n\t", MAX_INPUT_CHARS), None);
	}

	#[test]
	fn truncates_on_char_boundaries() {
		let text = "é".repeat(5);

		assert_eq!(truncate_chars(&text, 3), "ééé");
		assert_eq!(truncate_chars("abc", 10), "abc");
	}
}
