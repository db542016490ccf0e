pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_research_jobs.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_research_jobs.sql")),
				"tables/002_generated_outputs.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_generated_outputs.sql")),
				"tables/003_usage_events.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_usage_events.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn includes_are_inlined() {
		let sql = render_schema();

		assert!(!sql.contains("\\ir "));
		assert!(sql.contains("CREATE TABLE IF NOT EXISTS research_jobs"));
		assert!(sql.contains("CREATE TABLE IF NOT EXISTS generated_outputs"));
		assert!(sql.contains("CREATE TABLE IF NOT EXISTS usage_events"));
	}
}
