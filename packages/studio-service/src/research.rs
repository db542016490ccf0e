use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use studio_domain::{
	JobStatus, OperationKind, ResearchOutputType, Source,
	confidence::{self, clamp_confidence},
	fallback,
	text::{self, MAX_INPUT_CHARS},
};
use studio_providers::upstream::ResearchPayload;

use crate::{
	Error, Result, StudioService,
	jobs::{self, JobRecord, NewJob},
	params, timestamp,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResearchRequest {
	/// Kept untyped so a non-string query reads as missing instead of failing to parse.
	#[serde(default)]
	pub query: Option<Value>,
	#[serde(default)]
	pub content_item_id: Option<String>,
	#[serde(default)]
	pub agent_id: Option<String>,
	#[serde(default)]
	pub output_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResearchResponse {
	pub job_id: Uuid,
	pub status: JobStatus,
	pub job: JobRecord,
	pub sources: Vec<Source>,
	pub summary: String,
	pub confidence_score: f32,
}

struct ResearchOutcome {
	summary: String,
	sources: Vec<Source>,
	confidence: f32,
}

impl StudioService {
	/// Runs one research request to completion inside the caller's request.
	///
	/// Upstream trouble never fails the request; it degrades to the canned fallback. Storage
	/// failures after the job exists mark it `failed` before the error is returned.
	pub async fn research(&self, user_id: &str, req: ResearchRequest) -> Result<ResearchResponse> {
		let query = required_text(req.query.as_ref(), "query")?;
		let output_type = match params::non_blank(req.output_type) {
			Some(raw) => raw
				.parse::<ResearchOutputType>()
				.map_err(|err| Error::invalid(err.to_string()))?,
			None => ResearchOutputType::default(),
		};

		self.quota.ensure_allowed(user_id, OperationKind::Research).await?;

		let job = self
			.create_job(NewJob {
				user_id: user_id.to_string(),
				query,
				output_type,
				content_item_id: params::non_blank(req.content_item_id),
				agent_id: params::non_blank(req.agent_id),
			})
			.await?;
		let outcome = self.resolve_research(&job.query).await;
		let record = match self
			.finalize_job(
				user_id,
				job.job_id,
				&outcome.summary,
				&outcome.sources,
				outcome.confidence,
			)
			.await
		{
			Ok(record) => record,
			Err(err) => {
				self.fail_job(job.job_id, &err.to_string()).await;

				return Err(err);
			},
		};

		let status = jobs::parse_status(record.job_id, &record.status)?;

		// The upstream work was spent even when a cancel won the race, so it still counts.
		self.quota.record(user_id, OperationKind::Research, 0, Some(job.job_id)).await?;

		Ok(ResearchResponse {
			job_id: job.job_id,
			status,
			job: record,
			sources: outcome.sources,
			summary: outcome.summary,
			confidence_score: outcome.confidence,
		})
	}

	async fn resolve_research(&self, query: &str) -> ResearchOutcome {
		let captured_at = timestamp::now_rfc3339();

		match self.providers.upstream.research(query).await {
			Ok(Some(payload)) if !payload.sources.is_empty() =>
				self.scored_outcome(payload, &captured_at),
			Ok(Some(_)) => {
				tracing::info!("Upstream research returned no sources. Using fallback.");

				self.fallback_outcome(query, &captured_at)
			},
			Ok(None) => self.fallback_outcome(query, &captured_at),
			Err(err) => {
				tracing::warn!(error = %err, "Upstream research failed. Using fallback.");

				self.fallback_outcome(query, &captured_at)
			},
		}
	}

	fn scored_outcome(&self, payload: ResearchPayload, captured_at: &str) -> ResearchOutcome {
		let cfg = &self.cfg.confidence;
		let per_source = payload
			.confidence
			.filter(|value| value.is_finite())
			.unwrap_or(cfg.research_default)
			.clamp(0.0, 1.0);
		let sources = payload
			.sources
			.into_iter()
			.map(|source| Source {
				url: source.url,
				title: source.title,
				snippet: source.snippet,
				timestamp: Some(captured_at.to_string()),
				confidence: Some(per_source),
			})
			.collect::<Vec<_>>();
		let summary = payload.summary.unwrap_or_default();
		let confidence =
			confidence::estimate_confidence(&sources, &summary, payload.confidence, cfg.floor);

		ResearchOutcome { summary, sources, confidence }
	}

	fn fallback_outcome(&self, query: &str, captured_at: &str) -> ResearchOutcome {
		let cfg = &self.cfg.confidence;

		ResearchOutcome {
			summary: fallback::research_summary(query),
			sources: fallback::research_sources(query, captured_at, cfg.research_default),
			confidence: clamp_confidence(cfg.research_default, cfg.floor),
		}
	}
}

/// Extracts a required free-text field. Missing, non-string and empty values are "required";
/// whitespace-only values are "empty".
pub(crate) fn required_text(raw: Option<&Value>, field: &str) -> Result<String> {
	let Some(Value::String(raw)) = raw else {
		return Err(Error::invalid(format!("{field} is required")));
	};

	if raw.is_empty() {
		return Err(Error::invalid(format!("{field} is required")));
	}

	text::sanitize_input(raw, MAX_INPUT_CHARS)
		.ok_or_else(|| Error::invalid(format!("{field} cannot be empty")))
}
