use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use studio_domain::{GenerationOutputType, OperationKind, confidence::clamp_confidence, fallback};
use studio_storage::{OutputFilter, models::GeneratedOutput};

use crate::{Error, Result, StudioService, params, research::required_text};

const OUTPUT_NOT_FOUND: &str = "Output not found";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateRequest {
	#[serde(default)]
	pub prompt: Option<Value>,
	#[serde(default)]
	pub output_type: Option<String>,
	/// Optional link back to a research job. Not checked for existence.
	#[serde(default)]
	pub job_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateResponse {
	pub output_id: Uuid,
	pub output: OutputRecord,
	pub confidence_score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputRecord {
	pub output_id: Uuid,
	pub user_id: String,
	pub job_id: Option<Uuid>,
	pub output_type: String,
	pub content: String,
	pub confidence_score: Option<f32>,
	pub approved: bool,
	#[serde(with = "crate::timestamp")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::timestamp")]
	pub updated_at: OffsetDateTime,
}
impl From<GeneratedOutput> for OutputRecord {
	fn from(output: GeneratedOutput) -> Self {
		Self {
			output_id: output.output_id,
			user_id: output.user_id,
			job_id: output.job_id,
			output_type: output.output_type,
			content: output.content,
			confidence_score: output.confidence_score,
			approved: output.approved,
			created_at: output.created_at,
			updated_at: output.updated_at,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListOutputsRequest {
	#[serde(default)]
	pub job_id: Option<String>,
	#[serde(default, deserialize_with = "crate::params::lenient_i64")]
	pub limit: Option<i64>,
	#[serde(default, deserialize_with = "crate::params::lenient_i64")]
	pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListOutputsResponse {
	pub outputs: Vec<OutputRecord>,
	pub count: i64,
}

impl StudioService {
	/// Produces and stores exactly one output, from the upstream when it answers with content and
	/// from the placeholder otherwise. Usage is recorded either way.
	pub async fn generate(&self, user_id: &str, req: GenerateRequest) -> Result<GenerateResponse> {
		let prompt = required_text(req.prompt.as_ref(), "prompt")?;
		let output_type = match params::non_blank(req.output_type) {
			Some(raw) => raw
				.parse::<GenerationOutputType>()
				.map_err(|err| Error::invalid(err.to_string()))?,
			None => GenerationOutputType::default(),
		};
		let job_id = match params::non_blank(req.job_id) {
			Some(raw) => Some(
				Uuid::parse_str(&raw).map_err(|_| Error::invalid("job_id must be a UUID"))?,
			),
			None => None,
		};

		self.quota.ensure_allowed(user_id, OperationKind::Generate).await?;

		let (content, confidence_score) = self.resolve_content(&prompt, output_type).await;
		let now = OffsetDateTime::now_utc();
		let output = GeneratedOutput {
			output_id: Uuid::new_v4(),
			user_id: user_id.to_string(),
			job_id,
			output_type: output_type.as_str().to_string(),
			content,
			confidence_score: Some(confidence_score),
			approved: false,
			created_at: now,
			updated_at: now,
		};

		self.store.insert_output(&output).await?;
		self.quota
			.record(user_id, OperationKind::Generate, output.content.chars().count(), job_id)
			.await?;

		tracing::info!(output_id = %output.output_id, user_id, "Generated output stored.");

		Ok(GenerateResponse {
			output_id: output.output_id,
			output: output.into(),
			confidence_score,
		})
	}

	/// Sets `approved`. There is no way back, and approving again is harmless.
	pub async fn approve_output(&self, user_id: &str, output_id: &str) -> Result<OutputRecord> {
		let output_id = parse_output_id(output_id)?;
		let row = self
			.store
			.approve_output(output_id, user_id, OffsetDateTime::now_utc())
			.await?
			.ok_or_else(|| Error::not_found(OUTPUT_NOT_FOUND))?;

		Ok(row.into())
	}

	pub async fn get_output(&self, user_id: &str, output_id: &str) -> Result<OutputRecord> {
		let output_id = parse_output_id(output_id)?;
		let row = self
			.store
			.get_output(output_id, user_id)
			.await?
			.ok_or_else(|| Error::not_found(OUTPUT_NOT_FOUND))?;

		Ok(row.into())
	}

	pub async fn list_outputs(
		&self,
		user_id: &str,
		req: ListOutputsRequest,
	) -> Result<ListOutputsResponse> {
		let job_id = match params::non_blank(req.job_id) {
			Some(raw) => Some(
				Uuid::parse_str(&raw).map_err(|_| Error::invalid("job_id must be a UUID"))?,
			),
			None => None,
		};
		let (limit, offset) = params::page(
			req.limit,
			req.offset,
			self.cfg.jobs.default_list_limit,
			self.cfg.jobs.max_list_limit,
		);
		let filter = OutputFilter { user_id: user_id.to_string(), job_id, limit, offset };
		let (rows, count) = self.store.list_outputs(&filter).await?;

		Ok(ListOutputsResponse { outputs: rows.into_iter().map(OutputRecord::from).collect(), count })
	}

	async fn resolve_content(&self, prompt: &str, output_type: GenerationOutputType) -> (String, f32) {
		let cfg = &self.cfg.confidence;

		match self.providers.upstream.generate(prompt, output_type).await {
			Ok(Some(payload)) => match payload.content.filter(|content| !content.is_empty()) {
				Some(content) => {
					let reported = payload.confidence.unwrap_or(cfg.generate_default);

					return (content, clamp_confidence(reported, cfg.floor));
				},
				None => tracing::info!("Upstream generation returned no content. Using fallback."),
			},
			Ok(None) => {},
			Err(err) => {
				tracing::warn!(error = %err, "Upstream generation failed. Using fallback.");
			},
		}

		(
			fallback::generated_content(output_type, prompt),
			clamp_confidence(cfg.generate_default, cfg.floor),
		)
	}
}

fn parse_output_id(raw: &str) -> Result<Uuid> {
	Uuid::parse_str(raw.trim()).map_err(|_| Error::not_found(OUTPUT_NOT_FOUND))
}
