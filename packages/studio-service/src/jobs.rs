use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use studio_domain::{JobStatus, ResearchOutputType, Source};
use studio_storage::{JobFilter, models::ResearchJob};

use crate::{Error, Result, StudioService, params};

const JOB_NOT_FOUND: &str = "Job not found";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
	pub job_id: Uuid,
	pub user_id: String,
	pub agent_id: Option<String>,
	pub content_item_id: Option<String>,
	pub query: String,
	pub output_type: String,
	pub status: String,
	pub progress: i32,
	pub output_text: Option<String>,
	pub sources: Value,
	pub metadata: Value,
	#[serde(with = "crate::timestamp")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::timestamp")]
	pub updated_at: OffsetDateTime,
}
impl From<ResearchJob> for JobRecord {
	fn from(job: ResearchJob) -> Self {
		Self {
			job_id: job.job_id,
			user_id: job.user_id,
			agent_id: job.agent_id,
			content_item_id: job.content_item_id,
			query: job.query,
			output_type: job.output_type,
			status: job.status,
			progress: job.progress,
			output_text: job.output_text,
			sources: job.sources,
			metadata: job.metadata,
			created_at: job.created_at,
			updated_at: job.updated_at,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListJobsRequest {
	#[serde(default, deserialize_with = "crate::params::lenient_i64")]
	pub limit: Option<i64>,
	#[serde(default, deserialize_with = "crate::params::lenient_i64")]
	pub offset: Option<i64>,
	#[serde(default)]
	pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListJobsResponse {
	pub jobs: Vec<JobRecord>,
	/// Total rows matching the filter, not the page size.
	pub count: i64,
}

/// Fields for a new job. `query` must already be sanitized.
#[derive(Debug, Clone)]
pub struct NewJob {
	pub user_id: String,
	pub query: String,
	pub output_type: ResearchOutputType,
	pub content_item_id: Option<String>,
	pub agent_id: Option<String>,
}

impl StudioService {
	/// Inserts the job directly in `running`. Nothing in this path assigns `pending`.
	pub async fn create_job(&self, new: NewJob) -> Result<ResearchJob> {
		let now = OffsetDateTime::now_utc();
		let job = ResearchJob {
			job_id: Uuid::new_v4(),
			user_id: new.user_id,
			agent_id: new.agent_id,
			content_item_id: new.content_item_id,
			query: new.query,
			output_type: new.output_type.as_str().to_string(),
			status: JobStatus::Running.as_str().to_string(),
			progress: 0,
			output_text: None,
			sources: Value::Array(Vec::new()),
			metadata: Value::Object(Default::default()),
			created_at: now,
			updated_at: now,
		};

		self.store.insert_job(&job).await?;

		tracing::info!(job_id = %job.job_id, user_id = %job.user_id, "Research job created.");

		Ok(job)
	}

	/// Moves a running job to `completed` with its output in a single write.
	///
	/// A job that reached a terminal state first, typically a cancel that landed during the
	/// upstream call, keeps that state and is returned unchanged.
	pub async fn finalize_job(
		&self,
		user_id: &str,
		job_id: Uuid,
		summary: &str,
		sources: &[Source],
		confidence_score: f32,
	) -> Result<JobRecord> {
		let sources = serde_json::to_value(sources)
			.map_err(|err| Error::Storage { message: format!("Failed to encode sources: {err}") })?;
		let metadata = serde_json::json!({ "confidence_score": confidence_score });

		if let Some(row) = self
			.store
			.complete_job(job_id, summary, &sources, &metadata, OffsetDateTime::now_utc())
			.await?
		{
			return Ok(row.into());
		}

		let current = self
			.store
			.get_job(job_id, user_id)
			.await?
			.ok_or_else(|| Error::not_found(JOB_NOT_FOUND))?;
		let status = parse_status(current.job_id, &current.status)?;

		if !status.is_terminal() {
			return Err(Error::Conflict {
				message: format!("Job is {status} and cannot be completed"),
			});
		}

		tracing::info!(%job_id, %status, "Research job was already terminal. Keeping it.");

		Ok(current.into())
	}

	/// Best effort. A failure here is logged and otherwise ignored so the original error wins.
	pub async fn fail_job(&self, job_id: Uuid, reason: &str) {
		let metadata = serde_json::json!({ "error": reason });

		match self.store.fail_job(job_id, &metadata, OffsetDateTime::now_utc()).await {
			Ok(Some(_)) => tracing::warn!(%job_id, reason, "Research job marked failed."),
			Ok(None) => tracing::warn!(%job_id, "Research job was no longer running. Left as is."),
			Err(err) => tracing::error!(%job_id, error = %err, "Failed to mark research job failed."),
		}
	}

	pub async fn cancel_job(&self, user_id: &str, job_id: Uuid) -> Result<JobRecord> {
		if !self.cfg.jobs.allow_cancel_terminal {
			let current = self
				.store
				.get_job(job_id, user_id)
				.await?
				.ok_or_else(|| Error::not_found(JOB_NOT_FOUND))?;
			let status = parse_status(current.job_id, &current.status)?;

			if status == JobStatus::Cancelled {
				return Ok(current.into());
			}
			if !status.can_cancel(false) {
				return Err(Error::Conflict {
					message: format!("Job is already {status} and cannot be cancelled"),
				});
			}
		}

		let row = self
			.store
			.cancel_job(job_id, user_id, OffsetDateTime::now_utc())
			.await?
			.ok_or_else(|| Error::not_found(JOB_NOT_FOUND))?;

		tracing::info!(%job_id, user_id, "Research job cancelled.");

		Ok(row.into())
	}

	pub async fn get_job(&self, user_id: &str, job_id: Uuid) -> Result<JobRecord> {
		let row = self
			.store
			.get_job(job_id, user_id)
			.await?
			.ok_or_else(|| Error::not_found(JOB_NOT_FOUND))?;

		Ok(row.into())
	}

	pub async fn list_jobs(&self, user_id: &str, req: ListJobsRequest) -> Result<ListJobsResponse> {
		let status = match params::non_blank(req.status) {
			Some(raw) => Some(
				raw.parse::<JobStatus>()
					.map_err(|err| Error::invalid(err.to_string()))?
					.as_str()
					.to_string(),
			),
			None => None,
		};
		let (limit, offset) = params::page(
			req.limit,
			req.offset,
			self.cfg.jobs.default_list_limit,
			self.cfg.jobs.max_list_limit,
		);
		let filter = JobFilter { user_id: user_id.to_string(), status, limit, offset };
		let (rows, count) = self.store.list_jobs(&filter).await?;

		Ok(ListJobsResponse { jobs: rows.into_iter().map(JobRecord::from).collect(), count })
	}
}

pub(crate) fn parse_job_id(raw: Option<String>) -> Result<Uuid> {
	params::require_uuid(raw, "job_id", JOB_NOT_FOUND)
}

pub(crate) fn parse_status(job_id: Uuid, raw: &str) -> Result<JobStatus> {
	raw.parse::<JobStatus>().map_err(|err| Error::Storage {
		message: format!("Job {job_id} has an unreadable status: {err}"),
	})
}
