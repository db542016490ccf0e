//! The persistence seam used by the service layer.
//!
//! [`Db`] is the production implementation. Tests swap in an in-memory store so the pipeline can
//! run without Postgres.

use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	BoxFuture, Result,
	db::Db,
	jobs,
	models::{GeneratedOutput, ResearchJob, UsageEvent},
	outputs, usage,
};

#[derive(Debug, Clone)]
pub struct JobFilter {
	pub user_id: String,
	pub status: Option<String>,
	pub limit: i64,
	pub offset: i64,
}

#[derive(Debug, Clone)]
pub struct OutputFilter {
	pub user_id: String,
	pub job_id: Option<Uuid>,
	pub limit: i64,
	pub offset: i64,
}

/// Row-level operations. Every lookup or mutation that takes a `user_id` matches on it, so a row
/// owned by someone else is indistinguishable from a missing one.
pub trait Store
where
	Self: Send + Sync,
{
	fn insert_job<'a>(&'a self, job: &'a ResearchJob) -> BoxFuture<'a, Result<()>>;

	fn complete_job<'a>(
		&'a self,
		job_id: Uuid,
		output_text: &'a str,
		sources: &'a Value,
		metadata: &'a Value,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Option<ResearchJob>>>;

	fn fail_job<'a>(
		&'a self,
		job_id: Uuid,
		metadata: &'a Value,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Option<ResearchJob>>>;

	fn cancel_job<'a>(
		&'a self,
		job_id: Uuid,
		user_id: &'a str,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Option<ResearchJob>>>;

	fn get_job<'a>(
		&'a self,
		job_id: Uuid,
		user_id: &'a str,
	) -> BoxFuture<'a, Result<Option<ResearchJob>>>;

	fn list_jobs<'a>(
		&'a self,
		filter: &'a JobFilter,
	) -> BoxFuture<'a, Result<(Vec<ResearchJob>, i64)>>;

	fn insert_output<'a>(&'a self, output: &'a GeneratedOutput) -> BoxFuture<'a, Result<()>>;

	fn get_output<'a>(
		&'a self,
		output_id: Uuid,
		user_id: &'a str,
	) -> BoxFuture<'a, Result<Option<GeneratedOutput>>>;

	fn approve_output<'a>(
		&'a self,
		output_id: Uuid,
		user_id: &'a str,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Option<GeneratedOutput>>>;

	fn list_outputs<'a>(
		&'a self,
		filter: &'a OutputFilter,
	) -> BoxFuture<'a, Result<(Vec<GeneratedOutput>, i64)>>;

	fn insert_usage<'a>(&'a self, event: &'a UsageEvent) -> BoxFuture<'a, Result<()>>;

	fn count_usage_since<'a>(
		&'a self,
		user_id: &'a str,
		operation: &'a str,
		since: OffsetDateTime,
	) -> BoxFuture<'a, Result<i64>>;

	fn list_usage_since<'a>(
		&'a self,
		user_id: &'a str,
		since: OffsetDateTime,
	) -> BoxFuture<'a, Result<Vec<UsageEvent>>>;
}

impl Store for Db {
	fn insert_job<'a>(&'a self, job: &'a ResearchJob) -> BoxFuture<'a, Result<()>> {
		Box::pin(jobs::insert_job(self, job))
	}

	fn complete_job<'a>(
		&'a self,
		job_id: Uuid,
		output_text: &'a str,
		sources: &'a Value,
		metadata: &'a Value,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Option<ResearchJob>>> {
		Box::pin(jobs::complete_job(self, job_id, output_text, sources, metadata, now))
	}

	fn fail_job<'a>(
		&'a self,
		job_id: Uuid,
		metadata: &'a Value,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Option<ResearchJob>>> {
		Box::pin(jobs::fail_job(self, job_id, metadata, now))
	}

	fn cancel_job<'a>(
		&'a self,
		job_id: Uuid,
		user_id: &'a str,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Option<ResearchJob>>> {
		Box::pin(jobs::cancel_job(self, job_id, user_id, now))
	}

	fn get_job<'a>(
		&'a self,
		job_id: Uuid,
		user_id: &'a str,
	) -> BoxFuture<'a, Result<Option<ResearchJob>>> {
		Box::pin(jobs::get_job(self, job_id, user_id))
	}

	fn list_jobs<'a>(
		&'a self,
		filter: &'a JobFilter,
	) -> BoxFuture<'a, Result<(Vec<ResearchJob>, i64)>> {
		Box::pin(jobs::list_jobs(self, filter))
	}

	fn insert_output<'a>(&'a self, output: &'a GeneratedOutput) -> BoxFuture<'a, Result<()>> {
		Box::pin(outputs::insert_output(self, output))
	}

	fn get_output<'a>(
		&'a self,
		output_id: Uuid,
		user_id: &'a str,
	) -> BoxFuture<'a, Result<Option<GeneratedOutput>>> {
		Box::pin(outputs::get_output(self, output_id, user_id))
	}

	fn approve_output<'a>(
		&'a self,
		output_id: Uuid,
		user_id: &'a str,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Option<GeneratedOutput>>> {
		Box::pin(outputs::approve_output(self, output_id, user_id, now))
	}

	fn list_outputs<'a>(
		&'a self,
		filter: &'a OutputFilter,
	) -> BoxFuture<'a, Result<(Vec<GeneratedOutput>, i64)>> {
		Box::pin(outputs::list_outputs(self, filter))
	}

	fn insert_usage<'a>(&'a self, event: &'a UsageEvent) -> BoxFuture<'a, Result<()>> {
		Box::pin(usage::insert_usage(self, event))
	}

	fn count_usage_since<'a>(
		&'a self,
		user_id: &'a str,
		operation: &'a str,
		since: OffsetDateTime,
	) -> BoxFuture<'a, Result<i64>> {
		Box::pin(usage::count_usage_since(self, user_id, operation, since))
	}

	fn list_usage_since<'a>(
		&'a self,
		user_id: &'a str,
		since: OffsetDateTime,
	) -> BoxFuture<'a, Result<Vec<UsageEvent>>> {
		Box::pin(usage::list_usage_since(self, user_id, since))
	}
}
