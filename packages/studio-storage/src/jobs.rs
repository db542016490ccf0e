use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Result, db::Db, models::ResearchJob, store::JobFilter};

const JOB_COLUMNS: &str = "\
job_id,
	user_id,
	agent_id,
	content_item_id,
	query,
	output_type,
	status,
	progress,
	output_text,
	sources,
	metadata,
	created_at,
	updated_at";

pub async fn insert_job(db: &Db, job: &ResearchJob) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO research_jobs (
	job_id,
	user_id,
	agent_id,
	content_item_id,
	query,
	output_type,
	status,
	progress,
	output_text,
	sources,
	metadata,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
	)
	.bind(job.job_id)
	.bind(job.user_id.as_str())
	.bind(job.agent_id.as_deref())
	.bind(job.content_item_id.as_deref())
	.bind(job.query.as_str())
	.bind(job.output_type.as_str())
	.bind(job.status.as_str())
	.bind(job.progress)
	.bind(job.output_text.as_deref())
	.bind(&job.sources)
	.bind(&job.metadata)
	.bind(job.created_at)
	.bind(job.updated_at)
	.execute(&db.pool)
	.await?;

	Ok(())
}

/// Writes every completion field in one statement so no reader sees a half-finished job.
///
/// Only a `running` row is touched. `None` means the job is gone or already left `running`, for
/// example because it was cancelled while the upstream call was in flight.
pub async fn complete_job(
	db: &Db,
	job_id: Uuid,
	output_text: &str,
	sources: &Value,
	metadata: &Value,
	now: OffsetDateTime,
) -> Result<Option<ResearchJob>> {
	let sql = format!(
		"\
UPDATE research_jobs
SET
	status = 'completed',
	progress = 100,
	output_text = $2,
	sources = $3,
	metadata = metadata || $4,
	updated_at = $5
WHERE job_id = $1 AND status = 'running'
RETURNING
	{JOB_COLUMNS}"
	);
	let row = sqlx::query_as::<_, ResearchJob>(&sql)
		.bind(job_id)
		.bind(output_text)
		.bind(sources)
		.bind(metadata)
		.bind(now)
		.fetch_optional(&db.pool)
		.await?;

	Ok(row)
}

/// Like [`complete_job`], leaves rows outside `running` alone.
pub async fn fail_job(
	db: &Db,
	job_id: Uuid,
	metadata: &Value,
	now: OffsetDateTime,
) -> Result<Option<ResearchJob>> {
	let sql = format!(
		"\
UPDATE research_jobs
SET
	status = 'failed',
	metadata = metadata || $2,
	updated_at = $3
WHERE job_id = $1 AND status = 'running'
RETURNING
	{JOB_COLUMNS}"
	);
	let row = sqlx::query_as::<_, ResearchJob>(&sql)
		.bind(job_id)
		.bind(metadata)
		.bind(now)
		.fetch_optional(&db.pool)
		.await?;

	Ok(row)
}

pub async fn cancel_job(
	db: &Db,
	job_id: Uuid,
	user_id: &str,
	now: OffsetDateTime,
) -> Result<Option<ResearchJob>> {
	let sql = format!(
		"\
UPDATE research_jobs
SET
	status = 'cancelled',
	updated_at = $3
WHERE job_id = $1 AND user_id = $2
RETURNING
	{JOB_COLUMNS}"
	);
	let row = sqlx::query_as::<_, ResearchJob>(&sql)
		.bind(job_id)
		.bind(user_id)
		.bind(now)
		.fetch_optional(&db.pool)
		.await?;

	Ok(row)
}

pub async fn get_job(db: &Db, job_id: Uuid, user_id: &str) -> Result<Option<ResearchJob>> {
	let sql = format!(
		"\
SELECT
	{JOB_COLUMNS}
FROM research_jobs
WHERE job_id = $1 AND user_id = $2"
	);
	let row = sqlx::query_as::<_, ResearchJob>(&sql)
		.bind(job_id)
		.bind(user_id)
		.fetch_optional(&db.pool)
		.await?;

	Ok(row)
}

/// Returns one page of the caller's jobs, newest first, with the total matching count.
pub async fn list_jobs(db: &Db, filter: &JobFilter) -> Result<(Vec<ResearchJob>, i64)> {
	let total: i64 = sqlx::query_scalar(
		"\
SELECT count(*)
FROM research_jobs
WHERE user_id = $1 AND ($2::text IS NULL OR status = $2)",
	)
	.bind(filter.user_id.as_str())
	.bind(filter.status.as_deref())
	.fetch_one(&db.pool)
	.await?;
	let sql = format!(
		"\
SELECT
	{JOB_COLUMNS}
FROM research_jobs
WHERE user_id = $1 AND ($2::text IS NULL OR status = $2)
ORDER BY created_at DESC, job_id DESC
LIMIT $3
OFFSET $4"
	);
	let rows = sqlx::query_as::<_, ResearchJob>(&sql)
		.bind(filter.user_id.as_str())
		.bind(filter.status.as_deref())
		.bind(filter.limit)
		.bind(filter.offset)
		.fetch_all(&db.pool)
		.await?;

	Ok((rows, total))
}
