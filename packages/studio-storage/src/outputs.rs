use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Result, db::Db, models::GeneratedOutput, store::OutputFilter};

const OUTPUT_COLUMNS: &str = "\
output_id,
	user_id,
	job_id,
	output_type,
	content,
	confidence_score,
	approved,
	created_at,
	updated_at";

pub async fn insert_output(db: &Db, output: &GeneratedOutput) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO generated_outputs (
	output_id,
	user_id,
	job_id,
	output_type,
	content,
	confidence_score,
	approved,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
	)
	.bind(output.output_id)
	.bind(output.user_id.as_str())
	.bind(output.job_id)
	.bind(output.output_type.as_str())
	.bind(output.content.as_str())
	.bind(output.confidence_score)
	.bind(output.approved)
	.bind(output.created_at)
	.bind(output.updated_at)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn get_output(
	db: &Db,
	output_id: Uuid,
	user_id: &str,
) -> Result<Option<GeneratedOutput>> {
	let sql = format!(
		"\
SELECT
	{OUTPUT_COLUMNS}
FROM generated_outputs
WHERE output_id = $1 AND user_id = $2"
	);
	let row = sqlx::query_as::<_, GeneratedOutput>(&sql)
		.bind(output_id)
		.bind(user_id)
		.fetch_optional(&db.pool)
		.await?;

	Ok(row)
}

/// Unconditional; approving twice is harmless.
pub async fn approve_output(
	db: &Db,
	output_id: Uuid,
	user_id: &str,
	now: OffsetDateTime,
) -> Result<Option<GeneratedOutput>> {
	let sql = format!(
		"\
UPDATE generated_outputs
SET
	approved = true,
	updated_at = $3
WHERE output_id = $1 AND user_id = $2
RETURNING
	{OUTPUT_COLUMNS}"
	);
	let row = sqlx::query_as::<_, GeneratedOutput>(&sql)
		.bind(output_id)
		.bind(user_id)
		.bind(now)
		.fetch_optional(&db.pool)
		.await?;

	Ok(row)
}

pub async fn list_outputs(db: &Db, filter: &OutputFilter) -> Result<(Vec<GeneratedOutput>, i64)> {
	let total: i64 = sqlx::query_scalar(
		"\
SELECT count(*)
FROM generated_outputs
WHERE user_id = $1 AND ($2::uuid IS NULL OR job_id = $2)",
	)
	.bind(filter.user_id.as_str())
	.bind(filter.job_id)
	.fetch_one(&db.pool)
	.await?;
	let sql = format!(
		"\
SELECT
	{OUTPUT_COLUMNS}
FROM generated_outputs
WHERE user_id = $1 AND ($2::uuid IS NULL OR job_id = $2)
ORDER BY created_at DESC, output_id DESC
LIMIT $3
OFFSET $4"
	);
	let rows = sqlx::query_as::<_, GeneratedOutput>(&sql)
		.bind(filter.user_id.as_str())
		.bind(filter.job_id)
		.bind(filter.limit)
		.bind(filter.offset)
		.fetch_all(&db.pool)
		.await?;

	Ok((rows, total))
}
