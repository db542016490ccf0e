use time::OffsetDateTime;

use crate::{Result, db::Db, models::UsageEvent};

pub async fn insert_usage(db: &Db, event: &UsageEvent) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO usage_events (
	usage_id,
	user_id,
	operation,
	job_id,
	tokens_used,
	api_calls,
	cost_units,
	created_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
	)
	.bind(event.usage_id)
	.bind(event.user_id.as_str())
	.bind(event.operation.as_str())
	.bind(event.job_id)
	.bind(event.tokens_used)
	.bind(event.api_calls)
	.bind(event.cost_units)
	.bind(event.created_at)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn count_usage_since(
	db: &Db,
	user_id: &str,
	operation: &str,
	since: OffsetDateTime,
) -> Result<i64> {
	let count: i64 = sqlx::query_scalar(
		"\
SELECT count(*)
FROM usage_events
WHERE user_id = $1 AND operation = $2 AND created_at >= $3",
	)
	.bind(user_id)
	.bind(operation)
	.bind(since)
	.fetch_one(&db.pool)
	.await?;

	Ok(count)
}

/// Every operation kind, newest first.
pub async fn list_usage_since(
	db: &Db,
	user_id: &str,
	since: OffsetDateTime,
) -> Result<Vec<UsageEvent>> {
	let rows = sqlx::query_as::<_, UsageEvent>(
		"\
SELECT
	usage_id,
	user_id,
	operation,
	job_id,
	tokens_used,
	api_calls,
	cost_units,
	created_at
FROM usage_events
WHERE user_id = $1 AND created_at >= $2
ORDER BY created_at DESC, usage_id DESC",
	)
	.bind(user_id)
	.bind(since)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}
