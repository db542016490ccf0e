use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ResearchJob {
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
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GeneratedOutput {
	pub output_id: Uuid,
	pub user_id: String,
	/// Weak back-reference. The job may be gone or never have existed.
	pub job_id: Option<Uuid>,
	pub output_type: String,
	pub content: String,
	pub confidence_score: Option<f32>,
	pub approved: bool,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

/// Append-only ledger row. Never updated or deleted.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UsageEvent {
	pub usage_id: Uuid,
	pub user_id: String,
	pub operation: String,
	pub job_id: Option<Uuid>,
	pub tokens_used: i64,
	pub api_calls: i32,
	pub cost_units: f64,
	pub created_at: OffsetDateTime,
}
