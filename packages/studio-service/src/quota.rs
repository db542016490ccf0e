//! Per-user rolling-window quotas.
//!
//! Counts come from the append-only `usage_events` ledger at check time. Nothing is reserved
//! between [`QuotaLedger::check`] and [`QuotaLedger::record`], so concurrent requests from one
//! user can each pass the check and overshoot the cap slightly. That race is accepted; keep both
//! halves in this type so it stays in one place.

use std::sync::Arc;

use serde::Serialize;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use studio_config::{Quota, QuotaLimit};
use studio_domain::OperationKind;
use studio_storage::{Store, models::UsageEvent};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotaDecision {
	pub allowed: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageRecord {
	pub usage_id: Uuid,
	pub operation: String,
	pub job_id: Option<Uuid>,
	pub tokens_used: i64,
	pub api_calls: i32,
	pub cost_units: f64,
	#[serde(with = "crate::timestamp")]
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageSummary {
	pub api_calls_24h: i64,
	pub tokens_used_24h: i64,
	pub cost_units_24h: f64,
	pub records: Vec<UsageRecord>,
}

pub struct QuotaLedger {
	cfg: Quota,
	store: Arc<dyn Store>,
}
impl QuotaLedger {
	pub fn new(cfg: Quota, store: Arc<dyn Store>) -> Self {
		Self { cfg, store }
	}

	pub async fn check(&self, user_id: &str, operation: OperationKind) -> Result<QuotaDecision> {
		let since = self.window_start(OffsetDateTime::now_utc());
		let used = self.store.count_usage_since(user_id, operation.as_str(), since).await?;
		let limit = self.limit(operation).daily_limit;

		if used >= i64::from(limit) {
			return Ok(QuotaDecision {
				allowed: false,
				reason: Some(format!("Daily {} quota ({limit}) exceeded", operation.label())),
			});
		}

		Ok(QuotaDecision { allowed: true, reason: None })
	}

	/// Like [`Self::check`], but a denial becomes [`Error::QuotaExceeded`].
	pub async fn ensure_allowed(&self, user_id: &str, operation: OperationKind) -> Result<()> {
		let decision = self.check(user_id, operation).await?;

		if decision.allowed {
			return Ok(());
		}

		let message = decision.reason.unwrap_or_else(|| "Quota exceeded".to_string());

		tracing::info!(user_id, operation = operation.as_str(), "Quota denied.");

		Err(Error::QuotaExceeded { message })
	}

	/// Appends one usage event. Call only after the operation produced its result.
	pub async fn record(
		&self,
		user_id: &str,
		operation: OperationKind,
		tokens_used: usize,
		job_id: Option<Uuid>,
	) -> Result<()> {
		let event = UsageEvent {
			usage_id: Uuid::new_v4(),
			user_id: user_id.to_string(),
			operation: operation.as_str().to_string(),
			job_id,
			tokens_used: i64::try_from(tokens_used).unwrap_or(i64::MAX),
			api_calls: 1,
			cost_units: self.limit(operation).cost_units,
			created_at: OffsetDateTime::now_utc(),
		};

		self.store.insert_usage(&event).await?;

		Ok(())
	}

	/// Totals across every operation kind inside the window, newest record first.
	pub async fn usage_summary(&self, user_id: &str) -> Result<UsageSummary> {
		let since = self.window_start(OffsetDateTime::now_utc());
		let rows = self.store.list_usage_since(user_id, since).await?;
		let api_calls_24h = rows.iter().map(|row| i64::from(row.api_calls)).sum();
		let tokens_used_24h = rows.iter().map(|row| row.tokens_used).sum();
		let cost_units_24h = rows.iter().map(|row| row.cost_units).sum();
		let records = rows
			.into_iter()
			.map(|row| UsageRecord {
				usage_id: row.usage_id,
				operation: row.operation,
				job_id: row.job_id,
				tokens_used: row.tokens_used,
				api_calls: row.api_calls,
				cost_units: row.cost_units,
				created_at: row.created_at,
			})
			.collect();

		Ok(UsageSummary { api_calls_24h, tokens_used_24h, cost_units_24h, records })
	}

	fn limit(&self, operation: OperationKind) -> &QuotaLimit {
		match operation {
			OperationKind::Research => &self.cfg.research,
			OperationKind::Generate => &self.cfg.generate,
		}
	}

	fn window_start(&self, now: OffsetDateTime) -> OffsetDateTime {
		now - Duration::hours(i64::from(self.cfg.window_hours))
	}
}
