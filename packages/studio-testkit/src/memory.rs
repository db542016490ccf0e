use std::{
	collections::HashSet,
	future,
	sync::{
		Mutex, MutexGuard,
		atomic::{AtomicBool, Ordering},
	},
};

use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use studio_storage::{
	BoxFuture, Error, JobFilter, OutputFilter, Result, Store,
	models::{GeneratedOutput, ResearchJob, UsageEvent},
};

/// A [`Store`] backed by process memory. Mirrors the Postgres queries closely enough for service
/// and HTTP tests, including owner matching and newest-first ordering.
#[derive(Default)]
pub struct MemoryStore {
	state: Mutex<State>,
	failing: AtomicBool,
	failing_ops: Mutex<HashSet<StoreOp>>,
}

/// One [`Store`] method, for targeted failure injection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreOp {
	InsertJob,
	CompleteJob,
	FailJob,
	CancelJob,
	GetJob,
	ListJobs,
	InsertOutput,
	GetOutput,
	ApproveOutput,
	ListOutputs,
	InsertUsage,
	CountUsage,
	ListUsage,
}

#[derive(Default)]
struct State {
	jobs: Vec<ResearchJob>,
	outputs: Vec<GeneratedOutput>,
	usage: Vec<UsageEvent>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// While set, every operation returns a storage error.
	pub fn set_failing(&self, failing: bool) {
		self.failing.store(failing, Ordering::SeqCst);
	}

	/// Makes only `op` return a storage error. Everything else keeps working.
	pub fn fail_on(&self, op: StoreOp) {
		self.failing_ops.lock().unwrap_or_else(|err| err.into_inner()).insert(op);
	}

	pub fn jobs(&self) -> Vec<ResearchJob> {
		self.state().jobs.clone()
	}

	pub fn outputs(&self) -> Vec<GeneratedOutput> {
		self.state().outputs.clone()
	}

	pub fn usage(&self) -> Vec<UsageEvent> {
		self.state().usage.clone()
	}

	fn state(&self) -> MutexGuard<'_, State> {
		self.state.lock().unwrap_or_else(|err| err.into_inner())
	}

	fn guard(&self, op: StoreOp) -> Result<MutexGuard<'_, State>> {
		let targeted = self.failing_ops.lock().unwrap_or_else(|err| err.into_inner()).contains(&op);

		if targeted || self.failing.load(Ordering::SeqCst) {
			return Err(Error::Sqlx(sqlx::Error::PoolTimedOut));
		}

		Ok(self.state())
	}

	/// Applies `apply` to the matching job. `owner` scopes the match to one user and
	/// `only_running` mirrors the `status = 'running'` guard on terminal writes.
	fn update_job<F>(
		&self,
		op: StoreOp,
		job_id: Uuid,
		owner: Option<&str>,
		only_running: bool,
		apply: F,
	) -> Result<Option<ResearchJob>>
	where
		F: FnOnce(&mut ResearchJob),
	{
		let mut state = self.guard(op)?;
		let Some(job) = state.jobs.iter_mut().find(|job| {
			job.job_id == job_id
				&& owner.is_none_or(|owner| job.user_id == owner)
				&& (!only_running || job.status == "running")
		}) else {
			return Ok(None);
		};

		apply(job);

		Ok(Some(job.clone()))
	}
}

impl Store for MemoryStore {
	fn insert_job<'a>(&'a self, job: &'a ResearchJob) -> BoxFuture<'a, Result<()>> {
		let result =
			self.guard(StoreOp::InsertJob).map(|mut state| state.jobs.push(job.clone()));

		Box::pin(future::ready(result))
	}

	fn complete_job<'a>(
		&'a self,
		job_id: Uuid,
		output_text: &'a str,
		sources: &'a Value,
		metadata: &'a Value,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Option<ResearchJob>>> {
		let result = self.update_job(StoreOp::CompleteJob, job_id, None, true, |job| {
			job.status = "completed".to_string();
			job.progress = 100;
			job.output_text = Some(output_text.to_string());
			job.sources = sources.clone();
			merge_metadata(&mut job.metadata, metadata);
			job.updated_at = now;
		});

		Box::pin(future::ready(result))
	}

	fn fail_job<'a>(
		&'a self,
		job_id: Uuid,
		metadata: &'a Value,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Option<ResearchJob>>> {
		let result = self.update_job(StoreOp::FailJob, job_id, None, true, |job| {
			job.status = "failed".to_string();
			merge_metadata(&mut job.metadata, metadata);
			job.updated_at = now;
		});

		Box::pin(future::ready(result))
	}

	fn cancel_job<'a>(
		&'a self,
		job_id: Uuid,
		user_id: &'a str,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Option<ResearchJob>>> {
		let result = self.update_job(StoreOp::CancelJob, job_id, Some(user_id), false, |job| {
			job.status = "cancelled".to_string();
			job.updated_at = now;
		});

		Box::pin(future::ready(result))
	}

	fn get_job<'a>(
		&'a self,
		job_id: Uuid,
		user_id: &'a str,
	) -> BoxFuture<'a, Result<Option<ResearchJob>>> {
		let result = self.guard(StoreOp::GetJob).map(|state| {
			state.jobs.iter().find(|job| job.job_id == job_id && job.user_id == user_id).cloned()
		});

		Box::pin(future::ready(result))
	}

	fn list_jobs<'a>(
		&'a self,
		filter: &'a JobFilter,
	) -> BoxFuture<'a, Result<(Vec<ResearchJob>, i64)>> {
		let result = self.guard(StoreOp::ListJobs).map(|state| {
			let mut matching = state
				.jobs
				.iter()
				.filter(|job| job.user_id == filter.user_id)
				.filter(|job| filter.status.as_deref().is_none_or(|status| job.status == status))
				.cloned()
				.collect::<Vec<_>>();

			matching.sort_by(|a, b| {
				b.created_at.cmp(&a.created_at).then_with(|| b.job_id.cmp(&a.job_id))
			});

			page(matching, filter.limit, filter.offset)
		});

		Box::pin(future::ready(result))
	}

	fn insert_output<'a>(&'a self, output: &'a GeneratedOutput) -> BoxFuture<'a, Result<()>> {
		let result =
			self.guard(StoreOp::InsertOutput).map(|mut state| state.outputs.push(output.clone()));

		Box::pin(future::ready(result))
	}

	fn get_output<'a>(
		&'a self,
		output_id: Uuid,
		user_id: &'a str,
	) -> BoxFuture<'a, Result<Option<GeneratedOutput>>> {
		let result = self.guard(StoreOp::GetOutput).map(|state| {
			state
				.outputs
				.iter()
				.find(|output| output.output_id == output_id && output.user_id == user_id)
				.cloned()
		});

		Box::pin(future::ready(result))
	}

	fn approve_output<'a>(
		&'a self,
		output_id: Uuid,
		user_id: &'a str,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Option<GeneratedOutput>>> {
		let result = self.guard(StoreOp::ApproveOutput).map(|mut state| {
			state
				.outputs
				.iter_mut()
				.find(|output| output.output_id == output_id && output.user_id == user_id)
				.map(|output| {
					output.approved = true;
					output.updated_at = now;

					output.clone()
				})
		});

		Box::pin(future::ready(result))
	}

	fn list_outputs<'a>(
		&'a self,
		filter: &'a OutputFilter,
	) -> BoxFuture<'a, Result<(Vec<GeneratedOutput>, i64)>> {
		let result = self.guard(StoreOp::ListOutputs).map(|state| {
			let mut matching = state
				.outputs
				.iter()
				.filter(|output| output.user_id == filter.user_id)
				.filter(|output| filter.job_id.is_none_or(|job_id| output.job_id == Some(job_id)))
				.cloned()
				.collect::<Vec<_>>();

			matching.sort_by(|a, b| {
				b.created_at.cmp(&a.created_at).then_with(|| b.output_id.cmp(&a.output_id))
			});

			page(matching, filter.limit, filter.offset)
		});

		Box::pin(future::ready(result))
	}

	fn insert_usage<'a>(&'a self, event: &'a UsageEvent) -> BoxFuture<'a, Result<()>> {
		let result =
			self.guard(StoreOp::InsertUsage).map(|mut state| state.usage.push(event.clone()));

		Box::pin(future::ready(result))
	}

	fn count_usage_since<'a>(
		&'a self,
		user_id: &'a str,
		operation: &'a str,
		since: OffsetDateTime,
	) -> BoxFuture<'a, Result<i64>> {
		let result = self.guard(StoreOp::CountUsage).map(|state| {
			state
				.usage
				.iter()
				.filter(|event| {
					event.user_id == user_id
						&& event.operation == operation
						&& event.created_at >= since
				})
				.count() as i64
		});

		Box::pin(future::ready(result))
	}

	fn list_usage_since<'a>(
		&'a self,
		user_id: &'a str,
		since: OffsetDateTime,
	) -> BoxFuture<'a, Result<Vec<UsageEvent>>> {
		let result = self.guard(StoreOp::ListUsage).map(|state| {
			let mut rows = state
				.usage
				.iter()
				.filter(|event| event.user_id == user_id && event.created_at >= since)
				.cloned()
				.collect::<Vec<_>>();

			rows.sort_by(|a, b| {
				b.created_at.cmp(&a.created_at).then_with(|| b.usage_id.cmp(&a.usage_id))
			});

			rows
		});

		Box::pin(future::ready(result))
	}
}

fn page<T>(rows: Vec<T>, limit: i64, offset: i64) -> (Vec<T>, i64) {
	let total = rows.len() as i64;
	let offset = usize::try_from(offset).unwrap_or(0);
	let limit = usize::try_from(limit).unwrap_or(0);

	(rows.into_iter().skip(offset).take(limit).collect(), total)
}

// Shallow merge, matching Postgres `jsonb || jsonb` for two objects.
fn merge_metadata(target: &mut Value, patch: &Value) {
	match (target.as_object_mut(), patch.as_object()) {
		(Some(target), Some(patch)) =>
			for (key, value) in patch {
				target.insert(key.clone(), value.clone());
			},
		_ => *target = patch.clone(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn page_clamps_to_available_rows() {
		let (rows, total) = page(vec![1, 2, 3], 10, 2);

		assert_eq!(rows, vec![3]);
		assert_eq!(total, 3);
	}

	#[test]
	fn metadata_merge_keeps_existing_keys() {
		let mut target = serde_json::json!({ "a": 1 });

		merge_metadata(&mut target, &serde_json::json!({ "b": 2 }));

		assert_eq!(target, serde_json::json!({ "a": 1, "b": 2 }));
	}
}
