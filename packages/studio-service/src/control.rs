//! The action-dispatched job control surface: usage, get, cancel and list behind one entry point.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
	Error, Result, StudioService, UsageSummary,
	jobs::{self, JobRecord, ListJobsRequest, ListJobsResponse},
};

const INVALID_ACTION: &str = "Invalid action or method";

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum JobControl {
	Usage,
	Get {
		#[serde(default)]
		job_id: Option<String>,
	},
	Cancel {
		#[serde(default)]
		job_id: Option<String>,
	},
	List(ListJobsRequest),
}
impl JobControl {
	/// Parses a request body or query map. Unknown or missing actions are rejected with one message.
	pub fn from_value(value: Value) -> Result<Self> {
		serde_json::from_value(value).map_err(|_| Error::invalid(INVALID_ACTION))
	}

	/// Actions that change state. These must not be reachable through a safe method.
	pub fn is_mutating(&self) -> bool {
		matches!(self, Self::Cancel { .. })
	}

	pub fn invalid_method() -> Error {
		Error::invalid(INVALID_ACTION)
	}
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum JobControlResponse {
	Usage(UsageSummary),
	Job { job: JobRecord },
	Cancelled { success: bool, job: JobRecord, message: String },
	List(ListJobsResponse),
}

impl StudioService {
	pub async fn job_control(&self, user_id: &str, action: JobControl) -> Result<JobControlResponse> {
		match action {
			JobControl::Usage => Ok(JobControlResponse::Usage(self.quota.usage_summary(user_id).await?)),
			JobControl::Get { job_id } => {
				let job = self.get_job(user_id, jobs::parse_job_id(job_id)?).await?;

				Ok(JobControlResponse::Job { job })
			},
			JobControl::Cancel { job_id } => {
				let job = self.cancel_job(user_id, jobs::parse_job_id(job_id)?).await?;

				Ok(JobControlResponse::Cancelled {
					success: true,
					job,
					message: "Job cancelled".to_string(),
				})
			},
			JobControl::List(req) => Ok(JobControlResponse::List(self.list_jobs(user_id, req).await?)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn query_maps_parse_into_actions() {
		let list = JobControl::from_value(serde_json::json!({
			"action": "list",
			"limit": "500",
			"status": "completed",
		}))
		.expect("list parses");

		match list {
			JobControl::List(req) => {
				assert_eq!(req.limit, Some(500));
				assert_eq!(req.status.as_deref(), Some("completed"));
			},
			other => panic!("Unexpected action: {other:?}"),
		}

		let get = JobControl::from_value(serde_json::json!({ "action": "get" })).expect("get parses");

		assert!(matches!(get, JobControl::Get { job_id: None }));
		assert!(!get.is_mutating());

		let usage = JobControl::from_value(serde_json::json!({ "action": "usage", "extra": "1" }))
			.expect("usage parses");

		assert!(matches!(usage, JobControl::Usage));
	}

	#[test]
	fn unknown_or_missing_actions_are_rejected() {
		for value in [serde_json::json!({ "action": "delete" }), serde_json::json!({})] {
			let err = JobControl::from_value(value).expect_err("rejected");

			assert_eq!(err.to_string(), "Invalid request: Invalid action or method");
		}
	}

	#[test]
	fn cancel_is_the_only_mutating_action() {
		let cancel = JobControl::from_value(serde_json::json!({ "action": "cancel", "job_id": "x" }))
			.expect("cancel parses");

		assert!(cancel.is_mutating());
	}
}
