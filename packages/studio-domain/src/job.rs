use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Persisted research-job state.
///
/// `Pending` is a valid stored and filterable value, but the research path creates jobs directly
/// in `Running`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
	Pending,
	Running,
	Completed,
	Failed,
	Cancelled,
}
impl JobStatus {
	pub const ALL: [&'static str; 5] = ["pending", "running", "completed", "failed", "cancelled"];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Pending => "pending",
			Self::Running => "running",
			Self::Completed => "completed",
			Self::Failed => "failed",
			Self::Cancelled => "cancelled",
		}
	}

	pub fn is_terminal(self) -> bool {
		matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
	}

	/// Whether the lifecycle permits moving from `self` to `to`.
	pub fn can_transition(self, to: Self) -> bool {
		match (self, to) {
			(Self::Pending, Self::Running) => true,
			(Self::Running, Self::Completed | Self::Failed) => true,
			(Self::Pending | Self::Running, Self::Cancelled) => true,
			_ => false,
		}
	}

	/// Cancellation check. With `allow_terminal`, any state may be cancelled; otherwise only
	/// in-flight jobs can be, and re-cancelling is a no-op that is still accepted.
	pub fn can_cancel(self, allow_terminal: bool) -> bool {
		allow_terminal || self == Self::Cancelled || self.can_transition(Self::Cancelled)
	}
}
impl fmt::Display for JobStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for JobStatus {
	type Err = ParseStatusError;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw {
			"pending" => Ok(Self::Pending),
			"running" => Ok(Self::Running),
			"completed" => Ok(Self::Completed),
			"failed" => Ok(Self::Failed),
			"cancelled" => Ok(Self::Cancelled),
			other => Err(ParseStatusError { raw: other.to_string() }),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError {
	pub raw: String,
}
impl fmt::Display for ParseStatusError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "status {:?} must be one of: {}", self.raw, JobStatus::ALL.join(", "))
	}
}

impl std::error::Error for ParseStatusError {}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn running_finishes_once() {
		assert!(JobStatus::Running.can_transition(JobStatus::Completed));
		assert!(JobStatus::Running.can_transition(JobStatus::Failed));
		assert!(!JobStatus::Completed.can_transition(JobStatus::Failed));
		assert!(!JobStatus::Completed.can_transition(JobStatus::Running));
	}

	#[test]
	fn strict_cancel_only_from_in_flight_states() {
		assert!(JobStatus::Running.can_cancel(false));
		assert!(JobStatus::Pending.can_cancel(false));
		assert!(JobStatus::Cancelled.can_cancel(false));
		assert!(!JobStatus::Completed.can_cancel(false));
		assert!(!JobStatus::Failed.can_cancel(false));
		assert!(JobStatus::Completed.can_cancel(true));
	}
}
