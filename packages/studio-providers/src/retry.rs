//! Bounded retries with exponential backoff and additive jitter.
//!
//! The loop is explicit and sleeps through an injected [`Sleeper`], so tests can record delays
//! instead of waiting for them.

use std::{future::Future, time::Duration};

use rand::Rng;

use crate::{BoxFuture, Result, upstream::UpstreamResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
	pub max_attempts: u32,
	pub base_backoff: Duration,
	pub max_jitter: Duration,
}
impl RetryPolicy {
	pub fn from_config(cfg: &studio_config::UpstreamRetry) -> Self {
		Self {
			max_attempts: cfg.max_attempts.max(1),
			base_backoff: Duration::from_millis(cfg.base_backoff_ms),
			max_jitter: Duration::from_millis(cfg.max_jitter_ms),
		}
	}

	/// Delay before the retry that follows zero-based `attempt`: `base * 2^attempt + jitter`.
	pub fn backoff_delay(&self, attempt: u32, jitter: Duration) -> Duration {
		let factor = 2_u32.saturating_pow(attempt);

		self.base_backoff.saturating_mul(factor).saturating_add(jitter)
	}

	pub fn sample_jitter(&self) -> Duration {
		let max_ms = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);

		if max_ms == 0 {
			return Duration::ZERO;
		}

		Duration::from_millis(rand::rng().random_range(0..=max_ms))
	}
}

pub trait Sleeper
where
	Self: Send + Sync,
{
	fn sleep(&self, delay: Duration) -> BoxFuture<'_, ()>;
}

pub struct TokioSleeper;
impl Sleeper for TokioSleeper {
	fn sleep(&self, delay: Duration) -> BoxFuture<'_, ()> {
		Box::pin(tokio::time::sleep(delay))
	}
}

/// Runs `send` until an attempt is not retryable or the attempt budget is spent.
///
/// Transport errors and 5xx responses are retried. Any other response, including 4xx, is returned
/// as-is. After the final attempt the last error or response is returned without sleeping.
pub async fn run_with_retry<F, Fut>(
	policy: &RetryPolicy,
	sleeper: &dyn Sleeper,
	mut send: F,
) -> Result<UpstreamResponse>
where
	F: FnMut(u32) -> Fut,
	Fut: Future<Output = Result<UpstreamResponse>>,
{
	let attempts = policy.max_attempts.max(1);
	let mut attempt = 0;

	loop {
		let outcome = send(attempt).await;
		let retryable = match &outcome {
			Ok(response) => response.is_server_error(),
			Err(_) => true,
		};

		if !retryable || attempt + 1 >= attempts {
			return outcome;
		}

		let delay = policy.backoff_delay(attempt, policy.sample_jitter());

		match &outcome {
			Ok(response) => tracing::warn!(
				attempt = attempt + 1,
				status = response.status,
				delay_ms = delay.as_millis() as u64,
				"Upstream returned a server error. Retrying."
			),
			Err(err) => tracing::warn!(
				attempt = attempt + 1,
				error = %err,
				delay_ms = delay.as_millis() as u64,
				"Upstream request failed. Retrying."
			),
		}

		sleeper.sleep(delay).await;

		attempt += 1;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn policy(jitter_ms: u64) -> RetryPolicy {
		RetryPolicy {
			max_attempts: 3,
			base_backoff: Duration::from_millis(500),
			max_jitter: Duration::from_millis(jitter_ms),
		}
	}

	#[test]
	fn backoff_doubles_per_attempt() {
		let policy = policy(0);

		assert_eq!(policy.backoff_delay(0, Duration::ZERO), Duration::from_millis(500));
		assert_eq!(policy.backoff_delay(1, Duration::ZERO), Duration::from_millis(1_000));
		assert_eq!(
			policy.backoff_delay(2, Duration::from_millis(37)),
			Duration::from_millis(2_037)
		);
	}

	#[test]
	fn jitter_stays_within_bound() {
		let policy = policy(200);

		for _ in 0..256 {
			assert!(policy.sample_jitter() <= Duration::from_millis(200));
		}

		assert_eq!(self::policy(0).sample_jitter(), Duration::ZERO);
	}

	#[test]
	fn zero_attempts_in_config_still_tries_once() {
		let cfg =
			studio_config::UpstreamRetry { max_attempts: 0, base_backoff_ms: 1, max_jitter_ms: 0 };

		assert_eq!(RetryPolicy::from_config(&cfg).max_attempts, 1);
	}
}
