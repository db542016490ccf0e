use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub upstream: Upstream,
	pub quota: Quota,
	#[serde(default)]
	pub confidence: Confidence,
	#[serde(default)]
	pub jobs: Jobs,
	pub security: Security,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

/// The external research/generation provider.
///
/// Leaving `api_base` unset (or blank) disables the client entirely; every request then takes the
/// deterministic fallback path without attempting a call.
#[derive(Debug, Clone, Deserialize)]
pub struct Upstream {
	pub api_base: Option<String>,
	pub api_key: Option<String>,
	#[serde(default = "default_research_path")]
	pub research_path: String,
	#[serde(default = "default_generate_path")]
	pub generate_path: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
	#[serde(default)]
	pub retry: UpstreamRetry,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamRetry {
	pub max_attempts: u32,
	pub base_backoff_ms: u64,
	pub max_jitter_ms: u64,
}
impl Default for UpstreamRetry {
	fn default() -> Self {
		Self { max_attempts: 3, base_backoff_ms: 500, max_jitter_ms: 200 }
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Quota {
	#[serde(default = "default_window_hours")]
	pub window_hours: u32,
	pub research: QuotaLimit,
	pub generate: QuotaLimit,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuotaLimit {
	pub daily_limit: u32,
	/// Billing weight stored on each usage event of this kind.
	#[serde(default)]
	pub cost_units: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Confidence {
	pub floor: f32,
	pub research_default: f32,
	pub generate_default: f32,
}
impl Default for Confidence {
	fn default() -> Self {
		Self { floor: 0.5, research_default: 0.85, generate_default: 0.88 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Jobs {
	/// When false, cancelling a completed or failed job is rejected with a conflict.
	pub allow_cancel_terminal: bool,
	pub default_list_limit: u32,
	pub max_list_limit: u32,
}
impl Default for Jobs {
	fn default() -> Self {
		Self { allow_cancel_terminal: true, default_list_limit: 20, max_list_limit: 100 }
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
	/// One of `static_keys` or `remote`.
	pub auth_mode: String,
	#[serde(default)]
	pub auth_keys: Vec<SecurityAuthKey>,
	pub remote: Option<RemoteAuth>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityAuthKey {
	pub token: String,
	pub user_id: String,
}

/// Identity endpoint of the managed backend. A bearer token resolves to the `id` field of the
/// JSON user object it returns.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteAuth {
	pub api_base: String,
	#[serde(default = "default_remote_auth_path")]
	pub path: String,
	pub api_key: Option<String>,
	pub timeout_ms: u64,
}

fn default_research_path() -> String {
	"/research".to_string()
}

fn default_generate_path() -> String {
	"/generate".to_string()
}

fn default_window_hours() -> u32 {
	24
}

fn default_remote_auth_path() -> String {
	"/auth/v1/user".to_string()
}
