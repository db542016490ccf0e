use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use studio_config::{Config, Error, RemoteAuth};

const SAMPLE_CONFIG_TOML: &str = include_str!("fixtures/sample_config.toml");

fn sample_toml_with(section: &str, key: &str, value: Value) -> String {
	let mut root: Value = toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");
	let mut table = root.as_table_mut().expect("Sample config must be a table.");

	for part in section.split('.') {
		table = table
			.get_mut(part)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Sample config must include [{section}]."));
	}

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render sample config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("studio_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse test config.")
}

fn load_payload(payload: String) -> studio_config::Result<Config> {
	let path = write_temp_config(payload);
	let result = studio_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

#[test]
fn sample_config_loads_and_normalizes() {
	let cfg = load_payload(SAMPLE_CONFIG_TOML.to_string()).expect("Sample config must load.");

	assert_eq!(cfg.upstream.api_base.as_deref(), Some("https://upstream.example.com/v1"));
	assert_eq!(cfg.upstream.api_key, None);
	assert_eq!(cfg.upstream.research_path, "/research");
	assert_eq!(cfg.upstream.generate_path, "/generate");
	assert_eq!(cfg.quota.research.daily_limit, 50);
	assert_eq!(cfg.quota.generate.daily_limit, 100);
	assert_eq!(cfg.security.auth_keys.len(), 2);
}

#[test]
fn blank_upstream_base_disables_client() {
	let payload = sample_toml_with("upstream", "api_base", Value::String("   ".to_string()));
	let cfg = load_payload(payload).expect("Blank api_base must be accepted.");

	assert!(cfg.upstream.api_base.is_none());
}

#[test]
fn omitted_sections_use_defaults() {
	let mut root: Value = toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse config.");
	let table = root.as_table_mut().expect("Sample config must be a table.");

	table.remove("confidence");
	table.remove("jobs");

	let cfg = load_payload(toml::to_string(&root).expect("Failed to render config."))
		.expect("Defaults must validate.");

	assert_eq!(cfg.confidence.floor, 0.5);
	assert_eq!(cfg.confidence.research_default, 0.85);
	assert_eq!(cfg.confidence.generate_default, 0.88);
	assert!(cfg.jobs.allow_cancel_terminal);
	assert_eq!(cfg.jobs.max_list_limit, 100);
	assert_eq!(cfg.jobs.default_list_limit, 20);
}

#[test]
fn quota_limits_must_be_positive() {
	let payload = sample_toml_with("quota.generate", "daily_limit", Value::Integer(0));
	let err = load_payload(payload).expect_err("Expected quota validation error.");

	assert!(
		err.to_string().contains("quota.generate.daily_limit must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn retry_attempts_must_be_positive() {
	let mut cfg = base_config();

	cfg.upstream.retry.max_attempts = 0;

	let err = studio_config::validate(&cfg).expect_err("Expected retry validation error.");

	assert!(
		err.to_string().contains("upstream.retry.max_attempts must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn confidence_defaults_must_respect_floor() {
	let mut cfg = base_config();

	cfg.confidence.research_default = 0.3;

	let err = studio_config::validate(&cfg).expect_err("Expected confidence validation error.");

	assert!(matches!(err, Error::Validation { ref field, .. } if field == "confidence.research_default"));
}

#[test]
fn default_list_limit_must_not_exceed_max() {
	let mut cfg = base_config();

	cfg.jobs.default_list_limit = 150;

	let err = studio_config::validate(&cfg).expect_err("Expected list limit validation error.");

	assert!(
		err.to_string().contains("jobs.default_list_limit must be between 1 and jobs.max_list_limit."),
		"Unexpected error: {err}"
	);
}

#[test]
fn static_keys_must_be_unique() {
	let mut cfg = base_config();
	let duplicate = cfg.security.auth_keys[0].clone();

	cfg.security.auth_keys.push(duplicate);

	let err = studio_config::validate(&cfg).expect_err("Expected duplicate token error.");

	assert!(err.to_string().contains("tokens must be unique."), "Unexpected error: {err}");
}

#[test]
fn remote_auth_requires_remote_section() {
	let mut cfg = base_config();

	cfg.security.auth_mode = "remote".to_string();

	let err = studio_config::validate(&cfg).expect_err("Expected remote auth error.");

	assert!(
		err.to_string().contains("security.remote is required when security.auth_mode is remote."),
		"Unexpected error: {err}"
	);

	cfg.security.remote = Some(RemoteAuth {
		api_base: "https://backend.example.com".to_string(),
		path: "/auth/v1/user".to_string(),
		api_key: None,
		timeout_ms: 5_000,
	});

	assert!(studio_config::validate(&cfg).is_ok());
}

#[test]
fn unknown_auth_mode_is_rejected() {
	let payload = sample_toml_with("security", "auth_mode", Value::String("off".to_string()));
	let err = load_payload(payload).expect_err("Expected auth mode error.");

	assert!(
		err.to_string().contains("security.auth_mode must be one of static_keys or remote."),
		"Unexpected error: {err}"
	);
}

#[test]
fn upstream_base_must_be_http() {
	let payload = sample_toml_with(
		"upstream",
		"api_base",
		Value::String("ftp://upstream.example.com".to_string()),
	);
	let err = load_payload(payload).expect_err("Expected api_base scheme error.");

	assert!(
		err.to_string().contains("upstream.api_base must start with http:// or https://."),
		"Unexpected error: {err}"
	);
}
