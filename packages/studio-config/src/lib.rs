mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Confidence, Config, Jobs, Postgres, Quota, QuotaLimit, RemoteAuth, Security, SecurityAuthKey,
	Service, Storage, Upstream, UpstreamRetry,
};

use std::{collections::HashSet, fs, path::Path};

pub const AUTH_MODE_STATIC_KEYS: &str = "static_keys";
pub const AUTH_MODE_REMOTE: &str = "remote";

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::invalid("service.http_bind", "must be non-empty."));
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::invalid("storage.postgres.dsn", "must be non-empty."));
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::invalid("storage.postgres.pool_max_conns", "must be greater than zero."));
	}

	validate_upstream(&cfg.upstream)?;
	validate_quota(&cfg.quota)?;
	validate_confidence(&cfg.confidence)?;

	if cfg.jobs.max_list_limit == 0 {
		return Err(Error::invalid("jobs.max_list_limit", "must be greater than zero."));
	}
	if cfg.jobs.default_list_limit == 0 || cfg.jobs.default_list_limit > cfg.jobs.max_list_limit
	{
		return Err(Error::invalid(
			"jobs.default_list_limit",
			"must be between 1 and jobs.max_list_limit.",
		));
	}

	validate_security(&cfg.security)
}

fn validate_upstream(upstream: &Upstream) -> Result<()> {
	if let Some(api_base) = upstream.api_base.as_deref()
		&& !(api_base.starts_with("http://") || api_base.starts_with("https://"))
	{
		return Err(Error::invalid("upstream.api_base", "must start with http:// or https://."));
	}

	for (label, path) in [
		("upstream.research_path", &upstream.research_path),
		("upstream.generate_path", &upstream.generate_path),
	] {
		if !path.starts_with('/') {
			return Err(Error::invalid(label, "must start with '/'."));
		}
	}

	if upstream.timeout_ms == 0 {
		return Err(Error::invalid("upstream.timeout_ms", "must be greater than zero."));
	}
	if upstream.retry.max_attempts == 0 {
		return Err(Error::invalid("upstream.retry.max_attempts", "must be greater than zero."));
	}
	if upstream.retry.max_attempts > 10 {
		return Err(Error::invalid("upstream.retry.max_attempts", "must be 10 or less."));
	}

	for (key, value) in &upstream.default_headers {
		if !value.is_string() {
			return Err(Error::invalid(
				format!("upstream.default_headers.{key}"),
				"must be a string.",
			));
		}
	}

	Ok(())
}

fn validate_quota(quota: &Quota) -> Result<()> {
	if quota.window_hours == 0 {
		return Err(Error::invalid("quota.window_hours", "must be greater than zero."));
	}

	for (label, limit) in [("quota.research", &quota.research), ("quota.generate", &quota.generate)]
	{
		if limit.daily_limit == 0 {
			return Err(Error::invalid(
				format!("{label}.daily_limit"),
				"must be greater than zero.",
			));
		}
		if !limit.cost_units.is_finite() || limit.cost_units < 0.0 {
			return Err(Error::invalid(
				format!("{label}.cost_units"),
				"must be a finite number, zero or greater.",
			));
		}
	}

	Ok(())
}

fn validate_confidence(confidence: &Confidence) -> Result<()> {
	if !confidence.floor.is_finite() || !(0.0..=1.0).contains(&confidence.floor) {
		return Err(Error::invalid("confidence.floor", "must be in the range 0.0-1.0."));
	}

	for (label, value) in [
		("confidence.research_default", confidence.research_default),
		("confidence.generate_default", confidence.generate_default),
	] {
		if !value.is_finite() || value < confidence.floor || value > 1.0 {
			return Err(Error::invalid(label, "must be between confidence.floor and 1.0."));
		}
	}

	Ok(())
}

fn validate_security(security: &Security) -> Result<()> {
	match security.auth_mode.as_str() {
		AUTH_MODE_STATIC_KEYS => {
			if security.auth_keys.is_empty() {
				return Err(Error::invalid(
					"security.auth_keys",
					"must be non-empty when security.auth_mode is static_keys.",
				));
			}

			let mut seen = HashSet::new();

			for key in &security.auth_keys {
				if key.token.trim().is_empty() || key.user_id.trim().is_empty() {
					return Err(Error::invalid(
						"security.auth_keys",
						"entries must have a non-empty token and user_id.",
					));
				}
				if !seen.insert(key.token.as_str()) {
					return Err(Error::invalid("security.auth_keys", "tokens must be unique."));
				}
			}
		},
		AUTH_MODE_REMOTE => {
			let Some(remote) = security.remote.as_ref() else {
				return Err(Error::invalid(
					"security.remote",
					"is required when security.auth_mode is remote.",
				));
			};

			if remote.api_base.trim().is_empty() {
				return Err(Error::invalid("security.remote.api_base", "must be non-empty."));
			}
			if !remote.path.starts_with('/') {
				return Err(Error::invalid("security.remote.path", "must start with '/'."));
			}
			if remote.timeout_ms == 0 {
				return Err(Error::invalid(
					"security.remote.timeout_ms",
					"must be greater than zero.",
				));
			}
		},
		_ => {
			return Err(Error::invalid(
				"security.auth_mode",
				"must be one of static_keys or remote.",
			));
		},
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.upstream.api_base = non_blank(cfg.upstream.api_base.take())
		.map(|base| base.trim().trim_end_matches('/').to_string());
	cfg.upstream.api_key = non_blank(cfg.upstream.api_key.take());
	cfg.security.auth_mode = cfg.security.auth_mode.trim().to_string();

	if let Some(remote) = cfg.security.remote.as_mut() {
		remote.api_base = remote.api_base.trim().trim_end_matches('/').to_string();
		remote.api_key = non_blank(remote.api_key.take());
	}
}

fn non_blank(value: Option<String>) -> Option<String> {
	value.filter(|raw| !raw.trim().is_empty())
}
