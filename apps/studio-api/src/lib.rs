pub mod auth;
pub mod routes;
pub mod state;

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use color_eyre::eyre;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use studio_config::Config;

use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(
	version = studio_cli::VERSION,
	rename_all = "kebab",
	styles = studio_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = studio_config::load(&args.config)?;

	init_tracing(&config.service.log_level);

	let addr = listen_addr(&config)?;
	let app = routes::router(AppState::new(config).await?);
	let listener = TcpListener::bind(addr).await?;

	tracing::info!(%addr, version = studio_cli::VERSION, "Studio API is listening.");

	axum::serve(listener, app).await?;

	Ok(())
}

/// Resolves `service.http_bind`, refusing public interfaces unless the config opts out of
/// `security.bind_localhost_only`.
pub fn listen_addr(config: &Config) -> color_eyre::Result<SocketAddr> {
	let raw = config.service.http_bind.trim();
	let addr: SocketAddr = raw
		.parse()
		.map_err(|err| eyre::eyre!("service.http_bind {raw:?} is not a socket address: {err}."))?;

	if config.security.bind_localhost_only && !addr.ip().is_loopback() {
		return Err(eyre::eyre!(
			"service.http_bind {addr} is not a loopback address while security.bind_localhost_only is set."
		));
	}

	Ok(addr)
}

fn init_tracing(log_level: &str) {
	let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
	use super::*;

	fn config_with(http_bind: &str, localhost_only: bool) -> Config {
		let mut config = studio_testkit::sample_config().expect("Failed to load sample config.");

		config.service.http_bind = http_bind.to_string();
		config.security.bind_localhost_only = localhost_only;

		config
	}

	#[test]
	fn loopback_binds_are_accepted() {
		let addr = listen_addr(&config_with(" 127.0.0.1:8787 ", true)).expect("loopback is fine");

		assert_eq!(addr.port(), 8787);
		assert!(listen_addr(&config_with("[::1]:8787", true)).is_ok());
	}

	#[test]
	fn public_binds_need_an_explicit_opt_out() {
		assert!(listen_addr(&config_with("0.0.0.0:8787", true)).is_err());
		assert!(listen_addr(&config_with("0.0.0.0:8787", false)).is_ok());
	}

	#[test]
	fn unparseable_binds_are_rejected() {
		let err = listen_addr(&config_with("localhost", false)).expect_err("not an address");

		assert!(err.to_string().contains("not a socket address"));
	}
}
