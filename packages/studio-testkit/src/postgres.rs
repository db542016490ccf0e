//! Scratch Postgres databases for the ignored integration tests.

use std::{env, future::Future, str::FromStr, thread};

use sqlx::{
	ConnectOptions, Connection, Executor,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::runtime::Builder;
use uuid::Uuid;

use studio_config::Postgres;
use studio_storage::db::Db;

use crate::{Error, Result};

pub const DSN_ENV: &str = "STUDIO_PG_DSN";

const MAINTENANCE_DATABASES: [&str; 2] = ["postgres", "template1"];
const POOL_SIZE: u32 = 2;

pub fn env_dsn() -> Option<String> {
	env::var(DSN_ENV).ok().filter(|dsn| !dsn.trim().is_empty())
}

/// A uniquely named database created next to the one in the base DSN.
///
/// Call [`TestDatabase::cleanup`] to drop it. If a test panics first, `Drop` drops it on a
/// throwaway runtime instead.
pub struct TestDatabase {
	name: String,
	dsn: String,
	maintenance: PgConnectOptions,
	dropped: bool,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base = PgConnectOptions::from_str(base_dsn).map_err(|err| {
			Error::Message(format!("{DSN_ENV} is not a valid Postgres DSN: {err}."))
		})?;
		let (maintenance, mut conn) = open_maintenance(&base).await?;
		let name = format!("studio_test_{}", Uuid::new_v4().simple());

		conn.execute(format!(r#"CREATE DATABASE "{name}""#).as_str()).await?;
		conn.close().await?;

		let dsn = base.database(&name).to_url_lossy().to_string();

		Ok(Self { name, dsn, maintenance, dropped: false })
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	/// Opens a small pool on the scratch database with the schema in place.
	pub async fn connect(&self) -> Result<Db> {
		let db = Db::connect(&Postgres { dsn: self.dsn.clone(), pool_max_conns: POOL_SIZE }).await?;

		db.ensure_schema().await?;

		Ok(db)
	}

	pub async fn cleanup(mut self) -> Result<()> {
		drop_database(&self.name, &self.maintenance).await?;

		self.dropped = true;

		Ok(())
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.dropped {
			return;
		}

		let name = self.name.clone();
		let maintenance = self.maintenance.clone();
		// The caller's runtime may be shutting down, so the drop gets its own.
		let handle = thread::spawn(move || {
			let outcome = Builder::new_current_thread()
				.enable_all()
				.build()
				.map_err(|err| Error::Message(err.to_string()))
				.and_then(|runtime| runtime.block_on(drop_database(&name, &maintenance)));

			if let Err(err) = outcome {
				eprintln!("Failed to drop scratch database {name}: {err}.");
			}
		});

		let _ = handle.join();
	}
}

/// Runs `f` against a bootstrapped scratch database, then drops the database whether or not `f`
/// succeeded. A cleanup failure only surfaces when `f` itself succeeded.
pub async fn with_test_db<F, Fut, T>(base_dsn: &str, f: F) -> Result<T>
where
	F: FnOnce(Db) -> Fut,
	Fut: Future<Output = Result<T>>,
{
	let test_db = TestDatabase::new(base_dsn).await?;
	let outcome = match test_db.connect().await {
		Ok(db) => f(db).await,
		Err(err) => Err(err),
	};
	let cleaned = test_db.cleanup().await;

	match (outcome, cleaned) {
		(Ok(value), Ok(())) => Ok(value),
		(Ok(_), Err(err)) => Err(err),
		(Err(err), cleaned) => {
			if let Err(cleanup_err) = cleaned {
				eprintln!("Scratch database cleanup also failed: {cleanup_err}.");
			}

			Err(err)
		},
	}
}

async fn open_maintenance(base: &PgConnectOptions) -> Result<(PgConnectOptions, PgConnection)> {
	let mut failures = Vec::new();

	for database in MAINTENANCE_DATABASES {
		let options = base.clone().database(database);

		match PgConnection::connect_with(&options).await {
			Ok(conn) => return Ok((options, conn)),
			Err(err) => failures.push(format!("{database}: {err}")),
		}
	}

	Err(Error::Message(format!(
		"No maintenance database reachable ({}).",
		failures.join("; ")
	)))
}

async fn drop_database(name: &str, maintenance: &PgConnectOptions) -> Result<()> {
	let mut conn = PgConnection::connect_with(maintenance).await?;

	// Pools from the test may still hold connections.
	sqlx::query(
		"\
SELECT pg_terminate_backend(pid)
FROM pg_stat_activity
WHERE datname = $1 AND pid <> pg_backend_pid()",
	)
	.bind(name)
	.execute(&mut conn)
	.await?;
	conn.execute(format!(r#"DROP DATABASE IF EXISTS "{name}""#).as_str()).await?;
	conn.close().await?;

	Ok(())
}
