pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{0}")]
	Message(String),
	#[error("Postgres error: {0}")]
	Sqlx(#[from] sqlx::Error),
	#[error("Storage error: {0}")]
	Storage(#[from] studio_storage::Error),
}
