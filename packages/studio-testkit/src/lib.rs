mod config;
mod error;
mod memory;
mod postgres;

pub use config::{SAMPLE_CONFIG, sample_config};
pub use error::{Error, Result};
pub use memory::{MemoryStore, StoreOp};
pub use postgres::{DSN_ENV, TestDatabase, env_dsn, with_test_db};
