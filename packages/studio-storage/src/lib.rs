pub mod db;
pub mod jobs;
pub mod models;
pub mod outputs;
pub mod schema;
pub mod store;
pub mod usage;

mod error;

pub use error::Error;
pub use store::{JobFilter, OutputFilter, Store};
pub use studio_domain::BoxFuture;

pub type Result<T, E = Error> = std::result::Result<T, E>;
