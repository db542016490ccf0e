use std::sync::Arc;

use studio_service::StudioService;
use studio_storage::db::Db;

use crate::auth::{self, IdentityProvider};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<StudioService>,
	pub identity: Arc<dyn IdentityProvider>,
}
impl AppState {
	pub async fn new(config: studio_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let identity = auth::identity_from_config(&config.security)?;
		let service = StudioService::new(config, Arc::new(db))?;

		Ok(Self::from_parts(service, identity))
	}

	pub fn from_parts(service: StudioService, identity: Arc<dyn IdentityProvider>) -> Self {
		Self { service: Arc::new(service), identity }
	}
}
