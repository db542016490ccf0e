pub mod control;
pub mod generate;
pub mod jobs;
pub mod quota;
pub mod research;
pub mod timestamp;

mod error;
mod params;

pub use control::{JobControl, JobControlResponse};
pub use error::{Error, Result};
pub use generate::{
	GenerateRequest, GenerateResponse, ListOutputsRequest, ListOutputsResponse, OutputRecord,
};
pub use jobs::{JobRecord, ListJobsRequest, ListJobsResponse};
pub use quota::{QuotaDecision, QuotaLedger, UsageRecord, UsageSummary};
pub use research::{ResearchRequest, ResearchResponse};
pub use studio_domain::BoxFuture;

use std::sync::Arc;

use studio_config::Config;
use studio_domain::GenerationOutputType;
use studio_providers::upstream::{GenerationPayload, ResearchPayload, UpstreamClient};
use studio_storage::Store;

/// The research/generation provider as seen by the pipeline.
///
/// `Ok(None)` means the provider is not configured. Errors are absorbed by the caller and turned
/// into fallback content.
pub trait UpstreamProvider
where
	Self: Send + Sync,
{
	fn research<'a>(
		&'a self,
		query: &'a str,
	) -> BoxFuture<'a, studio_providers::Result<Option<ResearchPayload>>>;

	fn generate<'a>(
		&'a self,
		prompt: &'a str,
		output_type: GenerationOutputType,
	) -> BoxFuture<'a, studio_providers::Result<Option<GenerationPayload>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub upstream: Arc<dyn UpstreamProvider>,
}

pub struct StudioService {
	pub cfg: Config,
	pub store: Arc<dyn Store>,
	pub providers: Providers,
	pub quota: QuotaLedger,
}

impl UpstreamProvider for UpstreamClient {
	fn research<'a>(
		&'a self,
		query: &'a str,
	) -> BoxFuture<'a, studio_providers::Result<Option<ResearchPayload>>> {
		Box::pin(UpstreamClient::research(self, query))
	}

	fn generate<'a>(
		&'a self,
		prompt: &'a str,
		output_type: GenerationOutputType,
	) -> BoxFuture<'a, studio_providers::Result<Option<GenerationPayload>>> {
		Box::pin(UpstreamClient::generate(self, prompt, output_type.as_str()))
	}
}

impl Providers {
	pub fn new(upstream: Arc<dyn UpstreamProvider>) -> Self {
		Self { upstream }
	}

	pub fn from_config(cfg: &studio_config::Upstream) -> Result<Self> {
		Ok(Self::new(Arc::new(UpstreamClient::from_config(cfg)?)))
	}
}

impl StudioService {
	pub fn new(cfg: Config, store: Arc<dyn Store>) -> Result<Self> {
		let providers = Providers::from_config(&cfg.upstream)?;

		Ok(Self::with_providers(cfg, store, providers))
	}

	pub fn with_providers(cfg: Config, store: Arc<dyn Store>, providers: Providers) -> Self {
		let quota = QuotaLedger::new(cfg.quota.clone(), store.clone());

		Self { cfg, store, providers, quota }
	}
}
