pub mod confidence;
pub mod fallback;
pub mod job;
pub mod kinds;
pub mod source;
pub mod text;

pub use job::{JobStatus, ParseStatusError};
pub use kinds::{GenerationOutputType, OperationKind, ResearchOutputType, UnknownVariant};
pub use source::Source;

use std::{future::Future, pin::Pin};

/// The boxed future returned by every object-safe async seam in the workspace.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
