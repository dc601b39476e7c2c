pub mod analysis;
pub mod classifier;
pub mod normalizer;
pub mod pipeline;
pub mod prompts;
pub mod provider;
pub mod report;

pub use pipeline::{PipelineController, PipelineError, SessionStore};
pub use provider::{AnalysisProvider, OpenAiProvider, ProviderError, UnconfiguredProvider};
