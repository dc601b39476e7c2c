//! Application state and service initialization
//!
//! Centralizes provider construction and the session registry so
//! handlers share one dependency graph.

use std::sync::Arc;

use crate::model::Config;
use crate::service::{AnalysisProvider, OpenAiProvider, SessionStore, UnconfiguredProvider};

/// Application state shared by all handlers
pub struct AppState {
    pub config: Config,
    /// Outbound analysis provider; a stand-in when no credential is set
    pub provider: Arc<dyn AnalysisProvider>,
    pub provider_configured: bool,
    /// Per-incident pipeline sessions
    pub sessions: SessionStore,
}

impl AppState {
    /// Build application state from configuration
    ///
    /// A missing provider credential is not a startup abort: requests
    /// are answered with fallback assessments until one is supplied.
    pub fn new(config: Config) -> Self {
        match OpenAiProvider::from_env(&config.provider) {
            Some(provider) => {
                tracing::info!(
                    model = %config.provider.model,
                    base_url = %config.provider.base_url,
                    "Analysis provider initialized"
                );
                Self::with_provider(config, Arc::new(provider), true)
            }
            None => {
                tracing::warn!(
                    "Provider credential not found ({}), analysis requests will return fallback assessments",
                    crate::service::provider::ENV_OPENAI_API_KEY
                );
                Self::with_provider(config, Arc::new(UnconfiguredProvider), false)
            }
        }
    }

    /// Assemble state around an explicit provider
    pub fn with_provider(
        config: Config,
        provider: Arc<dyn AnalysisProvider>,
        provider_configured: bool,
    ) -> Self {
        let sessions = SessionStore::new(Arc::clone(&provider));
        Self {
            config,
            provider,
            provider_configured,
            sessions,
        }
    }
}
