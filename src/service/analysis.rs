//! Single analysis step: prompt assembly, provider call, normalization
//!
//! Shared by the stateless `/analyze` endpoint and the pipeline
//! controller. One attempt per call; retry policy lives with the caller.

use crate::model::{AnalysisRequest, Assessment};
use crate::service::normalizer::normalize;
use crate::service::prompts;
use crate::service::provider::{AnalysisProvider, ProviderError};

/// Run one analysis stage against the provider
///
/// Provider failures surface as typed errors; a successful call always
/// yields a well-formed Assessment, malformed payloads included.
pub async fn run_analysis(
    provider: &dyn AnalysisProvider,
    request: &AnalysisRequest,
) -> Result<Assessment, ProviderError> {
    let (system, prompt) = prompts::for_request(request);

    tracing::debug!(
        stage = ?request.stage,
        incident_length = request.incident.len(),
        "Dispatching analysis request"
    );

    let raw = provider.complete(system, &prompt).await?;
    Ok(normalize(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ThreatLevel;
    use async_trait::async_trait;

    struct FixedProvider(&'static str);

    #[async_trait]
    impl AnalysisProvider for FixedProvider {
        async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, ProviderError> {
            Ok(self.0.to_string())
        }
    }

    #[actix_web::test]
    async fn malformed_reply_still_yields_an_assessment() {
        let provider = FixedProvider("the model rambled instead of emitting JSON");
        let request = AnalysisRequest::basic("suspicious text".to_string());

        let assessment = run_analysis(&provider, &request).await.unwrap();
        assert_eq!(assessment.threat_level, ThreatLevel::Medium);
        assert_eq!(assessment.risk_score, 60);
        assert_eq!(
            assessment.explanation,
            "the model rambled instead of emitting JSON"
        );
    }

    #[actix_web::test]
    async fn provider_failure_is_propagated() {
        let request = AnalysisRequest::basic("suspicious text".to_string());
        let err = run_analysis(&crate::service::provider::UnconfiguredProvider, &request)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured));
    }
}
