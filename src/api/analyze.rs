//! Stateless analysis endpoints

use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::ApiError;
use crate::app::AppState;
use crate::model::{AnalysisRequest, AnalysisStage, Assessment};
use crate::service::analysis::run_analysis;
use crate::service::classifier::{self, RiskSpan};
use crate::service::normalizer;
use crate::service::provider::ProviderError;

/// Request body for `POST /analyze`
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// The suspicious message to assess
    pub incident: Option<String>,
    /// "basic" (default) or "advanced"
    pub analysis_type: Option<AnalysisStage>,
    /// Required for advanced: the Assessment returned by the basic stage
    pub basic_results: Option<Assessment>,
}

/// Request body for `POST /v1/classify`
#[derive(Debug, Deserialize, ToSchema)]
pub struct ClassifyRequest {
    pub text: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClassifyResponse {
    /// Input with `<mark class="risk-...">` wrappers applied
    pub annotated: String,
    pub spans: Vec<RiskSpan>,
}

/// Run one analysis stage and return the normalized Assessment
#[utoipa::path(
    post,
    path = "/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Normalized assessment", body = Assessment),
        (status = 400, description = "Missing incident data"),
        (status = 405, description = "Method not allowed"),
        (status = 500, description = "Provider credential absent; body carries a fallback assessment", body = Assessment),
        (status = 502, description = "Provider failure")
    ),
    tag = "analysis"
)]
pub async fn analyze(
    state: web::Data<AppState>,
    body: web::Json<AnalyzeRequest>,
) -> Result<HttpResponse, ApiError> {
    let incident = body
        .incident
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing incident data".to_string()))?
        .to_string();

    let request = match body.analysis_type.unwrap_or(AnalysisStage::Basic) {
        AnalysisStage::Basic => AnalysisRequest::basic(incident),
        AnalysisStage::Advanced => {
            let prior = body.basic_results.clone().ok_or_else(|| {
                ApiError::BadRequest("advanced analysis requires basicResults".to_string())
            })?;
            AnalysisRequest::advanced(incident, prior)
        }
    };

    match run_analysis(state.provider.as_ref(), &request).await {
        Ok(assessment) => Ok(HttpResponse::Ok().json(assessment)),
        Err(ProviderError::NotConfigured) => {
            tracing::error!("Analysis requested but provider credential is absent");
            Ok(HttpResponse::InternalServerError().json(normalizer::unconfigured_fallback()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Instant, advisory-only pattern highlighting
#[utoipa::path(
    post,
    path = "/v1/classify",
    request_body = ClassifyRequest,
    responses(
        (status = 200, description = "Risk-tier spans and annotated text", body = ClassifyResponse)
    ),
    tag = "analysis"
)]
pub async fn classify(body: web::Json<ClassifyRequest>) -> impl Responder {
    HttpResponse::Ok().json(ClassifyResponse {
        annotated: classifier::annotate(&body.text),
        spans: classifier::classify(&body.text),
    })
}

async fn method_not_allowed() -> impl Responder {
    HttpResponse::MethodNotAllowed().finish()
}

/// Configure analysis routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/analyze")
            .route(web::post().to(analyze))
            .default_service(web::route().to(method_not_allowed)),
    )
    .service(web::resource("/v1/classify").route(web::post().to(classify)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Config, ThreatLevel};
    use crate::service::provider::AnalysisProvider;
    use actix_web::{http::StatusCode, test, App};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct FixedProvider(&'static str);

    #[async_trait]
    impl AnalysisProvider for FixedProvider {
        async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, ProviderError> {
            Ok(self.0.to_string())
        }
    }

    fn app_state(provider: Arc<dyn AnalysisProvider>) -> web::Data<AppState> {
        web::Data::new(AppState::with_provider(Config::default(), provider, true))
    }

    #[actix_web::test]
    async fn empty_body_is_rejected_before_any_provider_call() {
        let state = app_state(Arc::new(crate::service::provider::UnconfiguredProvider));
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/analyze")
            .set_json(serde_json::json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "bad_request");
        assert!(body["message"].as_str().unwrap().contains("incident"));
    }

    #[actix_web::test]
    async fn non_post_method_is_rejected() {
        let state = app_state(Arc::new(crate::service::provider::UnconfiguredProvider));
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::get().uri("/analyze").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[actix_web::test]
    async fn basic_analysis_returns_normalized_assessment() {
        let state = app_state(Arc::new(FixedProvider(
            r#"{"threatLevel":"HIGH","riskScore":90}"#,
        )));
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/analyze")
            .set_json(serde_json::json!({
                "incident": "click http://bit.ly/xyz123 now",
                "analysisType": "basic"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let assessment: Assessment = test::read_body_json(resp).await;
        assert_eq!(assessment.threat_level, ThreatLevel::High);
        assert_eq!(assessment.risk_score, 90);
        // Partial payload was repaired, never surfaced as an error
        assert_eq!(assessment.next_steps, vec!["Follow security protocols"]);
    }

    #[actix_web::test]
    async fn advanced_without_basic_results_is_rejected() {
        let state = app_state(Arc::new(crate::service::provider::UnconfiguredProvider));
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/analyze")
            .set_json(serde_json::json!({
                "incident": "click here",
                "analysisType": "advanced"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn missing_credential_yields_500_with_fallback_body() {
        let state = app_state(Arc::new(crate::service::provider::UnconfiguredProvider));
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/analyze")
            .set_json(serde_json::json!({ "incident": "click here" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        // Body is still a well-formed Assessment, never a raw error shape
        let assessment: Assessment = test::read_body_json(resp).await;
        assert_eq!(assessment.threat_level, ThreatLevel::Medium);
        assert!(!assessment.next_steps.is_empty());
    }

    #[actix_web::test]
    async fn classify_endpoint_annotates_text() {
        let state = app_state(Arc::new(crate::service::provider::UnconfiguredProvider));
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/v1/classify")
            .set_json(serde_json::json!({ "text": "pay $500 via bitcoin" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["annotated"]
            .as_str()
            .unwrap()
            .contains("<mark class=\"risk-high\">$500</mark>"));
        assert!(!body["spans"].as_array().unwrap().is_empty());
    }
}
