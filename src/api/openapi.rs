//! OpenAPI specification endpoints

use actix_web::{get, HttpResponse, Responder};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::analyze::analyze,
        crate::api::analyze::classify,
        crate::api::session::create,
        crate::api::session::snapshot,
        crate::api::session::analyze,
        crate::api::session::upgrade,
        crate::api::session::finalize,
        crate::api::session::reset,
        crate::api::session::destroy,
        crate::api::session::report,
        crate::api::health::liveness,
        crate::api::health::readiness,
    ),
    components(schemas(
        crate::model::Assessment,
        crate::model::ThreatLevel,
        crate::model::AnalysisStage,
        crate::api::analyze::AnalyzeRequest,
        crate::api::analyze::ClassifyRequest,
        crate::api::analyze::ClassifyResponse,
        crate::api::session::CreateSessionResponse,
        crate::api::session::SubmitRequest,
        crate::service::pipeline::SessionSnapshot,
        crate::service::pipeline::PipelineState,
        crate::service::classifier::RiskSpan,
        crate::service::classifier::RiskTier,
        crate::api::health::HealthStatus,
        crate::api::health::ReadinessStatus,
    )),
    tags(
        (name = "analysis", description = "Stateless analysis and classification"),
        (name = "sessions", description = "Per-incident pipeline sessions"),
        (name = "health", description = "Probes")
    )
)]
pub struct ApiDoc;

/// Serve OpenAPI JSON specification
#[get("/openapi.json")]
pub async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

/// Serve OpenAPI YAML specification
#[get("/openapi.yaml")]
pub async fn openapi_yaml() -> impl Responder {
    match ApiDoc::openapi().to_yaml() {
        Ok(yaml) => HttpResponse::Ok().content_type("text/yaml").body(yaml),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render OpenAPI YAML");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Configure OpenAPI routes
pub fn configure(cfg: &mut actix_web::web::ServiceConfig) {
    cfg.service(openapi_json).service(openapi_yaml);
}
