//! Session lifecycle endpoints
//!
//! Server-side surface of the per-incident pipeline state machine.

use actix_web::{delete, get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::ApiError;
use crate::app::AppState;
use crate::service::normalizer;
use crate::service::{PipelineController, PipelineError, ProviderError, SessionStore};

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateSessionResponse {
    pub id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitRequest {
    /// The suspicious message to assess
    pub incident: String,
}

/// Create a new analysis session
#[utoipa::path(
    post,
    path = "/v1/sessions",
    responses(
        (status = 201, description = "Session created", body = CreateSessionResponse)
    ),
    tag = "sessions"
)]
#[post("/v1/sessions")]
pub async fn create(state: web::Data<AppState>) -> HttpResponse {
    let id = state.sessions.create().await;
    HttpResponse::Created().json(CreateSessionResponse { id })
}

/// Inspect session state, annotation, assessments, and error
#[utoipa::path(
    get,
    path = "/v1/sessions/{id}",
    params(("id" = String, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session snapshot", body = crate::service::pipeline::SessionSnapshot),
        (status = 404, description = "Session not found")
    ),
    tag = "sessions"
)]
#[get("/v1/sessions/{id}")]
pub async fn snapshot(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let controller = lookup(&state.sessions, &path).await?;
    Ok(HttpResponse::Ok().json(controller.snapshot().await))
}

/// Submit incident text for basic analysis
#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/analyze",
    params(("id" = String, Path, description = "Session ID")),
    request_body = SubmitRequest,
    responses(
        (status = 200, description = "Basic assessment", body = crate::model::Assessment),
        (status = 400, description = "Missing incident data"),
        (status = 404, description = "Session not found"),
        (status = 409, description = "An analysis is already in flight"),
        (status = 500, description = "Provider credential absent; body carries a fallback assessment"),
        (status = 502, description = "Provider failure")
    ),
    tag = "sessions"
)]
#[post("/v1/sessions/{id}/analyze")]
pub async fn analyze(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<SubmitRequest>,
) -> Result<HttpResponse, ApiError> {
    let incident = body.incident.trim();
    if incident.is_empty() {
        return Err(ApiError::BadRequest("missing incident data".to_string()));
    }

    let controller = lookup(&state.sessions, &path).await?;
    respond(controller.submit(incident.to_string()).await)
}

/// Escalate to the advanced stage, reusing the basic assessment
#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/upgrade",
    params(("id" = String, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Advanced assessment", body = crate::model::Assessment),
        (status = 404, description = "Session not found"),
        (status = 409, description = "No completed basic assessment, or a request is in flight"),
        (status = 502, description = "Provider failure; the basic assessment is preserved")
    ),
    tag = "sessions"
)]
#[post("/v1/sessions/{id}/upgrade")]
pub async fn upgrade(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let controller = lookup(&state.sessions, &path).await?;
    respond(controller.upgrade().await)
}

/// Decline the upgrade offer and complete the session
#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/finalize",
    params(("id" = String, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session completed"),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Session is not awaiting an upgrade decision")
    ),
    tag = "sessions"
)]
#[post("/v1/sessions/{id}/finalize")]
pub async fn finalize(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let controller = lookup(&state.sessions, &path).await?;
    controller.finalize().await?;
    Ok(HttpResponse::Ok().json(controller.snapshot().await))
}

/// Start a new analysis: clears all retained state, valid from every
/// state including mid-flight
#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/reset",
    params(("id" = String, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session reset to idle"),
        (status = 404, description = "Session not found")
    ),
    tag = "sessions"
)]
#[post("/v1/sessions/{id}/reset")]
pub async fn reset(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let controller = lookup(&state.sessions, &path).await?;
    controller.reset().await;
    Ok(HttpResponse::Ok().json(controller.snapshot().await))
}

/// Destroy the session
#[utoipa::path(
    delete,
    path = "/v1/sessions/{id}",
    params(("id" = String, Path, description = "Session ID")),
    responses(
        (status = 204, description = "Session destroyed"),
        (status = 404, description = "Session not found")
    ),
    tag = "sessions"
)]
#[delete("/v1/sessions/{id}")]
pub async fn destroy(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    if state.sessions.remove(&id).await {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(ApiError::SessionNotFound(id.to_string()))
    }
}

/// Render the shareable text report for the latest assessment
#[utoipa::path(
    get,
    path = "/v1/sessions/{id}/report",
    params(("id" = String, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Plain-text incident report"),
        (status = 404, description = "Session not found"),
        (status = 409, description = "No assessment available yet")
    ),
    tag = "sessions"
)]
#[get("/v1/sessions/{id}/report")]
pub async fn report(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let controller = lookup(&state.sessions, &path).await?;
    match controller.report().await {
        Some(text) => Ok(HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body(text)),
        None => Err(ApiError::Conflict(
            "no assessment available for this session yet".to_string(),
        )),
    }
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::SessionNotFound(raw.to_string()))
}

async fn lookup(
    sessions: &SessionStore,
    raw_id: &str,
) -> Result<std::sync::Arc<PipelineController>, ApiError> {
    let id = parse_id(raw_id)?;
    sessions
        .get(&id)
        .await
        .ok_or_else(|| ApiError::SessionNotFound(id.to_string()))
}

/// Map a stage outcome to the shared response contract: missing
/// credential still produces a well-formed fallback body
fn respond(
    outcome: Result<crate::model::Assessment, PipelineError>,
) -> Result<HttpResponse, ApiError> {
    match outcome {
        Ok(assessment) => Ok(HttpResponse::Ok().json(assessment)),
        Err(PipelineError::Provider(ProviderError::NotConfigured)) => {
            tracing::error!("Analysis requested but provider credential is absent");
            Ok(HttpResponse::InternalServerError().json(normalizer::unconfigured_fallback()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Configure session routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create)
        .service(snapshot)
        .service(analyze)
        .service(upgrade)
        .service(finalize)
        .service(reset)
        .service(destroy)
        .service(report);
}
