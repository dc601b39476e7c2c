//! Per-session analysis pipeline
//!
//! One explicit state machine per incident session, replacing any
//! scatter of independent flags: the enumerated state tag makes
//! impossible combinations (e.g. "offering upgrade" while "analyzing")
//! unrepresentable.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::model::{AnalysisRequest, AnalysisStage, Assessment};
use crate::service::analysis::run_analysis;
use crate::service::classifier;
use crate::service::provider::{AnalysisProvider, ProviderError};
use crate::service::report::{generate_report, ReportMeta};

/// Lifecycle of one incident session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    #[default]
    Idle,
    RunningBasic,
    AwaitingUpgrade,
    RunningAdvanced,
    Complete,
    Errored,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A request is already in flight for this session
    #[error("an analysis is already in flight for this session")]
    Busy,

    /// Advanced stage requested without a completed basic assessment
    #[error("no completed basic assessment to upgrade")]
    NotUpgradable,

    /// Only an upgrade offer can be finalized
    #[error("session is not awaiting an upgrade decision")]
    NotFinalizable,

    /// The session was reset while this request was in flight; the
    /// resolved response was discarded
    #[error("analysis superseded by a session reset")]
    Superseded,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Mutable per-session record, owned exclusively by the controller
#[derive(Debug, Default)]
struct IncidentSession {
    state: PipelineState,
    incident: Option<String>,
    annotated: Option<String>,
    basic: Option<Assessment>,
    current: Option<Assessment>,
    current_stage: Option<AnalysisStage>,
    error: Option<String>,
    /// Bumped on every submit/upgrade/reset; an in-flight response is
    /// applied only if its generation still matches
    generation: u64,
}

/// Read-only view of a session for API consumers
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionSnapshot {
    pub state: PipelineState,
    /// Classifier markup of the submitted incident text
    pub annotated: Option<String>,
    /// The assessment currently shown to the user (advanced supersedes
    /// basic once it succeeds)
    pub assessment: Option<Assessment>,
    /// The basic assessment, retained for report context even after an
    /// upgrade
    pub basic_assessment: Option<Assessment>,
    pub error: Option<String>,
}

/// State machine orchestrating classifier, provider, and normalizer
/// across the basic→advanced lifecycle of one session
pub struct PipelineController {
    provider: Arc<dyn AnalysisProvider>,
    session: Mutex<IncidentSession>,
}

impl PipelineController {
    pub fn new(provider: Arc<dyn AnalysisProvider>) -> Self {
        Self {
            provider,
            session: Mutex::new(IncidentSession::default()),
        }
    }

    /// Submit incident text for basic analysis
    ///
    /// Clears prior assessments, error, and upgrade offer; rejected
    /// while a request is in flight.
    pub async fn submit(&self, incident: String) -> Result<Assessment, PipelineError> {
        let generation = {
            let mut session = self.session.lock().await;
            if session.in_flight() {
                return Err(PipelineError::Busy);
            }

            session.generation += 1;
            session.state = PipelineState::RunningBasic;
            session.annotated = Some(classifier::annotate(&incident));
            session.incident = Some(incident.clone());
            session.basic = None;
            session.current = None;
            session.current_stage = None;
            session.error = None;
            session.generation
        };

        let request = AnalysisRequest::basic(incident);
        let outcome = run_analysis(self.provider.as_ref(), &request).await;
        self.apply(generation, AnalysisStage::Basic, outcome).await
    }

    /// Request the deeper pass, carrying the retained basic assessment
    /// as prior context
    ///
    /// Valid from `AwaitingUpgrade`, and from `Errored` when a basic
    /// assessment survived a failed upgrade attempt.
    pub async fn upgrade(&self) -> Result<Assessment, PipelineError> {
        let (generation, request) = {
            let mut session = self.session.lock().await;
            if session.in_flight() {
                return Err(PipelineError::Busy);
            }

            let upgradable = matches!(
                session.state,
                PipelineState::AwaitingUpgrade | PipelineState::Errored
            );
            let (Some(incident), Some(basic)) = (session.incident.clone(), session.basic.clone())
            else {
                return Err(PipelineError::NotUpgradable);
            };
            if !upgradable {
                return Err(PipelineError::NotUpgradable);
            }

            // Entering RunningAdvanced withdraws the upgrade offer; a
            // double-submit lands in the in_flight guard above
            session.generation += 1;
            session.state = PipelineState::RunningAdvanced;
            (session.generation, AnalysisRequest::advanced(incident, basic))
        };

        let outcome = run_analysis(self.provider.as_ref(), &request).await;
        self.apply(generation, AnalysisStage::Advanced, outcome)
            .await
    }

    /// Decline the upgrade offer: `AwaitingUpgrade → Complete`
    pub async fn finalize(&self) -> Result<(), PipelineError> {
        let mut session = self.session.lock().await;
        if session.state != PipelineState::AwaitingUpgrade {
            return Err(PipelineError::NotFinalizable);
        }
        session.state = PipelineState::Complete;
        Ok(())
    }

    /// Start over: valid from every state, including mid-flight; any
    /// in-flight response resolving later is discarded
    pub async fn reset(&self) {
        let mut session = self.session.lock().await;
        session.generation += 1;
        session.state = PipelineState::Idle;
        session.incident = None;
        session.annotated = None;
        session.basic = None;
        session.current = None;
        session.current_stage = None;
        session.error = None;
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let session = self.session.lock().await;
        SessionSnapshot {
            state: session.state,
            annotated: session.annotated.clone(),
            assessment: session.current.clone(),
            basic_assessment: session.basic.clone(),
            error: session.error.clone(),
        }
    }

    /// Render the shareable report for the latest assessment
    pub async fn report(&self) -> Option<String> {
        let session = self.session.lock().await;
        let assessment = session.current.as_ref()?;
        let stage = session.current_stage.unwrap_or(AnalysisStage::Basic);
        Some(generate_report(assessment, &ReportMeta::generate(stage)))
    }

    /// Apply a resolved stage outcome, unless the session moved on
    async fn apply(
        &self,
        generation: u64,
        stage: AnalysisStage,
        outcome: Result<Assessment, ProviderError>,
    ) -> Result<Assessment, PipelineError> {
        let mut session = self.session.lock().await;
        if session.generation != generation {
            tracing::debug!(?stage, "Discarding stale analysis response after reset");
            return Err(PipelineError::Superseded);
        }

        match outcome {
            Ok(assessment) => {
                match stage {
                    AnalysisStage::Basic => {
                        session.basic = Some(assessment.clone());
                        session.state = PipelineState::AwaitingUpgrade;
                    }
                    AnalysisStage::Advanced => {
                        // Advanced supersedes basic for display; the
                        // basic record stays for report context
                        session.state = PipelineState::Complete;
                    }
                }
                session.current = Some(assessment.clone());
                session.current_stage = Some(stage);
                session.error = None;
                Ok(assessment)
            }
            Err(e) => {
                tracing::warn!(?stage, error = %e, "Analysis stage failed");
                session.error = Some(e.to_string());
                session.state = PipelineState::Errored;
                // A failed upgrade never destroys the basic result
                if stage == AnalysisStage::Advanced {
                    session.current = session.basic.clone();
                    session.current_stage =
                        session.current.as_ref().map(|_| AnalysisStage::Basic);
                }
                Err(PipelineError::Provider(e))
            }
        }
    }
}

impl IncidentSession {
    fn in_flight(&self) -> bool {
        matches!(
            self.state,
            PipelineState::RunningBasic | PipelineState::RunningAdvanced
        )
    }
}

/// Registry of independent sessions; no shared mutable state crosses
/// incidents
pub struct SessionStore {
    provider: Arc<dyn AnalysisProvider>,
    sessions: RwLock<HashMap<Uuid, Arc<PipelineController>>>,
}

impl SessionStore {
    pub fn new(provider: Arc<dyn AnalysisProvider>) -> Self {
        Self {
            provider,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        let controller = Arc::new(PipelineController::new(Arc::clone(&self.provider)));
        self.sessions.write().await.insert(id, controller);
        tracing::debug!(session = %id, "Session created");
        id
    }

    pub async fn get(&self, id: &Uuid) -> Option<Arc<PipelineController>> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &Uuid) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }
}
