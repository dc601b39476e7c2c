use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use utoipa::ToSchema;

/// Model-asserted severity of the analyzed incident
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
    Unknown,
}

impl ThreatLevel {
    /// Parse a wire label case-insensitively, degrading unrecognized
    /// values to `Unknown` rather than rejecting the payload
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "LOW" => ThreatLevel::Low,
            "MEDIUM" => ThreatLevel::Medium,
            "HIGH" => ThreatLevel::High,
            _ => ThreatLevel::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatLevel::Low => "LOW",
            ThreatLevel::Medium => "MEDIUM",
            ThreatLevel::High => "HIGH",
            ThreatLevel::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Analysis stage: first pass or context-aware refinement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStage {
    Basic,
    Advanced,
}

/// Canonical structured result of an analysis stage
///
/// Every instance leaving the normalizer has all required fields
/// populated; optional extended fields emitted by the model
/// (entityExtraction, citations, signalWeights, confidence,
/// researchLog, ...) round-trip through `extended` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub threat_level: ThreatLevel,
    /// 0-100
    pub risk_score: u8,
    pub incident_type: String,
    pub immediate_action: String,
    pub red_flags: Vec<String>,
    pub research_findings: Vec<String>,
    pub explanation: String,
    pub next_steps: Vec<String>,
    /// Set when the provider reply could not be parsed and this record
    /// was rebuilt from fallback defaults; never set on well-formed
    /// payloads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degraded: Option<bool>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extended: Map<String, Value>,
}

/// A normalized request to the analysis provider
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub incident: String,
    pub stage: AnalysisStage,
    /// Required for the advanced stage: the exact basic Assessment
    /// previously obtained for this incident
    pub prior_result: Option<Assessment>,
}

impl AnalysisRequest {
    pub fn basic(incident: String) -> Self {
        Self {
            incident,
            stage: AnalysisStage::Basic,
            prior_result: None,
        }
    }

    pub fn advanced(incident: String, prior_result: Assessment) -> Self {
        Self {
            incident,
            stage: AnalysisStage::Advanced,
            prior_result: Some(prior_result),
        }
    }
}
