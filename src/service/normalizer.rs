//! Schema validation and repair for raw provider output
//!
//! The provider returns free text that is expected to be a single JSON
//! object but is not guaranteed to be. `normalize` is total: any input,
//! including invalid JSON and the empty string, yields an Assessment
//! with every required field populated.

use serde_json::{Map, Value};

use crate::model::{Assessment, ThreatLevel};

const DEFAULT_THREAT_LEVEL: ThreatLevel = ThreatLevel::Medium;
const DEFAULT_RISK_SCORE: u8 = 50;
const FALLBACK_RISK_SCORE: u8 = 60;
const DEFAULT_INCIDENT_TYPE: &str = "Social Engineering Analysis";
const DEFAULT_IMMEDIATE_ACTION: &str = "Review and assess";
const DEFAULT_EXPLANATION: &str = "Analysis completed";
const DEFAULT_NEXT_STEPS: &[&str] = &["Follow security protocols"];

const FALLBACK_NEXT_STEPS: &[&str] = &[
    "Report this incident to your IT security team",
    "Follow your organization's security procedures",
    "Do not interact with the suspicious content",
];

/// Normalize raw provider text into a well-formed Assessment
///
/// Parse failures are absorbed, never propagated: the raw text is
/// preserved verbatim in `explanation` of a fallback record so no
/// information is lost to the user. Fallback records carry
/// `degraded: true` to distinguish them from a genuine model-asserted
/// MEDIUM rating.
pub fn normalize(raw: &str) -> Assessment {
    match parse_object(raw) {
        Some(fields) => repair(fields),
        None => {
            tracing::warn!(
                response_length = raw.len(),
                "Provider response is not a JSON object, building fallback assessment"
            );
            fallback(raw.to_string())
        }
    }
}

/// Best-effort Assessment returned when the provider credential is
/// absent; the caller never needs to special-case a raw error shape
pub fn unconfigured_fallback() -> Assessment {
    fallback(
        "Analysis provider credential is not configured; no analysis was performed.".to_string(),
    )
}

fn parse_object(raw: &str) -> Option<Map<String, Value>> {
    let candidate = strip_code_fence(raw.trim());
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(fields)) => Some(fields),
        _ => None,
    }
}

/// Models routinely wrap the JSON object in a markdown code fence
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

/// Fill every absent or empty required field with its documented
/// default; unrecognized extended fields pass through untouched
fn repair(mut fields: Map<String, Value>) -> Assessment {
    let threat_level = match fields.remove("threatLevel") {
        Some(Value::String(label)) if !label.trim().is_empty() => ThreatLevel::from_label(&label),
        _ => DEFAULT_THREAT_LEVEL,
    };

    let risk_score = match fields.remove("riskScore") {
        Some(value) => value
            .as_i64()
            .map(|n| n.clamp(0, 100) as u8)
            .unwrap_or(DEFAULT_RISK_SCORE),
        None => DEFAULT_RISK_SCORE,
    };

    // A model-emitted degraded flag is reabsorbed into the typed field
    // so serialization never produces a duplicate key
    let degraded = fields
        .remove("degraded")
        .and_then(|v| v.as_bool())
        .filter(|&d| d)
        .map(|_| true);

    Assessment {
        threat_level,
        risk_score,
        incident_type: take_string(&mut fields, "incidentType", DEFAULT_INCIDENT_TYPE),
        immediate_action: take_string(&mut fields, "immediateAction", DEFAULT_IMMEDIATE_ACTION),
        red_flags: take_list(&mut fields, "redFlags").unwrap_or_default(),
        research_findings: take_list(&mut fields, "researchFindings").unwrap_or_default(),
        explanation: take_string(&mut fields, "explanation", DEFAULT_EXPLANATION),
        next_steps: take_list(&mut fields, "nextSteps")
            .unwrap_or_else(|| to_owned_list(DEFAULT_NEXT_STEPS)),
        degraded,
        extended: fields,
    }
}

fn fallback(raw_text: String) -> Assessment {
    Assessment {
        threat_level: DEFAULT_THREAT_LEVEL,
        risk_score: FALLBACK_RISK_SCORE,
        incident_type: DEFAULT_INCIDENT_TYPE.to_string(),
        immediate_action: DEFAULT_IMMEDIATE_ACTION.to_string(),
        red_flags: vec!["Analysis completed".to_string()],
        research_findings: vec![
            "Unable to complete research due to parsing error".to_string(),
        ],
        explanation: raw_text,
        next_steps: to_owned_list(FALLBACK_NEXT_STEPS),
        degraded: Some(true),
        extended: Map::new(),
    }
}

fn take_string(fields: &mut Map<String, Value>, key: &str, default: &str) -> String {
    match fields.remove(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => s,
        _ => default.to_string(),
    }
}

/// Returns None when the field is absent or not an array; an empty
/// array is a deliberate model answer and stays empty
fn take_list(fields: &mut Map<String, Value>, key: &str) -> Option<Vec<String>> {
    match fields.remove(key) {
        Some(Value::Array(items)) => Some(
            items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect(),
        ),
        _ => None,
    }
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn well_formed_payload_passes_through() {
        let raw = json!({
            "threatLevel": "HIGH",
            "riskScore": 95,
            "incidentType": "Phishing",
            "immediateAction": "Do not respond",
            "redFlags": ["Spoofed sender"],
            "researchFindings": ["Domain registered yesterday"],
            "explanation": "Classic credential harvest",
            "nextSteps": ["Report to IT", "Delete the message"]
        })
        .to_string();

        let assessment = normalize(&raw);
        assert_eq!(assessment.threat_level, ThreatLevel::High);
        assert_eq!(assessment.risk_score, 95);
        assert_eq!(assessment.incident_type, "Phishing");
        assert_eq!(assessment.next_steps.len(), 2);
        assert_eq!(assessment.degraded, None);
        assert!(assessment.extended.is_empty());
    }

    #[test]
    fn partial_payload_gets_documented_defaults() {
        let assessment = normalize(r#"{"threatLevel":"HIGH","riskScore":90}"#);

        assert_eq!(assessment.threat_level, ThreatLevel::High);
        assert_eq!(assessment.risk_score, 90);
        assert_eq!(assessment.red_flags, Vec::<String>::new());
        assert_eq!(assessment.research_findings, Vec::<String>::new());
        assert_eq!(assessment.immediate_action, "Review and assess");
        assert_eq!(assessment.explanation, "Analysis completed");
        assert_eq!(assessment.next_steps, vec!["Follow security protocols"]);
        assert_eq!(assessment.degraded, None);
    }

    #[test]
    fn non_json_text_becomes_fallback_with_raw_explanation() {
        let assessment = normalize("not json at all");

        assert_eq!(assessment.threat_level, ThreatLevel::Medium);
        assert_eq!(assessment.risk_score, 60);
        assert_eq!(assessment.incident_type, "Social Engineering Analysis");
        assert_eq!(assessment.explanation, "not json at all");
        assert_eq!(assessment.red_flags, vec!["Analysis completed"]);
        assert_eq!(
            assessment.research_findings,
            vec!["Unable to complete research due to parsing error"]
        );
        assert_eq!(assessment.next_steps.len(), 3);
        assert_eq!(
            assessment.next_steps[0],
            "Report this incident to your IT security team"
        );
        assert_eq!(assessment.degraded, Some(true));
    }

    #[test]
    fn empty_and_non_object_inputs_never_panic() {
        for raw in ["", "   ", "[1,2,3]", "\"just a string\"", "42", "null"] {
            let assessment = normalize(raw);
            assert_eq!(assessment.threat_level, ThreatLevel::Medium);
            assert_eq!(assessment.risk_score, 60);
            assert!(!assessment.next_steps.is_empty());
        }
    }

    #[test]
    fn code_fenced_json_is_unwrapped() {
        let raw = "```json\n{\"threatLevel\":\"LOW\",\"riskScore\":10}\n```";
        let assessment = normalize(raw);
        assert_eq!(assessment.threat_level, ThreatLevel::Low);
        assert_eq!(assessment.risk_score, 10);
        assert_eq!(assessment.degraded, None);
    }

    #[test]
    fn extended_fields_round_trip_unchanged() {
        let raw = json!({
            "threatLevel": "LOW",
            "riskScore": 20,
            "incidentType": "Spam",
            "immediateAction": "Ignore",
            "redFlags": [],
            "researchFindings": [],
            "explanation": "Bulk marketing",
            "nextSteps": ["Delete"],
            "entityExtraction": {"organizations": ["Acme"]},
            "citations": ["https://example.org/report"],
            "signalWeights": {"urgency": 0.1},
            "confidence": 0.92,
            "researchLog": ["checked sender domain"]
        })
        .to_string();

        let assessment = normalize(&raw);
        assert_eq!(
            assessment.extended["entityExtraction"]["organizations"][0],
            "Acme"
        );
        assert_eq!(assessment.extended["confidence"], json!(0.92));
        assert_eq!(assessment.extended["signalWeights"]["urgency"], json!(0.1));

        // Serialize and normalize again: extended fields survive intact
        let reserialized = serde_json::to_string(&assessment).unwrap();
        let again = normalize(&reserialized);
        assert_eq!(again, assessment);
    }

    #[test]
    fn out_of_range_scores_are_clamped() {
        assert_eq!(normalize(r#"{"riskScore": 250}"#).risk_score, 100);
        assert_eq!(normalize(r#"{"riskScore": -5}"#).risk_score, 0);
        assert_eq!(normalize(r#"{"riskScore": "high"}"#).risk_score, 50);
    }

    #[test]
    fn unrecognized_threat_level_degrades_to_unknown() {
        let assessment = normalize(r#"{"threatLevel":"CATASTROPHIC"}"#);
        assert_eq!(assessment.threat_level, ThreatLevel::Unknown);
    }

    #[test]
    fn empty_strings_are_treated_as_absent() {
        let assessment = normalize(r#"{"explanation":"","immediateAction":"  "}"#);
        assert_eq!(assessment.explanation, "Analysis completed");
        assert_eq!(assessment.immediate_action, "Review and assess");
    }
}
