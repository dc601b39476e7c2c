//! Prompts for staged incident analysis

use crate::model::{AnalysisRequest, AnalysisStage, Assessment};

/// System prompt for the basic (first pass) stage
pub const BASIC_SYSTEM_PROMPT: &str = r#"You are a social engineering analyst triaging a suspicious message.

You must:
- Assess the message exactly as provided, without inventing context
- Identify manipulation techniques, pressure tactics, and payload delivery
- Be conservative when the message offers insufficient signal

Respond with a single JSON object and nothing else, using these fields:
threatLevel ("LOW" | "MEDIUM" | "HIGH" | "UNKNOWN"), riskScore (integer 0-100),
incidentType (string), immediateAction (string), redFlags (array of strings),
researchFindings (array of strings), explanation (string), nextSteps (array of strings)."#;

/// System prompt for the advanced (investigation) stage
pub const ADVANCED_SYSTEM_PROMPT: &str = r#"You are a social engineering analyst performing a deep investigation.

A first-pass assessment of this incident is provided. Do not redo its
extraction work: refine it. Verify the identified red flags, research the
mentioned entities and infrastructure, and adjust threatLevel and riskScore
only where the deeper pass justifies it.

Respond with a single JSON object and nothing else, using these fields:
threatLevel ("LOW" | "MEDIUM" | "HIGH" | "UNKNOWN"), riskScore (integer 0-100),
incidentType (string), immediateAction (string), redFlags (array of strings),
researchFindings (array of strings), explanation (string), nextSteps (array of strings).
You may additionally include entityExtraction, citations, signalWeights,
confidence, and researchLog fields."#;

/// Select the system prompt and build the instruction text for a request
pub fn for_request(request: &AnalysisRequest) -> (&'static str, String) {
    match request.stage {
        AnalysisStage::Basic => (BASIC_SYSTEM_PROMPT, build_basic_prompt(&request.incident)),
        AnalysisStage::Advanced => {
            // The controller guarantees a prior result for this stage
            let prior = request.prior_result.as_ref();
            (
                ADVANCED_SYSTEM_PROMPT,
                build_advanced_prompt(&request.incident, prior),
            )
        }
    }
}

fn build_basic_prompt(incident: &str) -> String {
    format!(
        r#"Analyze this suspicious message for social engineering indicators.

Message:
---
{incident}
---

Return the structured assessment."#
    )
}

fn build_advanced_prompt(incident: &str, prior: Option<&Assessment>) -> String {
    let prior_json = prior
        .and_then(|a| serde_json::to_string_pretty(a).ok())
        .unwrap_or_else(|| "{}".to_string());

    format!(
        r#"Perform an advanced investigation of this suspicious message.

Message:
---
{incident}
---

First-pass assessment:
---
{prior_json}
---

Refine the assessment with deeper research and return the structured result."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ThreatLevel;
    use serde_json::Map;

    fn basic_assessment() -> Assessment {
        Assessment {
            threat_level: ThreatLevel::High,
            risk_score: 90,
            incident_type: "Phishing".to_string(),
            immediate_action: "Do not click".to_string(),
            red_flags: vec!["Shortened URL".to_string()],
            research_findings: vec![],
            explanation: "Credential harvest".to_string(),
            next_steps: vec!["Report to IT".to_string()],
            degraded: None,
            extended: Map::new(),
        }
    }

    #[test]
    fn basic_prompt_embeds_the_incident() {
        let request = AnalysisRequest::basic("click http://bad.example".to_string());
        let (system, prompt) = for_request(&request);
        assert_eq!(system, BASIC_SYSTEM_PROMPT);
        assert!(prompt.contains("click http://bad.example"));
    }

    #[test]
    fn advanced_prompt_carries_the_prior_assessment() {
        let request =
            AnalysisRequest::advanced("click http://bad.example".to_string(), basic_assessment());
        let (system, prompt) = for_request(&request);
        assert_eq!(system, ADVANCED_SYSTEM_PROMPT);
        assert!(prompt.contains("click http://bad.example"));
        assert!(prompt.contains("\"riskScore\": 90"));
        assert!(prompt.contains("\"threatLevel\": \"HIGH\""));
    }
}
