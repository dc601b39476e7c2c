//! Shareable text report rendering
//!
//! Pure formatting: no network or storage dependency, reproducible for
//! identical inputs plus a fixed timestamp/id.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::model::{AnalysisStage, Assessment};

const RULE: &str = "============================================================";

/// Report identity and stage context, generated by the caller
#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub timestamp: DateTime<Utc>,
    pub incident_id: String,
    pub stage: AnalysisStage,
}

impl ReportMeta {
    /// Derive an id from the current time, truncated to eight digits
    pub fn generate(stage: AnalysisStage) -> Self {
        let now = Utc::now();
        Self {
            timestamp: now,
            incident_id: format!("SE-{:08}", now.timestamp_millis() % 100_000_000),
            stage,
        }
    }
}

/// Render a completed Assessment into a deterministic text report
///
/// Every populated field is included; empty optional sections are
/// omitted.
pub fn generate_report(assessment: &Assessment, meta: &ReportMeta) -> String {
    let label = match meta.stage {
        AnalysisStage::Basic => "BASIC ANALYSIS (EDUCATIONAL)",
        AnalysisStage::Advanced => "ADVANCED ANALYSIS (INVESTIGATION)",
    };

    let mut out = String::new();
    out.push_str(RULE);
    out.push_str("\n        SOCIAL ENGINEERING INCIDENT REPORT\n");
    out.push_str(RULE);
    out.push('\n');

    out.push_str(&format!("Report ID:      {}\n", meta.incident_id));
    out.push_str(&format!(
        "Generated:      {}\n",
        meta.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
    ));
    out.push_str(&format!("Report type:    {label}\n\n"));

    out.push_str(&format!("THREAT LEVEL:   {}\n", assessment.threat_level));
    out.push_str(&format!("RISK SCORE:     {}/100\n", assessment.risk_score));
    out.push_str(&format!("INCIDENT TYPE:  {}\n", assessment.incident_type));
    if assessment.degraded.unwrap_or(false) {
        out.push_str("NOTE:           Assessment rebuilt from an unparsed provider reply\n");
    }

    out.push_str("\nIMMEDIATE ACTION\n");
    out.push_str(&format!("  {}\n", assessment.immediate_action));

    push_bullets(&mut out, "RED FLAGS", &assessment.red_flags);
    push_bullets(&mut out, "RESEARCH FINDINGS", &assessment.research_findings);

    out.push_str("\nEXPLANATION\n");
    out.push_str(&format!("  {}\n", assessment.explanation));

    if !assessment.next_steps.is_empty() {
        out.push_str("\nNEXT STEPS\n");
        for (i, step) in assessment.next_steps.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, step));
        }
    }

    if let Some(confidence) = assessment.extended.get("confidence").and_then(Value::as_f64) {
        out.push_str(&format!("\nCONFIDENCE:     {confidence:.2}\n"));
    }

    if let Some(citations) = assessment.extended.get("citations").and_then(Value::as_array) {
        let rendered: Vec<&str> = citations.iter().filter_map(Value::as_str).collect();
        if !rendered.is_empty() {
            out.push_str("\nCITATIONS\n");
            for citation in rendered {
                out.push_str(&format!("  - {citation}\n"));
            }
        }
    }

    out.push_str(RULE);
    out.push('\n');
    out
}

fn push_bullets(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push_str(&format!("\n{title}\n"));
    for item in items {
        out.push_str(&format!("  - {item}\n"));
    }
}
