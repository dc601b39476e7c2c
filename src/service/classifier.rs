//! Heuristic pattern classifier for instant, advisory-only highlighting
//!
//! Pure and synchronous; runs on every input change with no network
//! access. Output never feeds riskScore or threatLevel.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use utoipa::ToSchema;

/// Classifier-assigned bucket for a highlighted span
///
/// Declaration order is match precedence: `High` wins over `Medium`,
/// and so on. `Low` covers suspicious-context lures (alternate-channel
/// solicitation, too-good-to-be-true offers); `Context` covers
/// recognized brand and financial-institution mentions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    High,
    Medium,
    Low,
    Context,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::High => "high",
            RiskTier::Medium => "medium",
            RiskTier::Low => "low",
            RiskTier::Context => "context",
        }
    }
}

/// A matched region of the incident text; byte offsets into the input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RiskSpan {
    pub start: usize,
    pub end: usize,
    pub tier: RiskTier,
}

// High risk: raw URLs, bare domains, phone-shaped sequences, currency
// amounts, cryptocurrency/payment terms
static HIGH_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r#"(?i)https?://[^\s<>"']+"#,
        r#"(?i)\b[a-z0-9][a-z0-9-]*(?:\.[a-z0-9][a-z0-9-]*)*\.(?:com|net|org|info|biz|io|co|ly|ru|cn|tk|xyz|top|click|link)\b(?:/[^\s<>"']*)?"#,
        r"\+?\d{1,3}[-.\s]?\(?\d{2,4}\)?[-.\s]?\d{3,4}[-.\s]?\d{3,4}\b",
        r"[$€£₹]\s?\d[\d,]*(?:\.\d+)?",
        r"(?i)\b(?:bitcoin|btc|ethereum|crypto(?:currency)?|usdt|gift\s?cards?|wire\s?transfer|western\s?union|moneygram)\b",
    ])
});

// Medium risk: urgency/pressure, verification requests, call-to-action verbs
static MEDIUM_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\b(?:urgent(?:ly)?|immediately|right\s+now|act\s+now|asap|within\s+\d+\s+(?:minutes?|hours?|days?)|expires?\s+(?:today|soon)|final\s+(?:notice|warning)|last\s+(?:chance|warning)|suspend(?:ed)?|terminat(?:ed?|ion)|deactivat(?:ed?|ion)|locked)\b",
        r"(?i)\b(?:verify|confirm|validate|authenticate|re-?activate)\b",
        r"(?i)\b(?:click|tap|download|install|open)\b",
    ])
});

// Suspicious context: alternate-channel solicitation, too-good-to-be-true offers
static LOW_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\b(?:whatsapp|telegram|signal|wechat|encrypted\s+(?:chat|app))\b",
        r"(?i)\b(?:congratulations|you(?:'ve|\s+have)\s+(?:won|been\s+selected)|winner|lottery|prize|jackpot|inheritance|guaranteed\s+(?:income|returns?)|work\s+from\s+home|easy\s+money|risk-?free|job\s+offer)\b",
    ])
});

// Named entities: commonly impersonated brands and financial institutions
static CONTEXT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\b(?:paypal|amazon|apple|microsoft|google|netflix|facebook|instagram|irs|social\s+security|fedex|ups|dhl|usps|bank\s+of\s+america|wells\s+fargo|chase|citibank|hsbc|coinbase|binance|venmo|zelle|cash\s?app)\b",
    ])
});

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("invalid classifier pattern"))
        .collect()
}

fn tiers() -> [(RiskTier, &'static [Regex]); 4] {
    [
        (RiskTier::High, HIGH_PATTERNS.as_slice()),
        (RiskTier::Medium, MEDIUM_PATTERNS.as_slice()),
        (RiskTier::Low, LOW_PATTERNS.as_slice()),
        (RiskTier::Context, CONTEXT_PATTERNS.as_slice()),
    ]
}

/// Collect non-overlapping risk spans from the incident text
///
/// Tiers are applied in precedence order; a candidate match that
/// overlaps an already-accepted span of an earlier tier (or an earlier
/// pattern within the same tier) is dropped, so a "verify" inside an
/// accepted URL never double-annotates. Returned spans are sorted by
/// start offset.
pub fn classify(text: &str) -> Vec<RiskSpan> {
    let mut spans: Vec<RiskSpan> = Vec::new();

    for (tier, patterns) in tiers() {
        for pattern in patterns {
            for m in pattern.find_iter(text) {
                let overlaps = spans
                    .iter()
                    .any(|s| m.start() < s.end && s.start < m.end());
                if !overlaps {
                    spans.push(RiskSpan {
                        start: m.start(),
                        end: m.end(),
                        tier,
                    });
                }
            }
        }
    }

    spans.sort_by_key(|s| s.start);
    spans
}

/// Render the incident text with `<mark>` wrappers around each span
///
/// Characters outside annotations are preserved exactly; text with no
/// matches is returned unchanged.
pub fn annotate(text: &str) -> String {
    let spans = classify(text);
    if spans.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + spans.len() * 32);
    let mut cursor = 0;

    for span in &spans {
        out.push_str(&text[cursor..span.start]);
        out.push_str("<mark class=\"risk-");
        out.push_str(span.tier.as_str());
        out.push_str("\">");
        out.push_str(&text[span.start..span.end]);
        out.push_str("</mark>");
        cursor = span.end;
    }
    out.push_str(&text[cursor..]);

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans_of(text: &str, tier: RiskTier) -> Vec<&str> {
        classify(text)
            .into_iter()
            .filter(|s| s.tier == tier)
            .map(|s| &text[s.start..s.end])
            .collect()
    }

    #[test]
    fn clean_text_is_returned_unchanged() {
        let text = "Hi team, the meeting notes from yesterday are attached below.";
        assert!(classify(text).is_empty());
        assert_eq!(annotate(text), text);
    }

    #[test]
    fn empty_input_yields_no_spans() {
        assert!(classify("").is_empty());
        assert_eq!(annotate(""), "");
    }

    #[test]
    fn matched_substrings_are_preserved_verbatim() {
        let text = "Pay $500 via bitcoin immediately";
        let annotated = annotate(text);
        for span in classify(text) {
            assert!(annotated.contains(&text[span.start..span.end]));
        }
        // Stripping the markup recovers the original text
        let stripped = annotated
            .replace("</mark>", "")
            .replace("<mark class=\"risk-high\">", "")
            .replace("<mark class=\"risk-medium\">", "")
            .replace("<mark class=\"risk-low\">", "")
            .replace("<mark class=\"risk-context\">", "");
        assert_eq!(stripped, text);
    }

    #[test]
    fn suspension_scenario_hits_expected_tiers() {
        let text = "Your account will be suspended, click http://bit.ly/xyz123 \
                    within 24 hours and pay $500 via bitcoin";

        let high = spans_of(text, RiskTier::High);
        assert!(high.contains(&"http://bit.ly/xyz123"));
        assert!(high.contains(&"$500"));
        assert!(high.contains(&"bitcoin"));

        let medium = spans_of(text, RiskTier::Medium);
        assert!(medium.contains(&"suspended"));
        assert!(medium.contains(&"click"));
        assert!(medium.contains(&"within 24 hours"));
    }

    #[test]
    fn earlier_tier_wins_on_overlap() {
        // "verify" appears both bare and inside the URL; the URL span
        // (high) must absorb the embedded occurrence
        let text = "Please verify at https://verify-account.example.com/login";
        let spans = classify(text);

        let high: Vec<_> = spans.iter().filter(|s| s.tier == RiskTier::High).collect();
        assert_eq!(high.len(), 1);
        assert_eq!(
            &text[high[0].start..high[0].end],
            "https://verify-account.example.com/login"
        );

        let medium: Vec<_> = spans
            .iter()
            .filter(|s| s.tier == RiskTier::Medium)
            .collect();
        assert_eq!(medium.len(), 1);
        assert_eq!(&text[medium[0].start..medium[0].end], "verify");
    }

    #[test]
    fn suspicious_context_and_entities_are_tiered() {
        let text = "Congratulations, contact us on WhatsApp about your PayPal prize";
        assert_eq!(
            spans_of(text, RiskTier::Low),
            vec!["Congratulations", "WhatsApp", "prize"]
        );
        assert_eq!(spans_of(text, RiskTier::Context), vec!["PayPal"]);
    }

    #[test]
    fn spans_are_sorted_and_disjoint() {
        let text = "urgent: wire transfer $2,000 to acct, confirm at secure-bank.com now";
        let spans = classify(text);
        for pair in spans.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn phone_numbers_are_high_risk() {
        let text = "Call +1 (800) 555-0199 to keep your account active";
        let high = spans_of(text, RiskTier::High);
        assert_eq!(high.len(), 1);
        assert!(high[0].contains("800"));
    }
}
