//! Reasoning stage output and its degradation ladder.
//!
//! Three grades, each a typed provenance rather than an exception path:
//! well-formed oracle output is used as-is; unstructured text is wrapped
//! into a single low-confidence step; a failed oracle call falls back to
//! local rules over the same danger patterns the safety cascade uses, in
//! compressed form.

use serde::{Deserialize, Serialize};

use crate::model::{ReasoningStep, UrgencyLevel};
use crate::oracle::OracleReply;
use crate::patterns;

/// Which grade of the ladder produced the reasoning output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningProvenance {
    /// Structured oracle output used as-is.
    Oracle,
    /// Free-text oracle output wrapped into a single step.
    WrappedText,
    /// Oracle unavailable; local danger-pattern rules.
    LocalRules,
}

/// Output of the reasoning stage, whatever grade produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningOutcome {
    pub steps: Vec<ReasoningStep>,
    pub red_flags: Vec<String>,
    pub risk_factors: Vec<String>,
    pub preliminary_urgency: Option<UrgencyLevel>,
    pub confidence: f64,
    pub provenance: ReasoningProvenance,
}

/// Lenient deserialization target for structured oracle output.
#[derive(Debug, Deserialize)]
struct RawReasoning {
    #[serde(default)]
    reasoning_steps: Vec<RawStep>,
    #[serde(default)]
    red_flags: Vec<String>,
    #[serde(default)]
    risk_factors: Vec<String>,
    #[serde(default)]
    preliminary_urgency: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawStep {
    #[serde(default)]
    step: u32,
    #[serde(default)]
    analysis: String,
    #[serde(default)]
    findings: String,
}

impl ReasoningOutcome {
    /// Interpret an oracle reply per the ladder. A structured object without
    /// usable reasoning steps degrades to the wrapped-text grade.
    pub fn from_reply(reply: OracleReply) -> Self {
        match reply {
            OracleReply::Structured(value) => {
                match serde_json::from_value::<RawReasoning>(value.clone()) {
                    Ok(raw) if !raw.reasoning_steps.is_empty() => Self {
                        steps: raw
                            .reasoning_steps
                            .into_iter()
                            .map(|s| ReasoningStep::new(s.step, s.analysis, s.findings))
                            .collect(),
                        red_flags: raw.red_flags,
                        risk_factors: raw.risk_factors,
                        preliminary_urgency: raw
                            .preliminary_urgency
                            .as_deref()
                            .and_then(UrgencyLevel::from_label),
                        confidence: raw.confidence.unwrap_or(0.7).clamp(0.0, 1.0),
                        provenance: ReasoningProvenance::Oracle,
                    },
                    _ => Self::wrap_text(&value.to_string()),
                }
            }
            OracleReply::Text(text) => Self::wrap_text(&text),
        }
    }

    /// Wrap unstructured output into a single-step low-confidence trace.
    fn wrap_text(text: &str) -> Self {
        let excerpt: String = text.chars().take(200).collect();
        Self {
            steps: vec![ReasoningStep::new(
                1,
                "Unstructured oracle output",
                excerpt,
            )],
            red_flags: Vec::new(),
            risk_factors: Vec::new(),
            preliminary_urgency: Some(UrgencyLevel::PrimaryCare),
            confidence: 0.6,
            provenance: ReasoningProvenance::WrappedText,
        }
    }
}

/// Local reasoning when the oracle call fails outright: the safety cascade's
/// danger patterns in compressed form.
pub fn fallback_reasoning(text: &str) -> ReasoningOutcome {
    let lower = text.to_lowercase();

    let outcome = |steps: Vec<ReasoningStep>,
                   red_flags: Vec<String>,
                   urgency: UrgencyLevel,
                   confidence: f64| ReasoningOutcome {
        steps,
        red_flags,
        risk_factors: Vec::new(),
        preliminary_urgency: Some(urgency),
        confidence,
        provenance: ReasoningProvenance::LocalRules,
    };

    if patterns::has_blood_emergency(&lower) {
        return outcome(
            vec![ReasoningStep::new(
                1,
                "Blood symptom detected",
                "Blood in cough, vomit, or stool requires emergency care",
            )],
            vec!["blood symptoms".to_string()],
            UrgencyLevel::Emergency,
            0.9,
        );
    }

    let chest = patterns::has_chest_pain(&lower);
    let breathing = patterns::has_breathing_difficulty(&lower);
    if chest && breathing {
        return outcome(
            vec![ReasoningStep::new(
                1,
                "Chest pain with breathing difficulty",
                "Potential cardiac or pulmonary emergency",
            )],
            vec!["chest pain".to_string(), "breathing difficulty".to_string()],
            UrgencyLevel::Emergency,
            0.95,
        );
    }
    if chest || breathing {
        let flag = if chest {
            "chest symptoms"
        } else {
            "breathing difficulty"
        };
        return outcome(
            vec![ReasoningStep::new(
                1,
                "Cardiopulmonary symptom detected",
                "Requires emergency evaluation",
            )],
            vec![flag.to_string()],
            UrgencyLevel::Emergency,
            0.9,
        );
    }

    // Generic keyword bands. Red flags stay empty here so the ESI classifier
    // is not steered by keyword-only evidence.
    let emergency_terms = ["chest pain", "difficulty breathing", "severe", "blood"];
    let urgent_terms = ["pain", "fever", "headache"];
    let (urgency, confidence) = if emergency_terms.iter().any(|k| lower.contains(k)) {
        (UrgencyLevel::Emergency, 0.7)
    } else if urgent_terms.iter().any(|k| lower.contains(k)) {
        (UrgencyLevel::Urgent, 0.6)
    } else {
        (UrgencyLevel::PrimaryCare, 0.5)
    };

    outcome(
        vec![ReasoningStep::new(
            1,
            "Keyword-based analysis",
            format!("Classified as {urgency}"),
        )],
        Vec::new(),
        urgency,
        confidence,
    )
}
